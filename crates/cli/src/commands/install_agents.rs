//! Agent installation across a wave.
//!
//! Resolves the wave's servers grouped by replication project, installs the
//! replication agent on each (SSH for Linux, PowerShell remoting for
//! Windows), then verifies against the machines the replication service
//! reports and writes a migration status per server.

use std::time::Duration;

use clap::Args;

use wavemill_common::types::{
    STATUS_AGENT_INSTALL_FAILED, STATUS_AGENT_INSTALL_SUCCESS, Server,
};
use wavemill_notify::Event;
use wavemill_remote::powershell::PowerShell;
use wavemill_remote::ssh::SshSession;
use wavemill_replication::agents::check_agents;
use wavemill_replication::session::{CONSOLE_HOST, ReplicationSession};
use wavemill_replication::{Machine, ReplicationClient};

#[derive(Debug, Args)]
pub struct InstallAgentsArgs {
    /// Wave whose servers get the agent
    #[arg(long)]
    pub wave_id: String,

    /// Replication console host serving the agent installers
    #[arg(long, env = "WM_REPLICATION_HOST", default_value = CONSOLE_HOST)]
    pub replication_host: String,

    /// Seconds to wait before verifying the install results
    #[arg(long, default_value_t = 5)]
    pub verify_delay: u64,
}

pub async fn run(args: InstallAgentsArgs) -> anyhow::Result<()> {
    let factory = super::factory_client()?;
    let notifier = super::notifier()?;
    let mut replication =
        ReplicationClient::new(ReplicationSession::from_env(&args.replication_host)?);

    let projects = factory.servers_for_wave(&args.wave_id).await?;

    for project in &projects {
        println!("Replication project '{}':", project.project_name);
        for server in project.windows.iter().chain(&project.linux) {
            println!("    {}", server.server_fqdn.as_deref().unwrap_or(&server.server_name));
        }
    }

    let linux_credentials = if projects.iter().any(|p| !p.linux.is_empty()) {
        Some(super::linux_credentials()?)
    } else {
        None
    };
    let windows_credential = if projects.iter().any(|p| !p.windows.is_empty()) {
        super::windows_credential()?
    } else {
        None
    };
    let powershell = PowerShell::new(windows_credential);

    for project in &projects {
        let remote_project = replication.project_by_name(&project.project_name).await?;
        let install_token = replication.install_token(&remote_project.id).await?;

        if let Some((user, auth)) = linux_credentials.as_ref() {
            for server in &project.linux {
                if let Err(e) =
                    install_linux_agent(server, user, auth, &args.replication_host, &install_token)
                        .await
                {
                    tracing::error!(server = %server.server_name, error = %e, "Linux agent install failed");
                }
            }
        }

        for server in &project.windows {
            if let Err(e) = install_windows_agent(
                &powershell,
                server,
                &args.replication_host,
                &install_token,
            )
            .await
            {
                tracing::error!(server = %server.server_name, error = %e, "Windows agent install failed");
            }
        }

        tracing::info!(
            delay_secs = args.verify_delay,
            "Waiting before verifying install results"
        );
        tokio::time::sleep(Duration::from_secs(args.verify_delay)).await;

        let machines = replication.machines(&remote_project.id).await?;
        verify_and_report(&factory, project.windows.iter().chain(&project.linux), &machines)
            .await?;

        notifier
            .notify_default(Event::AgentInstalled, &project.project_name)
            .await;
    }

    Ok(())
}

async fn install_linux_agent(
    server: &Server,
    user: &str,
    auth: &wavemill_remote::ssh::SshAuth,
    replication_host: &str,
    install_token: &str,
) -> anyhow::Result<()> {
    let hostname = server
        .server_fqdn
        .clone()
        .unwrap_or_else(|| server.server_name.clone());

    let session = SshSession::connect_async(hostname.clone(), 22, user.to_string(), auth.clone())
        .await?;
    let installer_url = format!("{replication_host}/installer_linux.py");
    let command = format!(
        "curl -sfo ./installer_linux.py '{installer_url}' && \
         sudo python3 ./installer_linux.py -t {install_token} --no-prompt"
    );

    tokio::task::spawn_blocking(move || session.exec(&command))
        .await
        .map_err(|e| anyhow::anyhow!("install task panicked: {e}"))??;

    tracing::info!(server = %hostname, "Linux agent installed");
    Ok(())
}

async fn install_windows_agent(
    powershell: &PowerShell,
    server: &Server,
    replication_host: &str,
    install_token: &str,
) -> anyhow::Result<()> {
    let hostname = server
        .server_fqdn
        .as_deref()
        .unwrap_or(&server.server_name);

    let script = format!(
        "Invoke-WebRequest -Uri '{replication_host}/installer_win.exe' -OutFile $env:TEMP\\installer_win.exe; \
         Start-Process -Wait -FilePath $env:TEMP\\installer_win.exe -ArgumentList '-t {install_token} --no-prompt'"
    );
    powershell.invoke(hostname, &script).await?;

    tracing::info!(server = %hostname, "Windows agent installed");
    Ok(())
}

async fn verify_and_report(
    factory: &wavemill_factory::FactoryClient,
    servers: impl Iterator<Item = &Server>,
    machines: &[Machine],
) -> anyhow::Result<()> {
    let servers: Vec<Server> = servers.cloned().collect();
    let check = check_agents(&servers, machines);

    if !check.installed.is_empty() {
        println!("Agent installed successfully on:");
        for server in &check.installed {
            println!("    {}", server.server_fqdn.as_deref().unwrap_or(&server.server_name));
            factory
                .set_migration_status(&server.server_id, STATUS_AGENT_INSTALL_SUCCESS)
                .await?;
        }
    }

    if !check.missing.is_empty() {
        println!("Agent install FAILED on:");
        for server in &check.missing {
            println!("    {}", server.server_fqdn.as_deref().unwrap_or(&server.server_name));
            factory
                .set_migration_status(&server.server_id, STATUS_AGENT_INSTALL_FAILED)
                .await?;
        }
    }

    Ok(())
}
