//! Shut every source server of a wave down ahead of cutover.

use clap::Args;

use wavemill_remote::powershell::PowerShell;
use wavemill_remote::ssh::SshSession;

#[derive(Debug, Args)]
pub struct ShutdownArgs {
    /// Wave whose source servers get shut down
    #[arg(long)]
    pub wave_id: String,
}

pub async fn run(args: ShutdownArgs) -> anyhow::Result<()> {
    let factory = super::factory_client()?;
    let projects = factory.servers_for_wave(&args.wave_id).await?;

    let linux_credentials = if projects.iter().any(|p| !p.linux.is_empty()) {
        Some(super::linux_credentials()?)
    } else {
        None
    };
    let powershell = PowerShell::new(if projects.iter().any(|p| !p.windows.is_empty()) {
        super::windows_credential()?
    } else {
        None
    });

    for project in &projects {
        for server in &project.windows {
            let hostname = server
                .server_fqdn
                .as_deref()
                .unwrap_or(&server.server_name);
            println!("Shutting down {hostname}...");
            match powershell.shutdown(hostname).await {
                Ok(()) => println!("Shutdown successful on {hostname}."),
                Err(e) => tracing::error!(server = %hostname, error = %e, "Shutdown failed"),
            }
        }

        let Some((user, auth)) = linux_credentials.as_ref() else {
            continue;
        };
        for server in &project.linux {
            let hostname = server
                .server_fqdn
                .clone()
                .unwrap_or_else(|| server.server_name.clone());
            println!("Shutting down {hostname}...");

            let result = async {
                let session = SshSession::connect_async(
                    hostname.clone(),
                    22,
                    user.clone(),
                    auth.clone(),
                )
                .await?;
                tokio::task::spawn_blocking(move || session.exec("sudo shutdown now"))
                    .await
                    .map_err(|e| {
                        wavemill_common::error::AppError::Remote(format!(
                            "shutdown task panicked: {e}"
                        ))
                    })?
            }
            .await;

            match result {
                Ok(_) => println!("Shutdown successful on {hostname}."),
                // The connection usually drops mid-command; that is expected.
                Err(e) => tracing::warn!(server = %hostname, error = %e, "Shutdown reported an error"),
            }
        }
    }

    Ok(())
}
