//! Create or remove a local admin user on a wave's Windows servers.

use clap::Args;

use wavemill_common::env::{EnvFetcher, LOCAL_USER_PASSWORD_VARS};
use wavemill_remote::powershell::PowerShell;

#[derive(Debug, Args)]
pub struct UserMgmtArgs {
    /// Wave whose Windows servers get the user change
    #[arg(long)]
    pub wave_id: String,

    /// Local user name to create (or remove)
    #[arg(long)]
    pub user: String,

    /// Remove the user instead of creating it
    #[arg(long)]
    pub remove: bool,
}

pub async fn run(args: UserMgmtArgs) -> anyhow::Result<()> {
    let factory = super::factory_client()?;
    let projects = factory.servers_for_wave(&args.wave_id).await?;

    if projects.iter().all(|p| p.windows.is_empty()) {
        println!("Wave '{}' has no Windows servers; nothing to do.", args.wave_id);
        return Ok(());
    }

    let password = if args.remove {
        None
    } else {
        Some(EnvFetcher::fetch_sensitive(
            LOCAL_USER_PASSWORD_VARS,
            "Password for the new local user",
        )?)
    };
    let powershell = PowerShell::new(super::windows_credential()?);

    let mut changed = 0usize;
    for project in &projects {
        for server in &project.windows {
            let hostname = server
                .server_fqdn
                .as_deref()
                .unwrap_or(&server.server_name);

            let result = match &password {
                Some(password) => {
                    powershell
                        .add_local_user(hostname, &args.user, password)
                        .await
                }
                None => powershell.remove_local_user(hostname, &args.user).await,
            };

            match result {
                Ok(()) => changed += 1,
                Err(e) => {
                    tracing::error!(server = %hostname, error = %e, "Local user change failed");
                }
            }
        }
    }

    let verb = if args.remove { "removed from" } else { "created on" };
    println!("User '{}' {verb} {changed} server(s).", args.user);
    Ok(())
}
