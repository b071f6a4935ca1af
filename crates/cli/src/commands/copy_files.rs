//! Copy post-launch scripts to every server of a wave.

use std::path::{Path, PathBuf};

use clap::Args;

use wavemill_notify::Event;
use wavemill_remote::powershell::PowerShell;
use wavemill_remote::ssh::SshSession;

/// Where post-launch scripts land on Linux targets.
const LINUX_DESTINATION: &str = "/tmp/post-launch";
/// Where post-launch scripts land on Windows targets.
const WINDOWS_DESTINATION: &str = "C:\\Temp\\post-launch";

#[derive(Debug, Args)]
pub struct CopyFilesArgs {
    /// Wave whose servers receive the files
    #[arg(long)]
    pub wave_id: String,

    /// Local directory holding the post-launch scripts
    #[arg(long, default_value = "post-launch")]
    pub source: PathBuf,
}

pub async fn run(args: CopyFilesArgs) -> anyhow::Result<()> {
    let files = local_files(&args.source)?;
    if files.is_empty() {
        anyhow::bail!("No files found under '{}'", args.source.display());
    }

    let factory = super::factory_client()?;
    let notifier = super::notifier()?;
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
        if let Some((user, auth)) = linux_credentials.as_ref() {
            for server in &project.linux {
                let hostname = server
                    .server_fqdn
                    .clone()
                    .unwrap_or_else(|| server.server_name.clone());

                let session =
                    SshSession::connect_async(hostname.clone(), 22, user.clone(), auth.clone())
                        .await?;
                let files = files.clone();
                tokio::task::spawn_blocking(
                    move || -> Result<(), wavemill_common::error::AppError> {
                        session.exec(&format!("mkdir -p {LINUX_DESTINATION}"))?;
                        for file in &files {
                            let remote = Path::new(LINUX_DESTINATION)
                                .join(file.file_name().unwrap_or_default());
                            session.upload(file, &remote)?;
                        }
                        Ok(())
                    },
                )
                .await
                .map_err(|e| anyhow::anyhow!("copy task panicked: {e}"))??;

                tracing::info!(server = %hostname, "Post-launch scripts copied");
            }
        }

        for server in &project.windows {
            let hostname = server
                .server_fqdn
                .as_deref()
                .unwrap_or(&server.server_name);
            powershell
                .copy_directory(
                    hostname,
                    &args.source.display().to_string(),
                    WINDOWS_DESTINATION,
                )
                .await?;
        }

        notifier
            .notify_default(Event::PostLaunchScriptsUpdated, &project.project_name)
            .await;
    }

    Ok(())
}

fn local_files(source: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(source)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}
