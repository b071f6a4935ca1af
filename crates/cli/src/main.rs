//! `wavemill` — batch operations for the server-migration workflow.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod aws;
mod commands;

#[derive(Debug, Parser)]
#[command(name = "wavemill", version, about = "Server-migration operations toolkit")]
struct Cli {
    /// Increase log verbosity (-v info+debug for wavemill, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Toolkit config file, overriding WM_CONFIG_FILE
    #[arg(long, global = true)]
    config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Import server tags from an intake CSV into the tracking service
    ImportTags(commands::import_tags::ImportTagsArgs),
    /// Install replication agents on every server of a wave
    InstallAgents(commands::install_agents::InstallAgentsArgs),
    /// Copy post-launch scripts to every server of a wave
    CopyFiles(commands::copy_files::CopyFilesArgs),
    /// Resolve launched target instance IPs for a wave and write them as CSV
    InstanceIps(commands::instance_ips::InstanceIpsArgs),
    /// Terminate the launched test-target instances of a wave
    TerminateTestInstances(commands::terminate_test_instances::TerminateTestInstancesArgs),
    /// Create or remove a local admin user on a wave's Windows servers
    UserMgmt(commands::user_mgmt::UserMgmtArgs),
    /// Shut every source server of a wave down
    Shutdown(commands::shutdown::ShutdownArgs),
    /// Dispatch a workflow notification through the configured channels
    Notify(commands::notify::NotifyArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    if let Some(config) = &cli.config {
        // SAFETY: nothing else reads or writes the environment yet.
        unsafe {
            std::env::set_var("WM_CONFIG_FILE", config);
        }
    }

    let default_filter = match cli.verbose {
        0 => "info",
        1 => "debug,hyper=info,rustls=info",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()),
        )
        .init();

    match cli.command {
        Command::ImportTags(args) => commands::import_tags::run(args).await,
        Command::InstallAgents(args) => commands::install_agents::run(args).await,
        Command::CopyFiles(args) => commands::copy_files::run(args).await,
        Command::InstanceIps(args) => commands::instance_ips::run(args).await,
        Command::TerminateTestInstances(args) => {
            commands::terminate_test_instances::run(args).await
        }
        Command::UserMgmt(args) => commands::user_mgmt::run(args).await,
        Command::Shutdown(args) => commands::shutdown::run(args).await,
        Command::Notify(args) => commands::notify::run(args).await,
    }
}
