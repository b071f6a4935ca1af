//! Manual dispatch of a workflow notification.

use clap::Args;

use wavemill_notify::Event;

#[derive(Debug, Args)]
pub struct NotifyArgs {
    /// Event to announce (e.g. agent_installed, replication_done)
    #[arg(long)]
    pub event: Event,

    /// Replication project the event refers to
    #[arg(long)]
    pub project: String,

    /// Message overriding the event's default one
    #[arg(long)]
    pub message: Option<String>,
}

pub async fn run(args: NotifyArgs) -> anyhow::Result<()> {
    let notifier = super::notifier()?;

    let summary = match &args.message {
        Some(message) => notifier.notify(args.event, message).await,
        None => notifier.notify_default(args.event, &args.project).await,
    };

    if summary.dispatched == 0 {
        println!("No channels are enabled; nothing was sent.");
    } else {
        println!(
            "Dispatched to {} channel(s), {} failed.",
            summary.dispatched, summary.failed
        );
    }

    if summary.failed > 0 {
        anyhow::bail!("{} notification delivery(ies) failed", summary.failed);
    }
    Ok(())
}
