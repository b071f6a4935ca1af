use std::path::PathBuf;

use clap::Args;

use wavemill_common::intake::read_tag_rows;
use wavemill_factory::tags::import_tags;

#[derive(Debug, Args)]
pub struct ImportTagsArgs {
    /// Tag intake CSV: a mandatory 'name' column, one tag per extra column
    #[arg(long, env = "WM_TAGS_FILE")]
    pub file: PathBuf,
}

pub async fn run(args: ImportTagsArgs) -> anyhow::Result<()> {
    let rows = read_tag_rows(&args.file)?;
    tracing::info!(file = %args.file.display(), rows = rows.len(), "Parsed tag intake form");

    let client = super::factory_client()?;
    let updated = import_tags(&client, &rows).await?;

    println!("Tags updated for {updated} server(s).");
    Ok(())
}
