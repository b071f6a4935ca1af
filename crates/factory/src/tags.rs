//! Tag import: push intake-form tags onto server records.

use wavemill_common::error::AppError;
use wavemill_common::intake::{TagRow, validate_tag_rows};

use crate::client::FactoryClient;

/// Validate `rows` against the live server list, then write the tag set of
/// each row onto its server record. Fails fast on the first rejected row or
/// failed update.
pub async fn import_tags(client: &FactoryClient, rows: &[TagRow]) -> Result<usize, AppError> {
    let servers = client.list_servers().await?;
    let known_names: Vec<String> = servers.iter().map(|s| s.server_name.clone()).collect();

    validate_tag_rows(rows, &known_names)?;

    let mut updated = 0usize;
    for row in rows {
        let server = servers
            .iter()
            .find(|s| s.server_name.eq_ignore_ascii_case(&row.server_name))
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "Server '{}' disappeared between validation and upload",
                    row.server_name
                ))
            })?;

        client
            .update_server(
                &server.server_id,
                &serde_json::json!({ "tags": row.tags }),
            )
            .await?;

        tracing::info!(server = %row.server_name, tags = row.tags.len(), "Tags updated");
        updated += 1;
    }

    Ok(updated)
}
