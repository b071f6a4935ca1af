//! Intake form parsing.
//!
//! The intake form is a CSV consumed as the source of truth for batch
//! operations. The tag variant has a mandatory `name` column (the server
//! name); every other column becomes one tag on that server.

use std::io::Read;
use std::path::Path;

use crate::error::AppError;
use crate::types::Tag;

/// One parsed row of the tag intake form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRow {
    pub server_name: String,
    pub tags: Vec<Tag>,
}

/// Parse the tag intake CSV from a file.
pub fn read_tag_rows(path: &Path) -> Result<Vec<TagRow>, AppError> {
    let file = std::fs::File::open(path)?;
    parse_tag_rows(file)
}

/// Parse the tag intake CSV from any reader.
pub fn parse_tag_rows<R: Read>(reader: R) -> Result<Vec<TagRow>, AppError> {
    let mut csv_reader = csv::Reader::from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let name_index = headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case("name"))
        .ok_or_else(|| AppError::Validation("The 'name' column is mandatory".to_string()))?;

    let mut rows = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        let server_name = record
            .get(name_index)
            .unwrap_or_default()
            .trim()
            .to_string();

        let mut tags = Vec::new();
        for (index, header) in headers.iter().enumerate() {
            if index == name_index {
                continue;
            }
            tags.push(Tag {
                key: header.to_string(),
                value: record.get(index).unwrap_or_default().trim().to_string(),
            });
        }

        rows.push(TagRow { server_name, tags });
    }

    Ok(rows)
}

/// Validate parsed tag rows before upload.
///
/// Rules, matching the historical intake checks:
/// - no empty server name or tag value anywhere
/// - no duplicate server names (case-insensitive)
/// - every server must already exist in the tracking service
pub fn validate_tag_rows(rows: &[TagRow], known_server_names: &[String]) -> Result<(), AppError> {
    let mut seen: Vec<String> = Vec::new();

    for row in rows {
        if row.server_name.is_empty() {
            return Err(AppError::Validation(
                "A row has an empty server name".to_string(),
            ));
        }

        for tag in &row.tags {
            if tag.value.is_empty() {
                return Err(AppError::Validation(format!(
                    "Tag '{}' is empty for server '{}'",
                    tag.key, row.server_name
                )));
            }
        }

        let lowered = row.server_name.to_lowercase();
        if seen.contains(&lowered) {
            return Err(AppError::Validation(format!(
                "Duplicated server name: {}",
                row.server_name
            )));
        }
        seen.push(lowered);
    }

    for row in rows {
        let exists = known_server_names
            .iter()
            .any(|name| name.eq_ignore_ascii_case(&row.server_name));
        if !exists {
            return Err(AppError::Validation(format!(
                "Server '{}' doesn't exist in the tracking service",
                row.server_name
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "Name,Environment,Owner\nweb01,prod,team-a\ndb01,prod,team-b\n";

    fn known() -> Vec<String> {
        vec!["WEB01".to_string(), "db01".to_string()]
    }

    #[test]
    fn test_parse_tag_rows() {
        let rows = parse_tag_rows(CSV.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].server_name, "web01");
        assert_eq!(
            rows[0].tags,
            vec![
                Tag {
                    key: "Environment".to_string(),
                    value: "prod".to_string()
                },
                Tag {
                    key: "Owner".to_string(),
                    value: "team-a".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_missing_name_column_is_rejected() {
        let err = parse_tag_rows("Hostname,Owner\nweb01,team-a\n".as_bytes()).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_validate_accepts_good_rows() {
        let rows = parse_tag_rows(CSV.as_bytes()).unwrap();
        validate_tag_rows(&rows, &known()).unwrap();
    }

    #[test]
    fn test_validate_rejects_empty_tag_value() {
        let rows = parse_tag_rows("Name,Owner\nweb01, \n".as_bytes()).unwrap();
        let err = validate_tag_rows(&rows, &known()).unwrap_err();
        assert!(err.to_string().contains("Owner"));
    }

    #[test]
    fn test_validate_rejects_duplicates_case_insensitively() {
        let rows = parse_tag_rows("Name,Owner\nweb01,a\nWEB01,b\n".as_bytes()).unwrap();
        let err = validate_tag_rows(&rows, &known()).unwrap_err();
        assert!(err.to_string().contains("Duplicated"));
    }

    #[test]
    fn test_validate_rejects_unknown_server() {
        let rows = parse_tag_rows("Name,Owner\nghost01,a\n".as_bytes()).unwrap();
        let err = validate_tag_rows(&rows, &known()).unwrap_err();
        assert!(err.to_string().contains("ghost01"));
    }
}
