use thiserror::Error;

/// Common error types used across the toolkit.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Remote execution error: {0}")]
    Remote(String),

    #[error("Notification error: {0}")]
    Notify(String),

    #[error("Unexpected status {status} from {verb} {url}: {body}")]
    UnexpectedStatus {
        verb: &'static str,
        url: String,
        status: u16,
        body: String,
    },
}
