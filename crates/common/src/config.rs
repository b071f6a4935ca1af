//! YAML configuration loading.
//!
//! Three files drive the toolkit:
//! - endpoints config: URLs of the migration-tracking service APIs
//! - defaults config: per-environment default values for wave intake
//! - toolkit config: everything else, notably the `notifications` section

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::env::{
    CONFIG_FILE_VARS, DEFAULTS_CONFIG_FILE_VARS, ENDPOINT_CONFIG_FILE_VARS, EnvFetcher,
};
use crate::error::AppError;
use crate::types::is_path_safe;

/// Default location of the endpoints config file.
pub const DEFAULT_ENDPOINTS_FILE: &str = "/etc/wavemill/endpoints.yml";
/// Default location of the wave-defaults config file.
pub const DEFAULT_DEFAULTS_FILE: &str = "/etc/wavemill/defaults.yml";
/// Default location of the toolkit config file.
pub const DEFAULT_CONFIG_FILE: &str = "/etc/wavemill/config.yml";

/// URLs of the migration-tracking service APIs.
#[derive(Debug, Clone, Deserialize)]
pub struct EndpointsConfig {
    pub login_api_url: String,
    pub user_api_url: String,
    #[serde(default)]
    pub admin_api_url: Option<String>,
    #[serde(default)]
    pub tools_api_url: Option<String>,
}

impl EndpointsConfig {
    /// Load from the path in `WM_ENDPOINT_CONFIG_FILE`, falling back to the
    /// system default location.
    pub fn load_default() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        let path = EnvFetcher::fetch(
            ENDPOINT_CONFIG_FILE_VARS,
            "Endpoints config file",
            Some(DEFAULT_ENDPOINTS_FILE),
        )?;
        Self::load(Path::new(&path))
    }

    pub fn load(path: &Path) -> Result<Self, AppError> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&raw)?;
        tracing::debug!(path = %path.display(), "Loaded endpoints config");
        Ok(config)
    }
}

/// Per-environment default values for wave intake, keyed by free-form name.
///
/// Missing keys resolve to the empty string, matching how intake templates
/// treat unset defaults.
#[derive(Debug, Clone, Default)]
pub struct WaveDefaults {
    values: BTreeMap<String, String>,
}

impl WaveDefaults {
    /// Get a default value, or `""` when absent.
    pub fn get(&self, key: &str) -> &str {
        match self.values.get(key) {
            Some(value) => value,
            None => {
                tracing::debug!(key, "Default value not found, returning empty string");
                ""
            }
        }
    }

    pub fn contains_non_empty(&self, key: &str) -> bool {
        self.values.get(key).is_some_and(|v| !v.is_empty())
    }
}

/// Loader for the wave-defaults file: one top-level mapping per environment.
#[derive(Debug, Clone)]
pub struct DefaultsConfig {
    defaults: WaveDefaults,
    available_environments: Vec<String>,
}

impl DefaultsConfig {
    /// Load the defaults for `environment` from the path in
    /// `WM_DEFAULTS_CONFIG_FILE` (or the system default location).
    pub fn load_default(environment: &str) -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        let path = EnvFetcher::fetch(
            DEFAULTS_CONFIG_FILE_VARS,
            "Defaults config file",
            Some(DEFAULT_DEFAULTS_FILE),
        )?;
        Self::load(Path::new(&path), environment)
    }

    pub fn load(path: &Path, environment: &str) -> Result<Self, AppError> {
        let raw = std::fs::read_to_string(path)?;
        let all: BTreeMap<String, BTreeMap<String, serde_yaml::Value>> =
            serde_yaml::from_str(&raw)?;

        let selected = all.get(environment).ok_or_else(|| {
            AppError::Config(format!(
                "Environment '{}' does not exist in '{}'",
                environment,
                path.display()
            ))
        })?;

        let values = selected
            .iter()
            .map(|(k, v)| (k.clone(), yaml_scalar_to_string(v)))
            .collect();

        // Environment names end up in paths and filenames downstream.
        let available_environments: Vec<String> = all
            .keys()
            .inspect(|name| {
                is_path_safe(name);
            })
            .cloned()
            .collect();

        tracing::debug!(environment, ?available_environments, "Loaded wave defaults");

        Ok(Self {
            defaults: WaveDefaults { values },
            available_environments,
        })
    }

    pub fn defaults(&self) -> &WaveDefaults {
        &self.defaults
    }

    pub fn available_environments(&self) -> &[String] {
        &self.available_environments
    }
}

fn yaml_scalar_to_string(value: &serde_yaml::Value) -> String {
    match value {
        serde_yaml::Value::String(s) => s.clone(),
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Null => String::new(),
        other => serde_yaml::to_string(other).unwrap_or_default().trim_end().to_string(),
    }
}

/// Top-level toolkit configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Notification dispatcher configuration. Missing means notifications
    /// are disabled entirely.
    #[serde(default)]
    pub notifications: Option<NotificationsConfig>,
}

impl AppConfig {
    /// Load from the path in `WM_CONFIG_FILE`, falling back to the system
    /// default location. A missing file yields the default (empty) config so
    /// commands still run without notifications configured.
    pub fn load_default() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        let path = EnvFetcher::fetch(
            CONFIG_FILE_VARS,
            "Toolkit config file",
            Some(DEFAULT_CONFIG_FILE),
        )?;

        let path = Path::new(&path);
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No toolkit config file, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn load(path: &Path) -> Result<Self, AppError> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&raw)?;
        tracing::debug!(path = %path.display(), "Loaded toolkit config");
        Ok(config)
    }
}

/// Configuration of the notification dispatcher.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationsConfig {
    /// Names of the channels to dispatch to. Configured-but-not-enabled
    /// channels stay silent.
    #[serde(default)]
    pub enabled: Vec<String>,

    #[serde(default)]
    pub webhook: Option<WebhookChannelConfig>,

    #[serde(default)]
    pub email: Option<EmailChannelConfig>,
}

/// Chat webhook channel configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookChannelConfig {
    pub webhook_urls: Vec<String>,
    #[serde(default)]
    pub event_whitelist: Vec<String>,
    #[serde(default)]
    pub event_blacklist: Vec<String>,
}

/// SMTP email channel configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailChannelConfig {
    pub smtp_host: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    #[serde(default)]
    pub smtp_username: Option<String>,
    #[serde(default)]
    pub smtp_password: Option<String>,
    pub from: String,
    pub recipients: Vec<String>,
    #[serde(default)]
    pub event_whitelist: Vec<String>,
    #[serde(default)]
    pub event_blacklist: Vec<String>,
}

fn default_smtp_port() -> u16 {
    587
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_endpoints_config_loads() {
        let file = write_temp(
            "login_api_url: https://login.example.com\n\
             user_api_url: https://user.example.com\n",
        );
        let config = EndpointsConfig::load(file.path()).unwrap();
        assert_eq!(config.login_api_url, "https://login.example.com");
        assert!(config.admin_api_url.is_none());
    }

    #[test]
    fn test_defaults_config_selects_environment() {
        let file = write_temp(
            "prod:\n  aws_region: eu-west-1\n  instance_count: 3\n\
             staging:\n  aws_region: us-east-1\n",
        );
        let config = DefaultsConfig::load(file.path(), "prod").unwrap();
        assert_eq!(config.defaults().get("aws_region"), "eu-west-1");
        assert_eq!(config.defaults().get("instance_count"), "3");
        assert_eq!(config.defaults().get("missing"), "");
        assert!(config.defaults().contains_non_empty("aws_region"));
        assert!(!config.defaults().contains_non_empty("missing"));
        assert_eq!(config.available_environments(), &["prod", "staging"]);
    }

    #[test]
    fn test_defaults_config_unknown_environment_fails() {
        let file = write_temp("prod:\n  aws_region: eu-west-1\n");
        let err = DefaultsConfig::load(file.path(), "qa").unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_app_config_notifications_section() {
        let file = write_temp(
            "notifications:\n\
            \x20 enabled: [webhook, \"null\"]\n\
            \x20 webhook:\n\
            \x20   webhook_urls: [\"https://chat.example.com/hook\"]\n\
            \x20   event_blacklist: [replication_done]\n",
        );
        let config = AppConfig::load(file.path()).unwrap();
        let notifications = config.notifications.unwrap();
        assert_eq!(notifications.enabled, vec!["webhook", "null"]);
        let webhook = notifications.webhook.unwrap();
        assert_eq!(webhook.webhook_urls.len(), 1);
        assert_eq!(webhook.event_blacklist, vec!["replication_done"]);
        assert!(notifications.email.is_none());
    }

    #[test]
    fn test_app_config_without_notifications() {
        let file = write_temp("{}\n");
        let config = AppConfig::load(file.path()).unwrap();
        assert!(config.notifications.is_none());
    }
}
