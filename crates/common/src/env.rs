//! Environment variable fetching with interactive fallback.
//!
//! Credentials and endpoints can come from several historically accepted
//! variable names. The fetcher walks the list in order, then falls back to a
//! default, then prompts the operator (hidden input for sensitive values).

use dialoguer::{Input, Password};

use crate::error::AppError;

/// Accepted names for the tracking-service username.
pub const FACTORY_USERNAME_VARS: &[&str] = &["WM_USERNAME", "WM_FACTORY_USERNAME"];
/// Accepted names for the tracking-service password.
pub const FACTORY_PASSWORD_VARS: &[&str] = &["WM_PASSWORD", "WM_FACTORY_PASSWORD"];
/// Accepted names for the replication-service API token.
pub const REPLICATION_TOKEN_VARS: &[&str] = &[
    "WM_REPLICATION_TOKEN",
    "WM_REPLICATION_API_TOKEN",
    "CE_API_TOKEN",
];
/// Accepted names for the endpoints config file path.
pub const ENDPOINT_CONFIG_FILE_VARS: &[&str] = &["WM_ENDPOINT_CONFIG_FILE"];
/// Accepted names for the wave-defaults config file path.
pub const DEFAULTS_CONFIG_FILE_VARS: &[&str] = &["WM_DEFAULTS_CONFIG_FILE"];
/// Accepted names for the toolkit config file path.
pub const CONFIG_FILE_VARS: &[&str] = &["WM_CONFIG_FILE"];
/// Accepted names for the Windows remoting user name.
pub const WINDOWS_USERNAME_VARS: &[&str] = &["WM_WINDOWS_USERNAME"];
/// Accepted names for the Windows remoting user password.
pub const WINDOWS_PASSWORD_VARS: &[&str] = &["WM_WINDOWS_PASSWORD"];
/// Accepted names for the Linux SSH user name.
pub const LINUX_USERNAME_VARS: &[&str] = &["WM_LINUX_USERNAME"];
/// Accepted names for the Linux SSH password.
pub const LINUX_PASSWORD_VARS: &[&str] = &["WM_LINUX_PASSWORD"];
/// Accepted names for the Linux SSH key passphrase.
pub const LINUX_KEY_PASSPHRASE_VARS: &[&str] = &["WM_LINUX_KEY_PASSPHRASE"];
/// Accepted names for the password of a managed local user.
pub const LOCAL_USER_PASSWORD_VARS: &[&str] = &["WM_LOCAL_USER_PASSWORD"];

/// Fetcher for environment variables with interactive fallback.
pub struct EnvFetcher;

impl EnvFetcher {
    /// Fetch the first set variable among `names`, falling back to `default`
    /// when provided, and finally prompting the operator.
    pub fn fetch(
        names: &[&str],
        description: &str,
        default: Option<&str>,
    ) -> Result<String, AppError> {
        Self::fetch_inner(names, description, default, false)
    }

    /// Like [`EnvFetcher::fetch`] but prompts with hidden input. Never logs
    /// the fetched value.
    pub fn fetch_sensitive(names: &[&str], description: &str) -> Result<String, AppError> {
        Self::fetch_inner(names, description, None, true)
    }

    fn fetch_inner(
        names: &[&str],
        description: &str,
        default: Option<&str>,
        sensitive: bool,
    ) -> Result<String, AppError> {
        for name in names {
            tracing::debug!(var = name, "Trying environment variable");
            if let Ok(value) = std::env::var(name) {
                return Ok(value);
            }
        }

        if let Some(default) = default {
            return Ok(default.to_string());
        }

        if sensitive {
            Password::new()
                .with_prompt(description)
                .allow_empty_password(true)
                .interact()
                .map_err(|e| {
                    AppError::Config(format!("'{description}' is not set and cannot prompt: {e}"))
                })
        } else {
            Input::new()
                .with_prompt(description)
                .interact_text()
                .map_err(|e| {
                    AppError::Config(format!("'{description}' is not set and cannot prompt: {e}"))
                })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_first_set_variable_wins() {
        // SAFETY: test-local variable names, no other test touches them.
        unsafe {
            std::env::set_var("WM_TEST_FETCH_SECOND", "second");
        }
        let value = EnvFetcher::fetch(
            &["WM_TEST_FETCH_FIRST", "WM_TEST_FETCH_SECOND"],
            "test value",
            None,
        )
        .unwrap();
        assert_eq!(value, "second");
        unsafe {
            std::env::remove_var("WM_TEST_FETCH_SECOND");
        }
    }

    #[test]
    fn test_fetch_falls_back_to_default() {
        let value = EnvFetcher::fetch(&["WM_TEST_FETCH_UNSET"], "test value", Some("fallback"))
            .unwrap();
        assert_eq!(value, "fallback");
    }

    #[test]
    fn test_set_variable_beats_default() {
        unsafe {
            std::env::set_var("WM_TEST_FETCH_OVERRIDE", "from-env");
        }
        let value = EnvFetcher::fetch(&["WM_TEST_FETCH_OVERRIDE"], "test value", Some("fallback"))
            .unwrap();
        assert_eq!(value, "from-env");
        unsafe {
            std::env::remove_var("WM_TEST_FETCH_OVERRIDE");
        }
    }
}
