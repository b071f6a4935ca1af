//! Subcommand implementations and their shared plumbing.

use std::path::PathBuf;

use dialoguer::{Confirm, Input};

use wavemill_common::config::{AppConfig, EndpointsConfig};
use wavemill_common::env::{
    EnvFetcher, LINUX_KEY_PASSPHRASE_VARS, LINUX_PASSWORD_VARS, LINUX_USERNAME_VARS,
    WINDOWS_PASSWORD_VARS, WINDOWS_USERNAME_VARS,
};
use wavemill_factory::{FactoryAuth, FactoryClient};
use wavemill_notify::Notifier;
use wavemill_remote::powershell::WindowsCredential;
use wavemill_remote::ssh::SshAuth;

pub mod copy_files;
pub mod import_tags;
pub mod install_agents;
pub mod instance_ips;
pub mod notify;
pub mod shutdown;
pub mod terminate_test_instances;
pub mod user_mgmt;

/// Build an authenticated tracking-service client from the endpoints config.
pub fn factory_client() -> anyhow::Result<FactoryClient> {
    let endpoints = EndpointsConfig::load_default()?;
    let auth = FactoryAuth::from_env(&endpoints.login_api_url)?;
    Ok(FactoryClient::new(&endpoints.user_api_url, auth))
}

/// Build the notifier from the toolkit config; a missing `notifications`
/// section yields a disabled notifier.
pub fn notifier() -> anyhow::Result<Notifier> {
    let config = AppConfig::load_default()?;
    match config.notifications {
        Some(notifications) => Ok(Notifier::from_config(&notifications)?),
        None => Ok(Notifier::disabled()),
    }
}

/// Linux SSH credentials: username plus key file or password, prompting for
/// whatever the environment does not provide.
pub fn linux_credentials() -> anyhow::Result<(String, SshAuth)> {
    let user = EnvFetcher::fetch(LINUX_USERNAME_VARS, "Linux username", None)?;

    let use_key = Confirm::new()
        .with_prompt("Log in with a private key (instead of a password)?")
        .default(true)
        .interact()?;

    let auth = if use_key {
        let key_file: String = Input::new()
            .with_prompt("Private key file")
            .interact_text()?;
        let passphrase =
            EnvFetcher::fetch_sensitive(LINUX_KEY_PASSPHRASE_VARS, "Key passphrase (empty if none)")?;
        SshAuth::Key {
            key_file: PathBuf::from(key_file),
            passphrase: (!passphrase.is_empty()).then_some(passphrase),
        }
    } else {
        let password = EnvFetcher::fetch_sensitive(LINUX_PASSWORD_VARS, "Linux password")?;
        SshAuth::Password(password)
    };

    Ok((user, auth))
}

/// Windows remoting credential, when one is configured. An empty username
/// means "use the ambient identity" and yields `None`.
pub fn windows_credential() -> anyhow::Result<Option<WindowsCredential>> {
    let user = EnvFetcher::fetch(WINDOWS_USERNAME_VARS, "Windows username", Some(""))?;
    if user.is_empty() {
        return Ok(None);
    }

    let password = EnvFetcher::fetch_sensitive(WINDOWS_PASSWORD_VARS, "Windows user password")?;
    Ok(Some(WindowsCredential { user, password }))
}
