use serde_json::json;
use tokio::sync::OnceCell;

use wavemill_common::env::{EnvFetcher, FACTORY_PASSWORD_VARS, FACTORY_USERNAME_VARS};
use wavemill_common::error::AppError;

/// Login path relative to the login API URL.
const LOGIN_PATH: &str = "/prod/login";

/// Authenticates against the tracking service and caches the token.
pub struct FactoryAuth {
    client: reqwest::Client,
    login_api_url: String,
    username: String,
    password: String,
    token: OnceCell<String>,
}

impl FactoryAuth {
    /// Build from explicit credentials.
    pub fn new(login_api_url: &str, username: &str, password: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            login_api_url: login_api_url.trim_end_matches('/').to_string(),
            username: username.to_string(),
            password: password.to_string(),
            token: OnceCell::new(),
        }
    }

    /// Build with credentials from the environment, prompting when unset.
    pub fn from_env(login_api_url: &str) -> Result<Self, AppError> {
        let username = EnvFetcher::fetch(FACTORY_USERNAME_VARS, "Tracking service username", None)?;
        let password =
            EnvFetcher::fetch_sensitive(FACTORY_PASSWORD_VARS, "Tracking service password")?;
        Ok(Self::new(login_api_url, &username, &password))
    }

    /// Return the cached authorization token, logging in on first use.
    pub async fn token(&self) -> Result<&str, AppError> {
        self.token
            .get_or_try_init(|| self.login())
            .await
            .map(String::as_str)
    }

    async fn login(&self) -> Result<String, AppError> {
        let url = format!("{}{}", self.login_api_url, LOGIN_PATH);
        let response = self
            .client
            .post(&url)
            .json(&json!({ "username": self.username, "password": self.password }))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        match status.as_u16() {
            200 => {
                tracing::info!("Logged in to the tracking service");
                // The login endpoint returns the bare token as a JSON string.
                Ok(body.trim().trim_matches('"').to_string())
            }
            502 => Err(AppError::Auth(
                "Incorrect tracking service username or password".to_string(),
            )),
            code => Err(AppError::UnexpectedStatus {
                verb: "POST",
                url,
                status: code,
                body,
            }),
        }
    }
}
