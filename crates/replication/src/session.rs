use serde_json::json;

use wavemill_common::env::{EnvFetcher, REPLICATION_TOKEN_VARS};
use wavemill_common::error::AppError;

/// Console host of the replication service.
pub const CONSOLE_HOST: &str = "https://console.replication.example.com";
/// Default API base path. A login redirect can rewrite it (legacy fallback).
const DEFAULT_API_BASE: &str = "/api/latest";

/// Authenticated session against the replication service console.
///
/// Login posts the API token; the service answers with a session cookie and
/// an XSRF token cookie that must be echoed as a header on later calls. Some
/// legacy tenants redirect login to a different API base path, in which case
/// the base is re-derived from the final URL and login retried once.
pub struct ReplicationSession {
    client: reqwest::Client,
    host: String,
    api_token: String,
    api_base: String,
    xsrf_token: Option<String>,
    logged_in: bool,
}

impl ReplicationSession {
    pub fn new(host: &str, api_token: &str) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .map_err(AppError::Http)?;

        Ok(Self {
            client,
            host: host.trim_end_matches('/').to_string(),
            api_token: api_token.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            xsrf_token: None,
            logged_in: false,
        })
    }

    /// Build with the API token from the environment, prompting when unset.
    pub fn from_env(host: &str) -> Result<Self, AppError> {
        let token =
            EnvFetcher::fetch_sensitive(REPLICATION_TOKEN_VARS, "Replication service API token")?;
        Self::new(host, &token)
    }

    /// Log in, following the legacy endpoint fallback when redirected.
    pub async fn login(&mut self) -> Result<(), AppError> {
        let mut response = self.login_request().await?;

        // A redirected login means this tenant lives under another API base.
        if response.url().path() != format!("{}/login", self.api_base) {
            let final_path = response.url().path().to_string();
            if let Some(base) = final_path.strip_suffix("/login") {
                tracing::warn!(
                    api_base = base,
                    "Login was redirected to a legacy API base, retrying there"
                );
                self.api_base = base.to_string();
                response = self.login_request().await?;
            }
        }

        match response.status().as_u16() {
            200 => {}
            401 | 403 => {
                return Err(AppError::Auth(
                    "The replication service login credentials cannot be authenticated".to_string(),
                ));
            }
            402 => {
                return Err(AppError::Auth(
                    "There is no active license configured for this replication account".to_string(),
                ));
            }
            429 => {
                return Err(AppError::Auth(
                    "Replication service authentication failure limit reached, retry after a timeout"
                        .to_string(),
                ));
            }
            code => {
                let body = response.text().await.unwrap_or_default();
                return Err(AppError::UnexpectedStatus {
                    verb: "POST",
                    url: self.url("login"),
                    status: code,
                    body,
                });
            }
        }

        self.xsrf_token = response
            .cookies()
            .find(|c| c.name() == "XSRF-TOKEN")
            .map(|c| c.value().to_string());
        self.logged_in = true;

        tracing::info!("Logged in to the replication service");
        Ok(())
    }

    async fn login_request(&self) -> Result<reqwest::Response, AppError> {
        let response = self
            .client
            .post(self.url("login"))
            .header("Content-Type", "application/json")
            .header("Accept", "text/plain")
            .json(&json!({ "userApiToken": self.api_token }))
            .send()
            .await?;
        tracing::debug!(status = response.status().as_u16(), "Replication login");
        Ok(response)
    }

    /// Full URL for an API path under the current base.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}/{}", self.host, self.api_base, path)
    }

    /// Issue a request through the session, logging in first when needed.
    pub async fn request(
        &mut self,
        builder: impl Fn(&reqwest::Client, String) -> reqwest::RequestBuilder,
        path: &str,
    ) -> Result<reqwest::Response, AppError> {
        if !self.logged_in {
            self.login().await?;
        }

        let mut request = builder(&self.client, self.url(path));
        if let Some(token) = &self.xsrf_token {
            request = request.header("X-XSRF-TOKEN", token);
        }

        Ok(request.send().await?)
    }
}
