//! Authenticated requests against the tracking service.
//!
//! A thin wrapper over reqwest that logs every call, checks the expected
//! status codes, and exposes typed operations for the workflows that consume
//! waves, apps, and servers.

use serde::de::DeserializeOwned;

use wavemill_common::error::AppError;
use wavemill_common::types::{App, Server, ServerOs, Wave};

use crate::auth::FactoryAuth;

const WAVES_PATH: &str = "/prod/user/waves";
const APPS_PATH: &str = "/prod/user/apps";
const SERVERS_PATH: &str = "/prod/user/servers";

/// Servers of one wave, grouped by replication project and split by OS.
#[derive(Debug, Clone, Default)]
pub struct ProjectServers {
    pub project_name: String,
    pub windows: Vec<Server>,
    pub linux: Vec<Server>,
}

impl ProjectServers {
    pub fn is_empty(&self) -> bool {
        self.windows.is_empty() && self.linux.is_empty()
    }
}

/// Authenticated client for the tracking service user API.
pub struct FactoryClient {
    client: reqwest::Client,
    auth: FactoryAuth,
    user_api_url: String,
}

impl FactoryClient {
    pub fn new(user_api_url: &str, auth: FactoryAuth) -> Self {
        Self {
            client: reqwest::Client::new(),
            auth,
            user_api_url: user_api_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn list_waves(&self) -> Result<Vec<Wave>, AppError> {
        self.get(WAVES_PATH).await
    }

    pub async fn list_apps(&self) -> Result<Vec<App>, AppError> {
        self.get(APPS_PATH).await
    }

    pub async fn list_servers(&self) -> Result<Vec<Server>, AppError> {
        self.get(SERVERS_PATH).await
    }

    pub async fn get_wave(&self, wave_id: &str) -> Result<Wave, AppError> {
        self.get(&format!("{WAVES_PATH}/{wave_id}")).await
    }

    /// Update attributes of one server record (tags, migration status, ...).
    pub async fn update_server(
        &self,
        server_id: &str,
        patch: &serde_json::Value,
    ) -> Result<(), AppError> {
        let url = format!("{}{SERVERS_PATH}/{server_id}", self.user_api_url);
        let token = self.auth.token().await?;

        let response = self
            .client
            .put(&url)
            .header("Authorization", token)
            .json(patch)
            .send()
            .await?;

        let status = response.status();
        tracing::info!(url = %url, status = status.as_u16(), "PUT");

        if !matches!(status.as_u16(), 200 | 201) {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::UnexpectedStatus {
                verb: "PUT",
                url,
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }

    /// Mark a server's migration status.
    pub async fn set_migration_status(
        &self,
        server_id: &str,
        status: &str,
    ) -> Result<(), AppError> {
        self.update_server(server_id, &serde_json::json!({ "migration_status": status }))
            .await
    }

    /// Servers of a wave, grouped per replication project and split by OS.
    pub async fn servers_for_wave(&self, wave_id: &str) -> Result<Vec<ProjectServers>, AppError> {
        let apps = self.list_apps().await?;
        let servers = self.list_servers().await?;
        group_wave_servers(wave_id, &apps, &servers)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, AppError> {
        let url = format!("{}{}", self.user_api_url, path);
        let token = self.auth.token().await?;

        let response = self
            .client
            .get(&url)
            .header("Authorization", token)
            .send()
            .await?;

        let status = response.status();
        tracing::info!(url = %url, status = status.as_u16(), "GET");

        if status.as_u16() != 200 {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::UnexpectedStatus {
                verb: "GET",
                url,
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        tracing::debug!(url = %url, body = %body, "Response body");
        Ok(serde_json::from_str(&body)?)
    }
}

/// IDs of the apps assigned to `wave_id`.
pub fn app_ids_for_wave(apps: &[App], wave_id: &str) -> Vec<String> {
    apps.iter()
        .filter(|app| app.wave_id.as_deref() == Some(wave_id))
        .map(|app| app.app_id.clone())
        .collect()
}

/// IDs of the servers belonging to `app_id`.
pub fn server_ids_for_app(servers: &[Server], app_id: &str) -> Vec<String> {
    servers
        .iter()
        .filter(|server| server.app_id.as_deref() == Some(app_id))
        .map(|server| server.server_id.clone())
        .collect()
}

/// Group the servers of a wave by replication project, split by OS.
///
/// Hard validation errors, matching the historical batch scripts:
/// - an app in the wave without a linked replication project
/// - a server without `server_os` or `server_fqdn`
/// - a wave whose resolved server list is empty
pub fn group_wave_servers(
    wave_id: &str,
    apps: &[App],
    servers: &[Server],
) -> Result<Vec<ProjectServers>, AppError> {
    let mut projects: Vec<ProjectServers> = Vec::new();

    for app in apps {
        if app.wave_id.as_deref() != Some(wave_id) {
            tracing::debug!(app_id = %app.app_id, wave_id, "App filtered, not in wave");
            continue;
        }

        let project_name = app.replication_project_name.clone().ok_or_else(|| {
            AppError::Validation(format!(
                "App '{}' is not linked to any replication project",
                app.app_name
            ))
        })?;

        let index = match projects.iter().position(|p| p.project_name == project_name) {
            Some(existing) => existing,
            None => {
                projects.push(ProjectServers {
                    project_name,
                    ..Default::default()
                });
                projects.len() - 1
            }
        };
        let project = &mut projects[index];

        for server in servers {
            if server.app_id.as_deref() != Some(app.app_id.as_str()) {
                continue;
            }

            let os = server.server_os.ok_or_else(|| {
                AppError::Validation(format!(
                    "server_os attribute does not exist for server '{}'",
                    server.server_name
                ))
            })?;
            if server.server_fqdn.is_none() {
                return Err(AppError::Validation(format!(
                    "server_fqdn for server '{}' doesn't exist",
                    server.server_name
                )));
            }

            match os {
                ServerOs::Windows => project.windows.push(server.clone()),
                ServerOs::Linux => project.linux.push(server.clone()),
            }
        }
    }

    let total: usize = projects.iter().map(|p| p.windows.len() + p.linux.len()).sum();
    if total == 0 {
        return Err(AppError::NotFound(format!(
            "Server list for wave '{wave_id}' is empty"
        )));
    }

    Ok(projects)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app(app_id: &str, wave_id: Option<&str>, project: Option<&str>) -> App {
        App {
            app_id: app_id.to_string(),
            app_name: format!("app-{app_id}"),
            wave_id: wave_id.map(str::to_string),
            replication_project_name: project.map(str::to_string),
        }
    }

    fn server(server_id: &str, app_id: &str, os: Option<ServerOs>, fqdn: Option<&str>) -> Server {
        Server {
            server_id: server_id.to_string(),
            server_name: format!("srv-{server_id}"),
            server_os: os,
            server_fqdn: fqdn.map(str::to_string),
            app_id: Some(app_id.to_string()),
            migration_status: None,
            tags: vec![],
        }
    }

    #[test]
    fn test_app_ids_for_wave_filters() {
        let apps = vec![
            app("a1", Some("w1"), None),
            app("a2", Some("w2"), None),
            app("a3", None, None),
        ];
        assert_eq!(app_ids_for_wave(&apps, "w1"), vec!["a1"]);
    }

    #[test]
    fn test_server_ids_for_app_filters() {
        let servers = vec![
            server("s1", "a1", Some(ServerOs::Linux), Some("s1.example.com")),
            server("s2", "a2", Some(ServerOs::Linux), Some("s2.example.com")),
        ];
        assert_eq!(server_ids_for_app(&servers, "a1"), vec!["s1"]);
    }

    #[test]
    fn test_group_wave_servers_splits_by_os_and_project() {
        let apps = vec![
            app("a1", Some("w1"), Some("proj-a")),
            app("a2", Some("w1"), Some("proj-b")),
            app("a3", Some("w2"), Some("proj-c")),
        ];
        let servers = vec![
            server("s1", "a1", Some(ServerOs::Linux), Some("s1.example.com")),
            server("s2", "a1", Some(ServerOs::Windows), Some("s2.example.com")),
            server("s3", "a2", Some(ServerOs::Linux), Some("s3.example.com")),
            server("s4", "a3", Some(ServerOs::Linux), Some("s4.example.com")),
        ];

        let projects = group_wave_servers("w1", &apps, &servers).unwrap();
        assert_eq!(projects.len(), 2);

        let proj_a = projects.iter().find(|p| p.project_name == "proj-a").unwrap();
        assert_eq!(proj_a.linux.len(), 1);
        assert_eq!(proj_a.windows.len(), 1);

        let proj_b = projects.iter().find(|p| p.project_name == "proj-b").unwrap();
        assert_eq!(proj_b.linux.len(), 1);
        assert!(proj_b.windows.is_empty());
    }

    #[test]
    fn test_group_wave_servers_rejects_missing_project_link() {
        let apps = vec![app("a1", Some("w1"), None)];
        let servers = vec![server("s1", "a1", Some(ServerOs::Linux), Some("s1.example.com"))];
        let err = group_wave_servers("w1", &apps, &servers).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_group_wave_servers_rejects_missing_os() {
        let apps = vec![app("a1", Some("w1"), Some("proj-a"))];
        let servers = vec![server("s1", "a1", None, Some("s1.example.com"))];
        let err = group_wave_servers("w1", &apps, &servers).unwrap_err();
        assert!(err.to_string().contains("server_os"));
    }

    #[test]
    fn test_group_wave_servers_rejects_missing_fqdn() {
        let apps = vec![app("a1", Some("w1"), Some("proj-a"))];
        let servers = vec![server("s1", "a1", Some(ServerOs::Linux), None)];
        let err = group_wave_servers("w1", &apps, &servers).unwrap_err();
        assert!(err.to_string().contains("server_fqdn"));
    }

    #[test]
    fn test_group_wave_servers_rejects_empty_wave() {
        let apps = vec![app("a1", Some("w1"), Some("proj-a"))];
        let err = group_wave_servers("w1", &apps, &[]).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
