use serde::Deserialize;

use wavemill_common::error::AppError;

use crate::session::ReplicationSession;

/// A replication project.
#[derive(Debug, Clone, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(rename = "agentInstallationToken", default)]
    pub agent_installation_token: Option<String>,
}

/// A machine under replication, with its source properties.
#[derive(Debug, Clone, Deserialize)]
pub struct Machine {
    pub id: String,
    #[serde(rename = "sourceProperties")]
    pub source_properties: SourceProperties,
    #[serde(rename = "replica", default)]
    pub replica_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceProperties {
    pub name: String,
    #[serde(rename = "machineCloudId", default)]
    pub machine_cloud_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ItemsEnvelope<T> {
    items: Vec<T>,
}

/// Typed queries against the replication service.
pub struct ReplicationClient {
    session: ReplicationSession,
}

impl ReplicationClient {
    pub fn new(session: ReplicationSession) -> Self {
        Self { session }
    }

    /// Look a project up by its exact name.
    pub async fn project_by_name(&mut self, name: &str) -> Result<Project, AppError> {
        let envelope: ItemsEnvelope<Project> = self.get_json("projects").await?;
        envelope
            .items
            .into_iter()
            .find(|project| project.name == name)
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "Project '{name}' does not exist in the replication service"
                ))
            })
    }

    /// Agent installation token of a project.
    pub async fn install_token(&mut self, project_id: &str) -> Result<String, AppError> {
        let project: Project = self.get_json(&format!("projects/{project_id}")).await?;
        project.agent_installation_token.ok_or_else(|| {
            AppError::NotFound(format!("Project '{project_id}' has no agent install token"))
        })
    }

    /// Cloud instance ID backing a machine's replica (the launched target).
    pub async fn replica_instance_id(&mut self, replica_id: &str) -> Result<String, AppError> {
        let replica: serde_json::Value = self.get_json(&format!("replicas/{replica_id}")).await?;
        replica["machineCloudId"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| {
                AppError::NotFound(format!("Replica '{replica_id}' has no cloud instance ID"))
            })
    }

    /// All machines of a project.
    pub async fn machines(&mut self, project_id: &str) -> Result<Vec<Machine>, AppError> {
        let envelope: ItemsEnvelope<Machine> =
            self.get_json(&format!("projects/{project_id}/machines")).await?;
        Ok(envelope.items)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &mut self,
        path: &str,
    ) -> Result<T, AppError> {
        let response = self
            .session
            .request(|client, url| client.get(url), path)
            .await?;

        let status = response.status();
        tracing::info!(path, status = status.as_u16(), "Replication GET");

        if status.as_u16() != 200 {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::UnexpectedStatus {
                verb: "GET",
                url: path.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        tracing::debug!(path, body = %body, "Replication response body");
        Ok(serde_json::from_str(&body)?)
    }
}
