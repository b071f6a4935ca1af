use serde::{Deserialize, Serialize};

/// Operating system of a source server, as recorded in the tracking service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerOs {
    Windows,
    Linux,
}

impl std::fmt::Display for ServerOs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServerOs::Windows => write!(f, "windows"),
            ServerOs::Linux => write!(f, "linux"),
        }
    }
}

impl std::str::FromStr for ServerOs {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "windows" => Ok(ServerOs::Windows),
            "linux" => Ok(ServerOs::Linux),
            other => Err(format!("unknown server OS '{other}'")),
        }
    }
}

/// A named batch of applications and servers migrated together.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wave {
    pub wave_id: String,
    pub wave_name: String,
    #[serde(default)]
    pub wave_status: Option<String>,
}

/// An application registered in the tracking service, optionally assigned to
/// a wave and linked to a replication-service project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct App {
    pub app_id: String,
    pub app_name: String,
    #[serde(default)]
    pub wave_id: Option<String>,
    #[serde(default)]
    pub replication_project_name: Option<String>,
}

/// A source server registered in the tracking service.
///
/// `server_os` and `server_fqdn` are optional in the wire format but required
/// by every batch operation; callers validate their presence per server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Server {
    pub server_id: String,
    pub server_name: String,
    #[serde(default)]
    pub server_os: Option<ServerOs>,
    #[serde(default)]
    pub server_fqdn: Option<String>,
    #[serde(default)]
    pub app_id: Option<String>,
    #[serde(default)]
    pub migration_status: Option<String>,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

/// A key/value tag attached to a server record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

/// Migration status strings written back to the tracking service after the
/// agent-install verification pass.
pub const STATUS_AGENT_INSTALL_SUCCESS: &str = "Agent Install - Success";
pub const STATUS_AGENT_INSTALL_FAILED: &str = "Agent Install - Failed";
pub const STATUS_TEST_INSTANCE_TERMINATED: &str = "Test instance terminated";

/// Check whether a string can be serialized into a path or filename without
/// surprises. Warns (but does not fail) when it contains special characters.
pub fn is_path_safe(value: &str) -> bool {
    let safe = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | ' ' | '-'));

    if !safe {
        tracing::warn!(
            value,
            "String contains special characters and may not serialize cleanly as a path"
        );
    }

    safe
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_os_round_trip() {
        assert_eq!("windows".parse::<ServerOs>().unwrap(), ServerOs::Windows);
        assert_eq!("Linux".parse::<ServerOs>().unwrap(), ServerOs::Linux);
        assert!("solaris".parse::<ServerOs>().is_err());
    }

    #[test]
    fn test_path_safe() {
        assert!(is_path_safe("prod-eu 2"));
        assert!(!is_path_safe("prod/eu"));
        assert!(!is_path_safe(""));
    }

    #[test]
    fn test_server_deserializes_with_missing_optionals() {
        let server: Server = serde_json::from_str(
            r#"{"server_id": "s-1", "server_name": "web01"}"#,
        )
        .unwrap();
        assert!(server.server_os.is_none());
        assert!(server.server_fqdn.is_none());
        assert!(server.tags.is_empty());
    }
}
