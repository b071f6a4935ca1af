//! Agent-install verification.
//!
//! After installers ran, compare the tracking-service server list against the
//! machines the replication service actually sees. A server counts as
//! installed when its name or FQDN matches a machine source name,
//! case-insensitively.

use wavemill_common::types::Server;

use crate::client::Machine;

/// Result of checking one project's servers against its machines.
#[derive(Debug, Clone, Default)]
pub struct AgentCheck {
    pub installed: Vec<Server>,
    pub missing: Vec<Server>,
}

impl AgentCheck {
    pub fn is_fully_installed(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Replication machine backing `server`, matched by server name or FQDN
/// against the machine source name, case-insensitively.
pub fn machine_for_server<'a>(machines: &'a [Machine], server: &Server) -> Option<&'a Machine> {
    machines.iter().find(|machine| {
        let source = &machine.source_properties.name;
        source.eq_ignore_ascii_case(&server.server_name)
            || server
                .server_fqdn
                .as_deref()
                .is_some_and(|fqdn| source.eq_ignore_ascii_case(fqdn))
    })
}

/// Split `servers` into installed/missing against `machines`.
pub fn check_agents(servers: &[Server], machines: &[Machine]) -> AgentCheck {
    let mut check = AgentCheck::default();

    for server in servers {
        if machine_for_server(machines, server).is_some() {
            check.installed.push(server.clone());
        } else {
            check.missing.push(server.clone());
        }
    }

    check
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::SourceProperties;

    fn server(name: &str, fqdn: Option<&str>) -> Server {
        Server {
            server_id: format!("id-{name}"),
            server_name: name.to_string(),
            server_os: None,
            server_fqdn: fqdn.map(str::to_string),
            app_id: None,
            migration_status: None,
            tags: vec![],
        }
    }

    fn machine(source_name: &str) -> Machine {
        Machine {
            id: format!("m-{source_name}"),
            source_properties: SourceProperties {
                name: source_name.to_string(),
                machine_cloud_id: None,
            },
            replica_id: None,
        }
    }

    #[test]
    fn test_matches_by_name_case_insensitively() {
        let check = check_agents(&[server("Web01", None)], &[machine("web01")]);
        assert_eq!(check.installed.len(), 1);
        assert!(check.is_fully_installed());
    }

    #[test]
    fn test_matches_by_fqdn() {
        let check = check_agents(
            &[server("web01", Some("web01.corp.example.com"))],
            &[machine("WEB01.CORP.EXAMPLE.COM")],
        );
        assert_eq!(check.installed.len(), 1);
    }

    #[test]
    fn test_machine_for_server_prefers_any_match() {
        let machines = vec![machine("db01"), machine("web01.corp.example.com")];
        let found =
            machine_for_server(&machines, &server("WEB01", Some("web01.corp.example.com")))
                .unwrap();
        assert_eq!(found.source_properties.name, "web01.corp.example.com");
        assert!(machine_for_server(&machines, &server("ghost01", None)).is_none());
    }

    #[test]
    fn test_unmatched_server_is_missing() {
        let check = check_agents(
            &[server("web01", None), server("db01", None)],
            &[machine("web01")],
        );
        assert_eq!(check.installed.len(), 1);
        assert_eq!(check.missing.len(), 1);
        assert_eq!(check.missing[0].server_name, "db01");
        assert!(!check.is_fully_installed());
    }
}
