use serde::{Deserialize, Serialize};

/// Milestone events in the migration workflow that warrant a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Event {
    AgentInstalled,
    PostLaunchScriptsUpdated,
    ReplicationDone,
    TestTargetsReady,
    CutoverTargetsReady,
}

impl Event {
    /// All events, in workflow order. Used for CLI help and config docs.
    pub const ALL: &[Event] = &[
        Event::AgentInstalled,
        Event::PostLaunchScriptsUpdated,
        Event::ReplicationDone,
        Event::TestTargetsReady,
        Event::CutoverTargetsReady,
    ];

    /// Default human-readable message for this event, parameterized by the
    /// replication project name.
    pub fn default_message(&self, project: &str) -> String {
        match self {
            Event::AgentInstalled => {
                format!("The replication agents are now installed for the {project} project.")
            }
            Event::PostLaunchScriptsUpdated => {
                format!("The post-launch scripts have been copied to the servers of the {project} project.")
            }
            Event::ReplicationDone => {
                format!("The initial replication for all the servers in the {project} project is done.")
            }
            Event::TestTargetsReady => {
                format!("Test targets of the {project} project are up and running.")
            }
            Event::CutoverTargetsReady => {
                format!("Cutover targets of the {project} project are up and running.")
            }
        }
    }
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Event::AgentInstalled => write!(f, "agent_installed"),
            Event::PostLaunchScriptsUpdated => write!(f, "post_launch_scripts_updated"),
            Event::ReplicationDone => write!(f, "replication_done"),
            Event::TestTargetsReady => write!(f, "test_targets_ready"),
            Event::CutoverTargetsReady => write!(f, "cutover_targets_ready"),
        }
    }
}

impl std::str::FromStr for Event {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "agent_installed" => Ok(Event::AgentInstalled),
            "post_launch_scripts_updated" => Ok(Event::PostLaunchScriptsUpdated),
            "replication_done" => Ok(Event::ReplicationDone),
            "test_targets_ready" => Ok(Event::TestTargetsReady),
            "cutover_targets_ready" => Ok(Event::CutoverTargetsReady),
            other => Err(format!(
                "unknown event '{}', expected one of: {}",
                other,
                Event::ALL
                    .iter()
                    .map(|e| e.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_parse_round_trip() {
        for event in Event::ALL {
            let parsed: Event = event.to_string().parse().unwrap();
            assert_eq!(parsed, *event);
        }
    }

    #[test]
    fn test_unknown_event_lists_valid_names() {
        let err = "replication_started".parse::<Event>().unwrap_err();
        assert!(err.contains("agent_installed"));
    }

    #[test]
    fn test_default_message_mentions_project() {
        let message = Event::ReplicationDone.default_message("acme-wave-3");
        assert!(message.contains("acme-wave-3"));
    }
}
