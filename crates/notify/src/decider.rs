//! Per-channel event filtering.
//!
//! Every channel owns a decider built from its configured whitelist and
//! blacklist. The blacklist always wins; a non-empty whitelist requires
//! membership; an empty whitelist allows everything.

/// Declarative allow/deny-list filter deciding whether a channel should
/// deliver a given event.
#[derive(Debug, Clone, Default)]
pub struct SendEventDecider {
    whitelist: Vec<String>,
    blacklist: Vec<String>,
}

impl SendEventDecider {
    pub fn new(whitelist: Vec<String>, blacklist: Vec<String>) -> Self {
        Self {
            whitelist,
            blacklist,
        }
    }

    /// Whether `event_name` should be delivered.
    pub fn should_send(&self, event_name: &str) -> bool {
        if self.blacklist.iter().any(|e| e == event_name) {
            tracing::debug!(event = event_name, "Event suppressed: blacklisted");
            return false;
        }

        if !self.whitelist.is_empty() && !self.whitelist.iter().any(|e| e == event_name) {
            tracing::debug!(event = event_name, "Event suppressed: not whitelisted");
            return false;
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_lists_allow_everything() {
        let decider = SendEventDecider::default();
        assert!(decider.should_send("agent_installed"));
    }

    #[test]
    fn test_blacklist_suppresses() {
        let decider = SendEventDecider::new(vec![], vec!["replication_done".to_string()]);
        assert!(!decider.should_send("replication_done"));
        assert!(decider.should_send("agent_installed"));
    }

    #[test]
    fn test_whitelist_requires_membership() {
        let decider = SendEventDecider::new(vec!["agent_installed".to_string()], vec![]);
        assert!(decider.should_send("agent_installed"));
        assert!(!decider.should_send("replication_done"));
    }

    #[test]
    fn test_blacklist_wins_over_whitelist() {
        let decider = SendEventDecider::new(
            vec!["agent_installed".to_string()],
            vec!["agent_installed".to_string()],
        );
        assert!(!decider.should_send("agent_installed"));
    }
}
