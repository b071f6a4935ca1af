//! The notification dispatcher.
//!
//! Fans one event out to every enabled channel concurrently and waits for all
//! deliveries to finish before returning. Channel failures are logged and
//! counted, never retried.

use std::sync::Arc;

use tokio::task::JoinSet;

use wavemill_common::config::NotificationsConfig;
use wavemill_common::error::AppError;

use crate::channel::ChannelBag;
use crate::email::EmailChannel;
use crate::event::Event;
use crate::null::NullChannel;
use crate::webhook::WebhookChannel;

/// Outcome of one dispatch: how many channel deliveries ran and how many of
/// those failed. A suppressed or disabled channel is not counted as a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub dispatched: usize,
    pub failed: usize,
}

/// Handles all notifications for the toolkit.
pub struct Notifier {
    bag: ChannelBag,
    enabled: Vec<String>,
}

impl Notifier {
    /// Build the notifier from the `notifications` config section.
    ///
    /// Every new channel implementation must be added to the bag here; there
    /// is no channel discovery beyond this constructor.
    pub fn from_config(config: &NotificationsConfig) -> Result<Self, AppError> {
        let mut bag = ChannelBag::new();

        if let Some(webhook) = &config.webhook {
            bag.add(Arc::new(WebhookChannel::new(webhook.clone())));
        }
        if let Some(email) = &config.email {
            bag.add(Arc::new(EmailChannel::new(email.clone())?));
        }
        bag.add(Arc::new(NullChannel::new()));

        Ok(Self::from_parts(bag, config.enabled.clone()))
    }

    /// Build from an explicit channel bag. Also the seam used by tests.
    pub fn from_parts(bag: ChannelBag, enabled: Vec<String>) -> Self {
        for name in &enabled {
            if bag.get(name).is_none() {
                tracing::warn!(
                    channel = %name,
                    "Channel is enabled but not configured, it will be skipped"
                );
            }
        }

        Self { bag, enabled }
    }

    /// A notifier that delivers nothing. Used when the toolkit config has no
    /// `notifications` section.
    pub fn disabled() -> Self {
        Self {
            bag: ChannelBag::new(),
            enabled: Vec::new(),
        }
    }

    /// Dispatch `event` with its default message for `project`.
    pub async fn notify_default(&self, event: Event, project: &str) -> DispatchSummary {
        self.notify(event, &event.default_message(project)).await
    }

    /// Fan `event` out to all enabled channels and wait for every delivery to
    /// finish. Failures are logged per channel and tallied in the summary.
    pub async fn notify(&self, event: Event, message: &str) -> DispatchSummary {
        let mut deliveries = JoinSet::new();

        for name in &self.enabled {
            let Some(channel) = self.bag.get(name) else {
                continue;
            };

            let channel = Arc::clone(channel);
            let message = message.to_string();
            deliveries.spawn(async move {
                let result = channel.notify(event, &message).await;
                (channel.name(), result)
            });
        }

        let mut summary = DispatchSummary::default();
        while let Some(joined) = deliveries.join_next().await {
            summary.dispatched += 1;
            match joined {
                Ok((channel, Ok(()))) => {
                    tracing::debug!(channel, event = %event, "Notification delivered");
                }
                Ok((channel, Err(e))) => {
                    summary.failed += 1;
                    tracing::error!(channel, event = %event, error = %e, "Notification failed");
                }
                Err(e) => {
                    summary.failed += 1;
                    tracing::error!(event = %event, error = %e, "Notification task panicked");
                }
            }
        }

        if summary.dispatched > 0 {
            tracing::info!(
                event = %event,
                dispatched = summary.dispatched,
                failed = summary.failed,
                "Notification dispatch finished"
            );
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::channel::Channel;
    use crate::decider::SendEventDecider;

    /// Test channel that records deliveries and can be told to fail or stall.
    struct RecordingChannel {
        name: &'static str,
        decider: SendEventDecider,
        delay: Duration,
        fail: bool,
        deliveries: Arc<Mutex<Vec<(Event, String)>>>,
    }

    impl RecordingChannel {
        fn new(name: &'static str) -> (Arc<Self>, Arc<Mutex<Vec<(Event, String)>>>) {
            let deliveries = Arc::new(Mutex::new(Vec::new()));
            let channel = Arc::new(Self {
                name,
                decider: SendEventDecider::default(),
                delay: Duration::ZERO,
                fail: false,
                deliveries: Arc::clone(&deliveries),
            });
            (channel, deliveries)
        }
    }

    #[async_trait]
    impl Channel for RecordingChannel {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn notify(&self, event: Event, message: &str) -> Result<(), AppError> {
            if !self.decider.should_send(&event.to_string()) {
                return Ok(());
            }
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.deliveries
                .lock()
                .unwrap()
                .push((event, message.to_string()));
            if self.fail {
                return Err(AppError::Notify("boom".to_string()));
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_fans_out_to_all_enabled_channels() {
        let (first, first_log) = RecordingChannel::new("first");
        let (second, second_log) = RecordingChannel::new("second");
        let (third, third_log) = RecordingChannel::new("third");

        let mut bag = ChannelBag::new();
        bag.add(first);
        bag.add(second);
        bag.add(third);

        // "third" is configured but not enabled.
        let notifier =
            Notifier::from_parts(bag, vec!["first".to_string(), "second".to_string()]);
        let summary = notifier.notify(Event::AgentInstalled, "done").await;

        assert_eq!(summary, DispatchSummary { dispatched: 2, failed: 0 });
        assert_eq!(first_log.lock().unwrap().len(), 1);
        assert_eq!(second_log.lock().unwrap().len(), 1);
        assert!(third_log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_waits_for_slow_channels() {
        let deliveries = Arc::new(Mutex::new(Vec::new()));
        let slow = Arc::new(RecordingChannel {
            name: "slow",
            decider: SendEventDecider::default(),
            delay: Duration::from_millis(50),
            fail: false,
            deliveries: Arc::clone(&deliveries),
        });

        let mut bag = ChannelBag::new();
        bag.add(slow);

        let notifier = Notifier::from_parts(bag, vec!["slow".to_string()]);
        notifier.notify(Event::ReplicationDone, "done").await;

        // The dispatch must not return before the slow delivery landed.
        assert_eq!(deliveries.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_one_failing_channel_does_not_stop_the_others() {
        let deliveries = Arc::new(Mutex::new(Vec::new()));
        let failing = Arc::new(RecordingChannel {
            name: "failing",
            decider: SendEventDecider::default(),
            delay: Duration::ZERO,
            fail: true,
            deliveries: Arc::clone(&deliveries),
        });
        let (healthy, healthy_log) = RecordingChannel::new("healthy");

        let mut bag = ChannelBag::new();
        bag.add(failing);
        bag.add(healthy);

        let notifier =
            Notifier::from_parts(bag, vec!["failing".to_string(), "healthy".to_string()]);
        let summary = notifier.notify(Event::TestTargetsReady, "done").await;

        assert_eq!(summary.dispatched, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(healthy_log.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_enabled_channel_is_skipped() {
        let (only, only_log) = RecordingChannel::new("only");
        let mut bag = ChannelBag::new();
        bag.add(only);

        let notifier =
            Notifier::from_parts(bag, vec!["only".to_string(), "missing".to_string()]);
        let summary = notifier.notify(Event::CutoverTargetsReady, "done").await;

        assert_eq!(summary, DispatchSummary { dispatched: 1, failed: 0 });
        assert_eq!(only_log.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_disabled_notifier_is_a_no_op() {
        let summary = Notifier::disabled()
            .notify(Event::AgentInstalled, "done")
            .await;
        assert_eq!(summary, DispatchSummary::default());
    }

    #[tokio::test]
    async fn test_channel_side_decider_suppression_counts_as_success() {
        let deliveries = Arc::new(Mutex::new(Vec::new()));
        let picky = Arc::new(RecordingChannel {
            name: "picky",
            decider: SendEventDecider::new(vec!["replication_done".to_string()], vec![]),
            delay: Duration::ZERO,
            fail: false,
            deliveries: Arc::clone(&deliveries),
        });

        let mut bag = ChannelBag::new();
        bag.add(picky);

        let notifier = Notifier::from_parts(bag, vec!["picky".to_string()]);
        let summary = notifier.notify(Event::AgentInstalled, "done").await;

        assert_eq!(summary, DispatchSummary { dispatched: 1, failed: 0 });
        assert!(deliveries.lock().unwrap().is_empty());
    }
}
