//! Chat webhook channel.
//!
//! Posts a `{"text": ...}` card to every configured webhook URL. All URLs
//! are posted concurrently; invalid URLs are logged and skipped.

use tokio::task::JoinSet;
use url::Url;

use async_trait::async_trait;
use serde_json::json;

use wavemill_common::config::WebhookChannelConfig;
use wavemill_common::error::AppError;

use crate::channel::Channel;
use crate::decider::SendEventDecider;
use crate::event::Event;

/// Most chat services rate-limit incoming webhooks; warn past this many.
const WEBHOOK_RATE_LIMIT_HINT: usize = 10;

/// Channel delivering to chat webhooks.
pub struct WebhookChannel {
    client: reqwest::Client,
    webhook_urls: Vec<String>,
    decider: SendEventDecider,
}

impl WebhookChannel {
    pub const NAME: &'static str = "webhook";

    pub fn new(config: WebhookChannelConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            webhook_urls: config.webhook_urls,
            decider: SendEventDecider::new(config.event_whitelist, config.event_blacklist),
        }
    }

    /// Validate and return the deliverable subset of the configured URLs.
    fn valid_urls(&self) -> Vec<String> {
        self.webhook_urls
            .iter()
            .filter(|raw| match Url::parse(raw) {
                Ok(url) if matches!(url.scheme(), "http" | "https") => true,
                Ok(url) => {
                    tracing::error!(url = %raw, scheme = url.scheme(), "Webhook URL has a non-HTTP scheme, skipping");
                    false
                }
                Err(e) => {
                    tracing::error!(url = %raw, error = %e, "'{raw}' is not a valid URL, skipping");
                    false
                }
            })
            .cloned()
            .collect()
    }
}

#[async_trait]
impl Channel for WebhookChannel {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn notify(&self, event: Event, message: &str) -> Result<(), AppError> {
        if !self.decider.should_send(&event.to_string()) {
            return Ok(());
        }

        if self.webhook_urls.len() > WEBHOOK_RATE_LIMIT_HINT {
            tracing::warn!(
                count = self.webhook_urls.len(),
                "More than {WEBHOOK_RATE_LIMIT_HINT} webhooks configured, be cautious of rate limits"
            );
        }

        let mut deliveries = JoinSet::new();
        for url in self.valid_urls() {
            let client = self.client.clone();
            let body = json!({ "text": message });
            deliveries.spawn(async move {
                let result = client.post(&url).json(&body).send().await;
                (url, result)
            });
        }

        let mut failed = 0usize;
        while let Some(joined) = deliveries.join_next().await {
            let (url, result) = joined
                .map_err(|e| AppError::Notify(format!("webhook delivery task panicked: {e}")))?;
            match result.and_then(|response| response.error_for_status()) {
                Ok(_) => tracing::debug!(url = %url, event = %event, "Webhook delivered"),
                Err(e) => {
                    failed += 1;
                    tracing::error!(url = %url, event = %event, error = %e, "Webhook delivery failed");
                }
            }
        }

        if failed > 0 {
            return Err(AppError::Notify(format!(
                "{failed} webhook delivery(ies) failed for event '{event}'"
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel_with_urls(urls: &[&str]) -> WebhookChannel {
        WebhookChannel::new(WebhookChannelConfig {
            webhook_urls: urls.iter().map(|u| u.to_string()).collect(),
            event_whitelist: vec![],
            event_blacklist: vec![],
        })
    }

    #[test]
    fn test_invalid_urls_are_filtered() {
        let channel = channel_with_urls(&[
            "https://chat.example.com/hook",
            "not a url",
            "ftp://chat.example.com/hook",
        ]);
        assert_eq!(channel.valid_urls(), vec!["https://chat.example.com/hook"]);
    }

    #[tokio::test]
    async fn test_suppressed_event_is_a_silent_success() {
        let channel = WebhookChannel::new(WebhookChannelConfig {
            // Unreachable on purpose: a suppressed event must not touch it.
            webhook_urls: vec!["https://chat.invalid/hook".to_string()],
            event_whitelist: vec![],
            event_blacklist: vec!["agent_installed".to_string()],
        });
        channel
            .notify(Event::AgentInstalled, "hello")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_no_urls_is_a_no_op() {
        let channel = channel_with_urls(&[]);
        channel
            .notify(Event::ReplicationDone, "hello")
            .await
            .unwrap();
    }
}
