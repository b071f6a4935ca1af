//! Integration test for live webhook delivery.
//!
//! Requires a reachable webhook URL in `WM_TEST_WEBHOOK_URL`. Run with:
//!
//! ```bash
//! WM_TEST_WEBHOOK_URL="https://chat.example.com/hook" \
//!   cargo test -p wavemill-notify --test integration -- --ignored --nocapture
//! ```

use std::sync::Arc;

use wavemill_common::config::WebhookChannelConfig;
use wavemill_notify::webhook::WebhookChannel;
use wavemill_notify::{ChannelBag, Event, Notifier};

#[tokio::test]
#[ignore]
async fn test_real_webhook_delivery() {
    let url = std::env::var("WM_TEST_WEBHOOK_URL")
        .expect("WM_TEST_WEBHOOK_URL must be set for this test");

    let mut bag = ChannelBag::new();
    bag.add(Arc::new(WebhookChannel::new(WebhookChannelConfig {
        webhook_urls: vec![url],
        event_whitelist: vec![],
        event_blacklist: vec![],
    })));

    let notifier = Notifier::from_parts(bag, vec!["webhook".to_string()]);
    let summary = notifier
        .notify(Event::TestTargetsReady, "wavemill integration test message")
        .await;

    assert_eq!(summary.dispatched, 1);
    assert_eq!(summary.failed, 0);
}
