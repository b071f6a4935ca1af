use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use wavemill_common::error::AppError;

use crate::event::Event;

/// Capability trait for anything that can deliver a notification.
///
/// Implementations decide internally whether to deliver (via their
/// [`crate::decider::SendEventDecider`]) and to whom. A returned error means
/// the delivery failed; the dispatcher logs it and carries on with the other
/// channels.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Stable channel name used in the `enabled` config list.
    fn name(&self) -> &'static str;

    /// Deliver `message` for `event`.
    async fn notify(&self, event: Event, message: &str) -> Result<(), AppError>;
}

/// Registry of all available channels, keyed by name.
#[derive(Default)]
pub struct ChannelBag {
    channels: BTreeMap<&'static str, Arc<dyn Channel>>,
}

impl ChannelBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, channel: Arc<dyn Channel>) {
        self.channels.insert(channel.name(), channel);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Channel>> {
        self.channels.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Arc<dyn Channel>)> {
        self.channels.iter().map(|(name, channel)| (*name, channel))
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

impl std::fmt::Debug for ChannelBag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelBag")
            .field("channels", &self.channels.keys().collect::<Vec<_>>())
            .finish()
    }
}
