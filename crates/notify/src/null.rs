use async_trait::async_trait;

use wavemill_common::error::AppError;

use crate::channel::Channel;
use crate::event::Event;

/// No-op channel that only logs the delivery. Useful as a smoke test for the
/// dispatcher wiring and as a template for new channels.
#[derive(Debug, Default)]
pub struct NullChannel;

impl NullChannel {
    pub const NAME: &'static str = "null";

    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Channel for NullChannel {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn notify(&self, event: Event, message: &str) -> Result<(), AppError> {
        tracing::debug!(event = %event, message, "Null channel delivery");
        Ok(())
    }
}
