//! Multi-channel notification dispatcher.
//!
//! Fans a single logical migration event out to a set of independently
//! configured delivery channels (chat webhook, SMTP email, no-op), applies
//! per-channel allow/deny-list filtering, dispatches deliveries concurrently,
//! and waits for all of them to finish before returning. No retries, no
//! persistence, no ordering guarantees.

pub mod channel;
pub mod decider;
pub mod dispatcher;
pub mod email;
pub mod event;
pub mod null;
pub mod webhook;

pub use channel::{Channel, ChannelBag};
pub use decider::SendEventDecider;
pub use dispatcher::Notifier;
pub use event::Event;
