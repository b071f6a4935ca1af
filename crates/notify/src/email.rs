//! SMTP email channel.
//!
//! Builds one message per configured recipient and sends them concurrently
//! through an async SMTP transport.

use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tokio::task::JoinSet;

use async_trait::async_trait;

use wavemill_common::config::EmailChannelConfig;
use wavemill_common::error::AppError;

use crate::channel::Channel;
use crate::decider::SendEventDecider;
use crate::event::Event;

/// Channel delivering notifications over SMTP.
pub struct EmailChannel {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    recipients: Vec<Mailbox>,
    decider: SendEventDecider,
}

impl EmailChannel {
    pub const NAME: &'static str = "email";

    pub fn new(config: EmailChannelConfig) -> Result<Self, AppError> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .map_err(|e| AppError::Config(format!("SMTP relay '{}': {e}", config.smtp_host)))?
            .port(config.smtp_port);

        if let (Some(username), Some(password)) = (&config.smtp_username, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        let from: Mailbox = config
            .from
            .parse()
            .map_err(|e| AppError::Config(format!("Invalid 'from' address '{}': {e}", config.from)))?;

        let recipients = config
            .recipients
            .iter()
            .map(|raw| {
                raw.parse::<Mailbox>()
                    .map_err(|e| AppError::Config(format!("Invalid recipient '{raw}': {e}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            transport: builder.build(),
            from,
            recipients,
            decider: SendEventDecider::new(config.event_whitelist, config.event_blacklist),
        })
    }

    fn subject(event: Event) -> String {
        format!("[wavemill] {event}")
    }

    fn build_message(&self, recipient: &Mailbox, event: Event, message: &str) -> Result<Message, AppError> {
        Message::builder()
            .from(self.from.clone())
            .to(recipient.clone())
            .subject(Self::subject(event))
            .body(message.to_string())
            .map_err(|e| AppError::Notify(format!("building email for '{recipient}' failed: {e}")))
    }
}

#[async_trait]
impl Channel for EmailChannel {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn notify(&self, event: Event, message: &str) -> Result<(), AppError> {
        if !self.decider.should_send(&event.to_string()) {
            return Ok(());
        }

        // Build everything first; one recipient's bad message must not keep
        // the others from being sent.
        let mut failed = 0usize;
        let mut deliveries = JoinSet::new();
        for recipient in &self.recipients {
            let email = match self.build_message(recipient, event, message) {
                Ok(email) => email,
                Err(e) => {
                    failed += 1;
                    tracing::error!(recipient = %recipient, event = %event, error = %e, "Building email failed");
                    continue;
                }
            };

            let transport = self.transport.clone();
            let recipient = recipient.to_string();
            deliveries.spawn(async move {
                let result = transport.send(email).await;
                (recipient, result)
            });
        }
        while let Some(joined) = deliveries.join_next().await {
            let (recipient, result) = joined
                .map_err(|e| AppError::Notify(format!("email delivery task panicked: {e}")))?;
            match result {
                Ok(_) => tracing::debug!(recipient = %recipient, event = %event, "Email delivered"),
                Err(e) => {
                    failed += 1;
                    tracing::error!(recipient = %recipient, event = %event, error = %e, "Email delivery failed");
                }
            }
        }

        if failed > 0 {
            return Err(AppError::Notify(format!(
                "{failed} email delivery(ies) failed for event '{event}'"
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> EmailChannelConfig {
        EmailChannelConfig {
            smtp_host: "smtp.example.com".to_string(),
            smtp_port: 587,
            smtp_username: Some("mailer".to_string()),
            smtp_password: Some("secret".to_string()),
            from: "Wavemill <wavemill@example.com>".to_string(),
            recipients: vec!["ops@example.com".to_string()],
            event_whitelist: vec![],
            event_blacklist: vec![],
        }
    }

    #[test]
    fn test_channel_builds_from_config() {
        let channel = EmailChannel::new(config()).unwrap();
        assert_eq!(channel.name(), "email");
        assert_eq!(channel.recipients.len(), 1);
    }

    #[test]
    fn test_invalid_from_address_is_rejected() {
        let mut config = config();
        config.from = "not-an-address".to_string();
        assert!(matches!(
            EmailChannel::new(config),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_builds_one_message_per_recipient() {
        let mut config = config();
        config.recipients = vec![
            "ops@example.com".to_string(),
            "Wave Lead <lead@example.com>".to_string(),
        ];
        let channel = EmailChannel::new(config).unwrap();

        for recipient in &channel.recipients {
            channel
                .build_message(recipient, Event::ReplicationDone, "réplication terminée")
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_suppressed_event_is_a_silent_success() {
        let mut config = config();
        config.event_whitelist = vec!["cutover_targets_ready".to_string()];
        let channel = EmailChannel::new(config).unwrap();
        channel
            .notify(Event::AgentInstalled, "hello")
            .await
            .unwrap();
    }
}
