use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::debug;

use super::Alerter;
use crate::config::EmailSettings;
use crate::error::{Result, TapError};

const CHANNEL: &str = "email";
const SUBJECT: &str = "TAP validation report";

/// Mails notifications through an authenticated SMTP relay.
pub struct EmailAlerter {
    settings: EmailSettings,
}

impl EmailAlerter {
    pub fn new(settings: EmailSettings) -> Self {
        Self { settings }
    }

    fn build_message(&self, message: &str, recipient: &str) -> Result<Message> {
        let from: Mailbox = self
            .settings
            .sender()
            .parse()
            .map_err(|e| TapError::alert(CHANNEL, format!("Invalid sender address: {e}")))?;
        let to: Mailbox = recipient
            .parse()
            .map_err(|e| TapError::alert(CHANNEL, format!("Invalid recipient address: {e}")))?;

        Message::builder()
            .from(from)
            .to(to)
            .subject(SUBJECT)
            .header(ContentType::TEXT_PLAIN)
            .body(message.to_string())
            .map_err(|e| TapError::alert(CHANNEL, e.to_string()))
    }
}

#[async_trait]
impl Alerter for EmailAlerter {
    /// `destination` overrides the configured recipient when it is not empty.
    async fn send_alert(&self, message: &str, destination: &str) -> Result<()> {
        let recipient = if destination.is_empty() {
            self.settings.recipient()
        } else {
            destination
        };
        let email = self.build_message(message, recipient)?;

        let credentials = Credentials::new(
            self.settings.sender().to_string(),
            self.settings.password().expose().to_string(),
        );
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(self.settings.host())
            .map_err(|e| TapError::alert(CHANNEL, e.to_string()))?
            .credentials(credentials)
            .build();

        mailer
            .send(email)
            .await
            .map_err(|e| TapError::alert(CHANNEL, e.to_string()))?;
        debug!(recipient = %recipient, "Email notification delivered");
        Ok(())
    }
}
