//! Notification channels for validation runs that did not succeed.
//!
//! A channel is picked by name (see [`AlertStrategy`]) and used through the
//! [`Alerter`] trait. Unknown names fall back to logging, so a misspelled
//! channel still leaves a trace of the failure.

mod email;
mod log;
mod slack;

pub use email::EmailAlerter;
pub use log::LogAlerter;
pub use slack::SlackAlerter;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::config::ValidatorConfig;
use crate::error::{Result, TapError};

/// Delivers a notification message.
#[async_trait]
pub trait Alerter: Send + Sync {
    /// Sends `message` to `destination`. What a destination is depends on the
    /// channel: a webhook URL, a mail address, or a label for the log line.
    async fn send_alert(&self, message: &str, destination: &str) -> Result<()>;
}

/// The available notification channels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlertStrategy {
    Slack,
    Email,
    #[default]
    Log,
}

impl AlertStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertStrategy::Slack => "SLACK",
            AlertStrategy::Email => "EMAIL",
            AlertStrategy::Log => "LOG",
        }
    }

    /// Builds the alerter for this channel.
    ///
    /// Email needs the `[email]` settings; without them this is a
    /// configuration error.
    pub fn alerter(&self, config: &ValidatorConfig) -> Result<Arc<dyn Alerter>> {
        Ok(match self {
            AlertStrategy::Slack => Arc::new(SlackAlerter::new(config.http_timeout())?),
            AlertStrategy::Email => {
                let settings = config.email().cloned().ok_or_else(|| {
                    TapError::Configuration(
                        "EMAIL notifications need an [email] section in the settings".to_string(),
                    )
                })?;
                Arc::new(EmailAlerter::new(settings))
            }
            AlertStrategy::Log => Arc::new(LogAlerter),
        })
    }
}

/// Parses a channel name case-insensitively. Anything unknown is
/// [`AlertStrategy::Log`].
impl FromStr for AlertStrategy {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_uppercase().as_str() {
            "SLACK" => AlertStrategy::Slack,
            "EMAIL" => AlertStrategy::Email,
            _ => AlertStrategy::Log,
        })
    }
}

impl fmt::Display for AlertStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
