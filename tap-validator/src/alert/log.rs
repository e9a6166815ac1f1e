use async_trait::async_trait;
use tracing::info;

use super::Alerter;
use crate::error::Result;

/// Writes the notification to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogAlerter;

#[async_trait]
impl Alerter for LogAlerter {
    async fn send_alert(&self, message: &str, destination: &str) -> Result<()> {
        info!(destination = %destination, "{message}");
        Ok(())
    }
}
