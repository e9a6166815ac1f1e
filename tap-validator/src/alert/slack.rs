use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

use super::Alerter;
use crate::error::{Result, TapError};

const CHANNEL: &str = "slack";

#[derive(Serialize)]
struct SlackPayload<'a> {
    text: &'a str,
}

/// Posts notifications to a Slack incoming webhook.
pub struct SlackAlerter {
    client: reqwest::Client,
}

impl SlackAlerter {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TapError::Configuration(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Alerter for SlackAlerter {
    /// `destination` is the webhook URL.
    async fn send_alert(&self, message: &str, destination: &str) -> Result<()> {
        if destination.is_empty() {
            return Err(TapError::alert(CHANNEL, "No webhook URL given"));
        }

        let response = self
            .client
            .post(destination)
            .json(&SlackPayload { text: message })
            .send()
            .await
            .map_err(|e| TapError::alert(CHANNEL, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TapError::alert(
                CHANNEL,
                format!("Webhook returned status {status}: {body}"),
            ));
        }

        debug!(status = status.as_u16(), "Slack notification delivered");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Accepts one request, answers with `status_line` and returns the raw
    /// request.
    async fn one_shot_server(status_line: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/hook", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                request.extend_from_slice(&buf[..n]);
                if n == 0 || request.ends_with(b"}") {
                    break;
                }
            }
            let response = format!("HTTP/1.1 {status_line}\r\ncontent-length: 2\r\nconnection: close\r\n\r\nok");
            socket.write_all(response.as_bytes()).await.unwrap();
            String::from_utf8_lossy(&request).into_owned()
        });
        (url, handle)
    }

    #[tokio::test]
    async fn test_posts_text_payload() {
        let (url, server) = one_shot_server("200 OK").await;
        let alerter = SlackAlerter::new(Duration::from_secs(5)).unwrap();

        alerter.send_alert("Service down", &url).await.unwrap();

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /hook"));
        assert!(request.contains(r#"{"text":"Service down"}"#));
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let (url, _server) = one_shot_server("500 Internal Server Error").await;
        let alerter = SlackAlerter::new(Duration::from_secs(5)).unwrap();

        let err = alerter.send_alert("Service down", &url).await.unwrap_err();
        assert!(matches!(err, TapError::Alert { .. }));
        assert!(err.to_string().contains("500"));
    }

    #[tokio::test]
    async fn test_missing_destination() {
        let alerter = SlackAlerter::new(Duration::from_secs(5)).unwrap();
        let err = alerter.send_alert("Service down", "").await.unwrap_err();
        assert!(matches!(err, TapError::Alert { .. }));
    }
}
