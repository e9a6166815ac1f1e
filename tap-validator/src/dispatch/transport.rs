use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{Result, TapError};

/// Parameters sent with every synchronous TAP query.
pub const STANDARD_PARAMS: [(&str, &str); 3] =
    [("LANG", "ADQL"), ("FORMAT", "VOTABLE"), ("REQUEST", "doQuery")];

/// Builds the parameter list of a synchronous query.
pub fn sync_query_params(query_text: &str) -> Vec<(String, String)> {
    STANDARD_PARAMS
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .chain(std::iter::once(("QUERY".to_string(), query_text.to_string())))
        .collect()
}

/// Fetches documents from a TAP service.
#[async_trait]
pub trait TapTransport: Send + Sync {
    /// Performs a GET on `url` with the given query parameters and returns the
    /// response body.
    ///
    /// TAP services report query errors inside the body, so implementations
    /// return the body for non-success HTTP statuses as well and only fail
    /// when no body could be obtained.
    async fn get(&self, url: &str, params: &[(String, String)]) -> Result<String>;
}

/// [`TapTransport`] over HTTP.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TapError::Configuration(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl TapTransport for HttpTransport {
    async fn get(&self, url: &str, params: &[(String, String)]) -> Result<String> {
        let response = self
            .client
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(|e| TapError::transport(url, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(url = %url, status = status.as_u16(), "Service answered with an error status");
        }
        let body = response
            .text()
            .await
            .map_err(|e| TapError::transport(url, e.to_string()))?;
        debug!(url = %url, bytes = body.len(), "Received response");
        Ok(body)
    }
}
