//! Core HTTP operations
//!
//! Every request goes out exactly once: Drive errors are classified by the
//! caller and propagated, never retried.

use reqwest::Client;
use url::Url;

/// HTTP operations handler
#[derive(Debug, Clone)]
pub struct HttpHandler {
    client: Client,
}

impl HttpHandler {
    /// Creates a new HttpHandler around a configured client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Sends a GET request and returns the response whatever its status
    ///
    /// # Errors
    ///
    /// Returns `reqwest::Error` on connection or transport failure
    pub async fn get_response(&self, url: &Url) -> reqwest::Result<reqwest::Response> {
        tracing::debug!("GET {}", url);
        let response = self.client.get(url.as_str()).send().await?;
        tracing::debug!("{} -> HTTP {}", response.url(), response.status());
        Ok(response)
    }
}
