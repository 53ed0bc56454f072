//! HTTP client configuration and building logic
//!
//! This module handles the configuration and construction of HTTP clients
//! for Google Drive interaction.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::Jar;
use reqwest::redirect::Policy;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::constants::{drive, http};
use crate::errors::{ConfigError, ConfigResult};

/// Configuration for the Drive HTTP client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Drive web base URL (overridable to point at a mirror or a test server)
    pub base_url: String,
    /// User agent sent with every request
    pub user_agent: String,
    /// Request timeout
    pub request_timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
    /// Maximum redirects followed per request
    pub max_redirects: usize,
    /// Browser cookie file used when cookies are enabled (None = default location)
    pub cookies_file: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: drive::BASE_URL.to_string(),
            user_agent: http::USER_AGENT.to_string(),
            request_timeout: http::DEFAULT_TIMEOUT,
            connect_timeout: http::CONNECT_TIMEOUT,
            max_redirects: http::MAX_REDIRECTS,
            cookies_file: None,
        }
    }
}

impl ClientConfig {
    /// Builds the HTTP client around a cookie jar
    ///
    /// The jar always exists: Drive sets a download-warning cookie on its
    /// confirmation pages that must be sent back within the same session.
    pub fn build_http_client(&self, jar: Arc<Jar>) -> reqwest::Result<Client> {
        Client::builder()
            .cookie_provider(jar)
            .timeout(self.request_timeout)
            .connect_timeout(self.connect_timeout)
            .user_agent(self.user_agent.as_str())
            .redirect(Policy::limited(self.max_redirects))
            .build()
    }

    /// Parses the configured base URL
    pub fn parsed_base_url(&self) -> ConfigResult<Url> {
        Url::parse(&self.base_url).map_err(|e| ConfigError::InvalidValue {
            field: "client.base_url".to_string(),
            value: self.base_url.clone(),
            reason: e.to_string(),
        })
    }
}
