//! Configuration management for Drive Fetcher
//!
//! Every setting has a default, so the application runs without any
//! configuration file. A TOML file can override the HTTP client, the fetch
//! options, the list of datasets and the log level.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::app::{ClientConfig, Dataset, FetchOptions, FolderId};
use crate::constants::{datasets, drive, http, logging};
use crate::errors::{ConfigError, ConfigResult};

const VALID_LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

/// Unified application configuration for TOML serialization
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP client settings
    pub client: ClientConfigToml,
    /// Default fetch options
    pub fetch: FetchConfigToml,
    /// Folders fetched when no identifier is given
    pub datasets: Vec<Dataset>,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            client: ClientConfigToml::default(),
            fetch: FetchConfigToml::default(),
            datasets: Dataset::defaults(),
            logging: LoggingConfig::default(),
        }
    }
}

/// TOML-friendly client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfigToml {
    /// Drive web base URL
    pub base_url: String,
    /// User agent sent with every request
    pub user_agent: String,
    /// Request timeout, e.g. "5m"
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    /// Connect timeout, e.g. "30s"
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
    /// Maximum redirects followed per request
    pub max_redirects: usize,
    /// Browser cookie file (None = default location)
    pub cookies_file: Option<PathBuf>,
}

impl Default for ClientConfigToml {
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

/// TOML-friendly fetch defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfigToml {
    /// Suppress progress output
    pub quiet: bool,
    /// Use the persisted browser cookies
    pub use_cookies: bool,
    /// Accept folders truncated at the listing limit
    pub remaining_ok: bool,
    /// Destination root (None = working directory)
    pub output: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level used when no verbosity flag is given
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: logging::DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration
    ///
    /// An explicit path must exist. Without one, the first file found in the
    /// standard locations is used, falling back to defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file is missing, unreadable, malformed or
    /// holds invalid values
    pub async fn load(config_file_override: Option<PathBuf>) -> ConfigResult<Self> {
        let config_path = match config_file_override {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound { path });
                }
                Some(path)
            }
            None => Self::find_config_file(),
        };

        let config = match config_path {
            Some(path) => Self::load_from_file(&path).await?,
            None => {
                debug!("No config file found, using defaults");
                Self::default()
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let mut search_paths = vec![PathBuf::from("./drive-fetcher.toml")];
        if let Some(path) = Self::default_config_path() {
            search_paths.push(path);
        }

        search_paths.into_iter().find(|path| {
            let exists = path.exists();
            if exists {
                debug!("Found config file: {}", path.display());
            }
            exists
        })
    }

    /// User config file location
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("drive-fetcher").join("config.toml"))
    }

    /// Load configuration from a TOML file
    async fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        let config: AppConfig = toml::from_str(&content)?;

        info!("Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Check values serde cannot
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the offending field
    pub fn validate(&self) -> ConfigResult<()> {
        self.to_client_config().parsed_base_url()?;

        if self.client.request_timeout.is_zero() {
            return Err(invalid_value("client.request_timeout", "0s", "must be positive"));
        }
        if self.client.connect_timeout.is_zero() {
            return Err(invalid_value("client.connect_timeout", "0s", "must be positive"));
        }

        for dataset in &self.datasets {
            if let Err(e) = FolderId::parse(&dataset.folder) {
                return Err(invalid_value(
                    &format!("datasets.{}.folder", dataset.name),
                    &dataset.folder,
                    &e.to_string(),
                ));
            }
        }

        if !VALID_LOG_LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(invalid_value(
                "logging.level",
                &self.logging.level,
                "expected one of error, warn, info, debug, trace",
            ));
        }

        Ok(())
    }

    /// Configured log level, the default level when it does not parse
    pub fn log_level(&self) -> tracing::Level {
        self.logging
            .level
            .parse()
            .unwrap_or_else(|_| default_log_level())
    }

    /// Runtime HTTP client configuration
    pub fn to_client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.client.base_url.clone(),
            user_agent: self.client.user_agent.clone(),
            request_timeout: self.client.request_timeout,
            connect_timeout: self.client.connect_timeout,
            max_redirects: self.client.max_redirects,
            cookies_file: self.client.cookies_file.clone(),
        }
    }

    /// Fetch options before command-line overrides
    pub fn to_fetch_options(&self) -> FetchOptions {
        FetchOptions {
            quiet: self.fetch.quiet,
            use_cookies: self.fetch.use_cookies,
            output: self.fetch.output.clone(),
            remaining_ok: self.fetch.remaining_ok,
            dry_run: false,
        }
    }

    /// Default configuration file content with comments
    pub fn generate_default_config_content() -> String {
        format!(
            r#"# Drive Fetcher Configuration
# Every setting is optional; remove a line to use its default.

[client]
base_url = "{base_url}"
request_timeout = "{request_timeout}"
connect_timeout = "{connect_timeout}"
max_redirects = {max_redirects}
# Netscape cookies.txt used with --use-cookies
# cookies_file = "/path/to/cookies.txt"

[fetch]
quiet = false
use_cookies = false
remaining_ok = false
# Destination root; a trailing "/" places each folder in its own sub-directory
# output = "./data/"

[[datasets]]
name = "{commodities}"
folder = "{commodities_url}"

[[datasets]]
name = "{macro_name}"
folder = "{macro_url}"

[logging]
level = "{level}"  # error, warn, info, debug, trace
"#,
            base_url = drive::BASE_URL,
            request_timeout = humantime_serde::re::humantime::format_duration(http::DEFAULT_TIMEOUT),
            connect_timeout = humantime_serde::re::humantime::format_duration(http::CONNECT_TIMEOUT),
            max_redirects = http::MAX_REDIRECTS,
            commodities = datasets::COMMODITIES_NAME,
            commodities_url = datasets::COMMODITIES_URL,
            macro_name = datasets::MACRO_NAME,
            macro_url = datasets::MACRO_URL,
            level = logging::DEFAULT_LOG_LEVEL,
        )
    }
}

/// Level used before any configuration file is read
pub fn default_log_level() -> tracing::Level {
    logging::DEFAULT_LOG_LEVEL
        .parse()
        .unwrap_or(tracing::Level::WARN)
}

fn invalid_value(field: &str, value: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
