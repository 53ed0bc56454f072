//! Application constants for Drive Fetcher
//!
//! This module centralizes all constants used throughout the application,
//! organized by functional domain for maintainability and clarity.

use std::time::Duration;

/// Environment variable names
pub mod env {
    /// Overrides the location of the persisted browser cookie file
    pub const COOKIES_FILE: &str = "DRIVE_FETCHER_COOKIES";
}

/// The datasets fetched when no identifiers are given
pub mod datasets {
    /// Commodities dataset name
    pub const COMMODITIES_NAME: &str = "commodities";

    /// Commodities dataset folder
    pub const COMMODITIES_URL: &str =
        "https://drive.google.com/drive/folders/1jFZvTNlQnoFRB3WVw4cKewKW15olW95U";

    /// Macro dataset name
    pub const MACRO_NAME: &str = "macro";

    /// Macro dataset folder
    pub const MACRO_URL: &str =
        "https://drive.google.com/drive/folders/1XdGraH2g42_K-SIHXbc7k98JBiPz6jyz";
}

/// Google Drive endpoints and page markers
pub mod drive {
    /// Drive web base URL
    pub const BASE_URL: &str = "https://drive.google.com";

    /// Hosts that are accepted in folder URLs
    pub const HOSTS: &[&str] = &["drive.google.com", "docs.google.com"];

    /// MIME type Drive uses for folders
    pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

    /// Maximum number of entries an embedded folder listing carries
    pub const MAX_FOLDER_ENTRIES: usize = 50;

    /// Script variable that holds the escaped folder listing
    pub const LISTING_MARKER: &str = "_DRIVE_ivd";

    /// Separator between folder name and service name in page titles
    pub const TITLE_SEPARATOR: &str = " - ";

    /// Minimum length of a bare Drive ID
    pub const MIN_ID_LENGTH: usize = 10;

    /// Confirmation pages followed before giving up on a file
    pub const MAX_CONFIRMATION_HOPS: usize = 3;

    /// Error wording Drive uses when a file's download quota is exhausted
    pub const QUOTA_MARKER: &str = "Too many users have viewed or downloaded this file recently";
}

/// HTTP client configuration constants
pub mod http {
    use super::Duration;

    /// Desktop browser user agent, Drive serves degraded pages to unknown agents
    pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/98.0.4758.178 Safari/537.36";

    /// Default HTTP request timeout
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

    /// Connection establishment timeout
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Maximum number of redirects to follow
    pub const MAX_REDIRECTS: usize = 10;
}

/// File operation constants
pub mod files {
    /// Suffix of in-flight downloads, renamed away on completion
    pub const TEMP_FILE_SUFFIX: &str = ".part";

    /// Replacement for characters that cannot appear in a local file name
    pub const NAME_REPLACEMENT: &str = "_";

    /// Cookie file name inside the cache directory
    pub const COOKIES_FILE_NAME: &str = "cookies.txt";

    /// Application directory name under the user's cache and config dirs
    pub const APP_DIR_NAME: &str = "drive_fetcher";
}

/// Progress reporting
pub mod progress {
    use super::Duration;

    /// Spinner and bar redraw interval
    pub const TICK_INTERVAL: Duration = Duration::from_millis(120);

    /// Interval between text-mode progress lines when stdout is not a terminal
    pub const TEXT_REPORT_INTERVAL: Duration = Duration::from_secs(10);
}

/// Logging constants
pub mod logging {
    /// Default log level
    pub const DEFAULT_LOG_LEVEL: &str = "warn";
}

// Re-export commonly used constants for convenience
pub use datasets::{COMMODITIES_URL, MACRO_URL};
pub use drive::{BASE_URL as DRIVE_BASE_URL, FOLDER_MIME_TYPE, MAX_FOLDER_ENTRIES};
pub use env::COOKIES_FILE as ENV_COOKIES_FILE;
pub use http::USER_AGENT;
