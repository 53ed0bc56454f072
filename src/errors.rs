//! Error types for Drive Fetcher
//!
//! This module defines the error types for all components of the application.
//! Each failure the fetcher can hit (missing folder, denied access, network,
//! rate limiting, disk writes) surfaces as its own variant so callers can
//! report it precisely.

use std::path::PathBuf;
use thiserror::Error;

/// Folder identification and listing errors
#[derive(Error, Debug)]
pub enum FolderError {
    /// Identifier is neither a Drive folder URL nor a bare ID
    #[error("Invalid folder identifier '{input}': {reason}")]
    InvalidIdentifier { input: String, reason: String },

    /// HTTP request failed while retrieving the folder page
    #[error("HTTP request failed while retrieving folder")]
    Http(#[from] reqwest::Error),

    /// Folder does not exist (HTTP 404)
    #[error("Folder not found: {folder_id}")]
    NotFound { folder_id: String },

    /// Folder exists but the session may not read it
    #[error("Access denied to folder {folder_id} (HTTP {status})")]
    AccessDenied { folder_id: String, status: u16 },

    /// Drive answered with HTTP 429
    #[error("Rate limited by Google Drive while listing folder {folder_id}")]
    RateLimited { folder_id: String },

    /// Server returned an unexpected error status
    #[error("Server error while listing folder: HTTP {status}")]
    ServerError { status: u16 },

    /// Folder page carried no listing data
    #[error(
        "Cannot retrieve the contents of folder {folder_id}. Its sharing may need to be 'Anyone with the link', or it has had too many accesses"
    )]
    ContentsUnavailable { folder_id: String },

    /// Listing data was present but could not be decoded
    #[error("Malformed folder listing: {reason}")]
    MalformedListing { reason: String },

    /// Listing JSON failed to parse
    #[error("Folder listing is not valid JSON")]
    Json(#[from] serde_json::Error),

    /// Folder name could not be read from the page title
    #[error("Folder name cannot be extracted from page title: '{title}'")]
    NameUnavailable { title: String },

    /// Folder listing hit the embedded-page entry limit
    #[error(
        "Folder {folder_id} has {limit} or more entries and Google Drive only lists {limit}. Pass --remaining-ok to download the listed ones"
    )]
    TooManyFiles { folder_id: String, limit: usize },
}

/// File download errors
#[derive(Error, Debug)]
pub enum DownloadError {
    /// HTTP request error
    #[error("HTTP request failed")]
    Http(#[from] reqwest::Error),

    /// File does not exist (HTTP 404)
    #[error("File not found: {file_id}")]
    NotFound { file_id: String },

    /// File may not be read by this session
    #[error("Access denied to file {file_id}")]
    Forbidden { file_id: String },

    /// Drive answered with HTTP 429
    #[error("Rate limited by Google Drive while downloading {file_id}")]
    RateLimited { file_id: String },

    /// Drive refused the download because its quota is exhausted
    #[error("Download quota exceeded for file {file_id}: {message}")]
    QuotaExceeded { file_id: String, message: String },

    /// Server returned an unexpected error status
    #[error("Server error: HTTP {status}")]
    ServerError { status: u16 },

    /// Confirmation page did not reveal a download URL
    #[error("Cannot retrieve the download link for file {file_id}: {reason}")]
    ConfirmationUnavailable { file_id: String, reason: String },

    /// Drive kept answering with confirmation pages
    #[error("Gave up on file {file_id} after {hops} confirmation pages")]
    TooManyConfirmations { file_id: String, hops: usize },

    /// Invalid URL found on a confirmation page
    #[error("Invalid URL: {url} - {error}")]
    InvalidUrl { url: String, error: String },

    /// I/O error during file operations
    #[error("File I/O error")]
    Io(#[from] std::io::Error),

    /// Atomic file operation failed
    #[error(
        "Atomic file operation failed: could not rename {} to {}",
        .temp_path.display(),
        .final_path.display()
    )]
    AtomicOperationFailed {
        temp_path: PathBuf,
        final_path: PathBuf,
    },
}

/// Browser cookie file errors
#[derive(Error, Debug)]
pub enum CookieError {
    /// Cookie file could not be read
    #[error("Failed to read cookie file {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A line of the cookie file is not in Netscape format
    #[error("Invalid cookie at {}:{line}: {reason}", .path.display())]
    InvalidLine {
        path: PathBuf,
        line: usize,
        reason: String,
    },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {}", .path.display())]
    NotFound { path: PathBuf },

    /// Configuration file could not be read
    #[error("Failed to read configuration file {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration format
    #[error("Invalid configuration format")]
    InvalidFormat(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration value for {field}: {value}. {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Progress reporting errors
#[derive(Error, Debug)]
pub enum ProgressError {
    /// Progress bar template rejected by indicatif
    #[error("Progress bar template error: {reason}")]
    Template { reason: String },
}

/// Coarse failure classes reported to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Input could not be understood
    InvalidInput,
    /// Remote folder or file does not exist
    NotFound,
    /// Remote folder or file is not shared with this session
    AccessDenied,
    /// Connection or transport failure
    Network,
    /// Rate limiting or download quota exhaustion
    RateLimited,
    /// Local filesystem failure
    Disk,
    /// Anything else
    Other,
}

impl FailureKind {
    /// What the user can do about this class of failure
    pub fn hint(self) -> Option<&'static str> {
        match self {
            FailureKind::InvalidInput => {
                Some("Check the folder identifiers and the configuration file")
            }
            FailureKind::NotFound => Some("Check that the folder or file still exists"),
            FailureKind::AccessDenied => Some(
                "Share the folder as \"Anyone with the link\" or retry with --use-cookies",
            ),
            FailureKind::Network => Some("Check the network connection and retry"),
            FailureKind::RateLimited => Some("Google Drive is throttling requests; retry later"),
            FailureKind::Disk => Some("Check that the destination directory is writable"),
            FailureKind::Other => None,
        }
    }
}

/// Top-level application error that can represent any error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Folder identification or listing error
    #[error(transparent)]
    Folder(#[from] FolderError),

    /// Download error
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// Cookie file error
    #[error(transparent)]
    Cookies(#[from] CookieError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Progress error
    #[error(transparent)]
    Progress(#[from] ProgressError),

    /// HTTP client could not be built
    #[error("HTTP client error")]
    Http(#[from] reqwest::Error),

    /// Generic I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Check if the error is recoverable (transient)
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AppError::Folder(FolderError::Http(_))
                | AppError::Folder(FolderError::RateLimited { .. })
                | AppError::Folder(FolderError::ServerError { .. })
                | AppError::Download(DownloadError::Http(_))
                | AppError::Download(DownloadError::RateLimited { .. })
                | AppError::Download(DownloadError::QuotaExceeded { .. })
                | AppError::Download(DownloadError::ServerError { .. })
        )
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Folder(_) => "folder",
            AppError::Download(_) => "download",
            AppError::Cookies(_) => "cookies",
            AppError::Config(_) => "config",
            AppError::Progress(_) => "progress",
            AppError::Http(_) => "http",
            AppError::Io(_) => "io",
        }
    }

    /// Classify the failure
    pub fn kind(&self) -> FailureKind {
        match self {
            AppError::Folder(e) => match e {
                FolderError::InvalidIdentifier { .. } => FailureKind::InvalidInput,
                FolderError::NotFound { .. } => FailureKind::NotFound,
                FolderError::AccessDenied { .. } | FolderError::ContentsUnavailable { .. } => {
                    FailureKind::AccessDenied
                }
                FolderError::Http(_) => FailureKind::Network,
                FolderError::RateLimited { .. } => FailureKind::RateLimited,
                _ => FailureKind::Other,
            },
            AppError::Download(e) => match e {
                DownloadError::NotFound { .. } => FailureKind::NotFound,
                DownloadError::Forbidden { .. } | DownloadError::ConfirmationUnavailable { .. } => {
                    FailureKind::AccessDenied
                }
                DownloadError::Http(_) => FailureKind::Network,
                DownloadError::RateLimited { .. } | DownloadError::QuotaExceeded { .. } => {
                    FailureKind::RateLimited
                }
                DownloadError::Io(_) | DownloadError::AtomicOperationFailed { .. } => {
                    FailureKind::Disk
                }
                _ => FailureKind::Other,
            },
            AppError::Cookies(_) | AppError::Config(_) => FailureKind::InvalidInput,
            AppError::Http(_) => FailureKind::Network,
            AppError::Io(_) => FailureKind::Disk,
            AppError::Progress(_) => FailureKind::Other,
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;

/// Folder result type alias
pub type FolderResult<T> = std::result::Result<T, FolderError>;

/// Download result type alias
pub type DownloadResult<T> = std::result::Result<T, DownloadError>;

/// Cookie result type alias
pub type CookieResult<T> = std::result::Result<T, CookieError>;

/// Configuration result type alias
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
