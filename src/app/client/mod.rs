//! HTTP client implementation for Google Drive interaction
//!
//! This module provides the client a fetch uses to list shared folders and
//! download their files.
//!
//! The module is organized into specialized components:
//! - `config`: HTTP client configuration and building
//! - `http`: Core HTTP operations
//! - `listing`: Folder page retrieval and listing decoding
//! - `confirmation`: Download confirmation page parsing
//! - `download`: File download operations with atomic writes

use std::path::Path;
use std::sync::Arc;

use reqwest::cookie::Jar;
use url::Url;

use crate::app::models::{DriveFolder, FolderId};
use crate::app::progress::{FetchProgress, FileProgress};
use crate::auth::cookies;
use crate::errors::{DownloadResult, FolderResult, Result};

// Module declarations
pub mod config;
pub mod confirmation;
pub mod download;
pub mod http;
pub mod listing;

pub use config::ClientConfig;

use download::DownloadHandler;
use http::HttpHandler;
use listing::ListingHandler;

/// HTTP client for interacting with Google Drive
///
/// One client is one session: cookies Drive sets while confirming downloads
/// are kept for the lifetime of the client.
#[derive(Debug)]
pub struct DriveClient {
    http_handler: HttpHandler,
    base_url: Url,
}

impl DriveClient {
    /// Creates a new DriveClient
    ///
    /// # Arguments
    ///
    /// * `config` - Client configuration settings
    /// * `use_cookies` - Seed the session with the persisted browser cookies
    ///
    /// # Errors
    ///
    /// Returns `AppError` if the cookie file is malformed, the base URL is
    /// invalid or the HTTP client cannot be built
    pub fn new(config: &ClientConfig, use_cookies: bool) -> Result<Self> {
        let jar = Arc::new(Jar::default());

        if use_cookies {
            match cookies::cookie_file_path(config.cookies_file.as_deref()) {
                Some(path) => {
                    let loaded = cookies::load_into(&jar, &path)?;
                    tracing::debug!("Loaded {} cookies from {}", loaded, path.display());
                }
                None => tracing::debug!("No cookie file location available"),
            }
        }

        Self::with_cookie_jar(config, jar)
    }

    /// Creates a new DriveClient around an existing cookie jar
    ///
    /// # Errors
    ///
    /// Returns `AppError` if the base URL is invalid or the HTTP client cannot be built
    pub fn with_cookie_jar(config: &ClientConfig, jar: Arc<Jar>) -> Result<Self> {
        let base_url = config.parsed_base_url()?;
        let client = config.build_http_client(jar)?;

        tracing::debug!("Created Drive client for {}", base_url);

        Ok(Self {
            http_handler: HttpHandler::new(client),
            base_url,
        })
    }

    /// Lists a folder recursively
    ///
    /// # Errors
    ///
    /// Returns `FolderError` if any folder page cannot be fetched or decoded
    pub async fn list_folder(
        &self,
        folder_id: &FolderId,
        remaining_ok: bool,
        progress: &FetchProgress,
    ) -> FolderResult<DriveFolder> {
        ListingHandler::new(&self.http_handler, &self.base_url)
            .list(folder_id, remaining_ok, progress)
            .await
    }

    /// Downloads one file, replacing `destination` if it exists
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` if the file cannot be resolved, fetched or written
    pub async fn download_file(
        &self,
        file_id: &str,
        destination: &Path,
        progress: FileProgress,
    ) -> DownloadResult<u64> {
        DownloadHandler::new(&self.http_handler, &self.base_url)
            .download_file(file_id, destination, progress)
            .await
    }

    /// Get the Drive base URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}
