//! File download operations with atomic writes and streaming
//!
//! This module resolves a Drive file ID to its body (following confirmation
//! pages), streams the body into a temporary `.part` file and renames it onto
//! the destination once complete.

use std::path::{Path, PathBuf};

use futures::StreamExt;
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::{Response, StatusCode};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use url::Url;

use crate::app::client::confirmation::{confirmation_url, ConfirmationFailure};
use crate::app::client::http::HttpHandler;
use crate::app::progress::FileProgress;
use crate::constants::{drive, files};
use crate::errors::{DownloadError, DownloadResult};

/// File download operations handler
pub struct DownloadHandler<'a> {
    http_handler: &'a HttpHandler,
    base_url: &'a Url,
}

impl<'a> DownloadHandler<'a> {
    /// Creates a new DownloadHandler with the given HTTP handler
    pub fn new(http_handler: &'a HttpHandler, base_url: &'a Url) -> Self {
        Self {
            http_handler,
            base_url,
        }
    }

    /// Direct download URL of a file
    pub fn file_url(&self, file_id: &str) -> Url {
        let mut url = self.base_url.clone();
        url.set_path("/uc");
        url.query_pairs_mut().clear().append_pair("id", file_id);
        url
    }

    /// Resolves a file ID to the response carrying its body
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` if Drive answers with an error status, refuses
    /// the download on its confirmation page, or keeps confirming
    pub async fn open(&self, file_id: &str) -> DownloadResult<Response> {
        let mut url = self.file_url(file_id);
        let mut hops = 0;

        loop {
            let response = self.http_handler.get_response(&url).await?;
            check_status(file_id, response.status())?;

            if is_file_body(&response) {
                return Ok(response);
            }

            if hops >= drive::MAX_CONFIRMATION_HOPS {
                return Err(DownloadError::TooManyConfirmations {
                    file_id: file_id.to_string(),
                    hops,
                });
            }
            hops += 1;

            let page_url = response.url().clone();
            let page = response.text().await?;
            url = confirmation_url(&page, &page_url)
                .map_err(|failure| confirmation_error(file_id, failure))?;
            tracing::debug!("Following confirmation page for {} to {}", file_id, url);
        }
    }

    /// Downloads a file to `destination`, replacing any existing file
    ///
    /// The body is written to `<destination>.part` first and renamed into
    /// place only once fully written, so an interrupted download never leaves
    /// a truncated file under the final name.
    ///
    /// # Arguments
    ///
    /// * `file_id` - Drive ID of the file
    /// * `destination` - The path to save the file to
    /// * `progress` - Byte progress for this file
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` if resolving, streaming or the final rename fails
    pub async fn download_file(
        &self,
        file_id: &str,
        destination: &Path,
        mut progress: FileProgress,
    ) -> DownloadResult<u64> {
        let response = match self.open(file_id).await {
            Ok(response) => response,
            Err(e) => {
                progress.abandon();
                return Err(e);
            }
        };

        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let temp_path = temp_path_for(destination);
        match stream_to_file(response, &temp_path, &mut progress).await {
            Ok(bytes) => {
                tokio::fs::rename(&temp_path, destination)
                    .await
                    .map_err(|_e| DownloadError::AtomicOperationFailed {
                        temp_path: temp_path.clone(),
                        final_path: destination.to_path_buf(),
                    })?;
                progress.finish();
                tracing::info!("Successfully downloaded: {}", destination.display());
                Ok(bytes)
            }
            Err(e) => {
                progress.abandon();
                if temp_path.exists() {
                    let _ = tokio::fs::remove_file(&temp_path).await;
                }
                tracing::error!("Download of {} failed: {}", destination.display(), e);
                Err(e)
            }
        }
    }
}

async fn stream_to_file(
    response: Response,
    temp_path: &Path,
    progress: &mut FileProgress,
) -> DownloadResult<u64> {
    let mut file = File::create(temp_path).await?;
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        progress.advance(chunk.len() as u64);
    }
    file.flush().await?;

    Ok(progress.bytes())
}

/// Temporary sibling path used while a download is in flight
pub fn temp_path_for(destination: &Path) -> PathBuf {
    let mut name = destination.as_os_str().to_os_string();
    name.push(files::TEMP_FILE_SUFFIX);
    PathBuf::from(name)
}

fn is_file_body(response: &Response) -> bool {
    if response.headers().contains_key(CONTENT_DISPOSITION) {
        return true;
    }
    let is_html = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.starts_with("text/html"))
        .unwrap_or(false);
    !is_html
}

fn check_status(file_id: &str, status: StatusCode) -> DownloadResult<()> {
    match status {
        status if status.is_success() => Ok(()),
        StatusCode::NOT_FOUND => Err(DownloadError::NotFound {
            file_id: file_id.to_string(),
        }),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(DownloadError::Forbidden {
            file_id: file_id.to_string(),
        }),
        StatusCode::TOO_MANY_REQUESTS => Err(DownloadError::RateLimited {
            file_id: file_id.to_string(),
        }),
        status => Err(DownloadError::ServerError {
            status: status.as_u16(),
        }),
    }
}

fn confirmation_error(file_id: &str, failure: ConfirmationFailure) -> DownloadError {
    match failure {
        ConfirmationFailure::QuotaExceeded(message) => DownloadError::QuotaExceeded {
            file_id: file_id.to_string(),
            message,
        },
        ConfirmationFailure::Refused(reason) => DownloadError::ConfirmationUnavailable {
            file_id: file_id.to_string(),
            reason,
        },
        ConfirmationFailure::NoDownloadLink => DownloadError::ConfirmationUnavailable {
            file_id: file_id.to_string(),
            reason: "the file may need to be shared with 'Anyone with the link', or has had too many accesses"
                .to_string(),
        },
        ConfirmationFailure::InvalidUrl { url, error } => DownloadError::InvalidUrl { url, error },
    }
}
