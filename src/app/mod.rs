//! Core application logic for Drive Fetcher
//!
//! This module contains the Drive client, the folder data models, progress
//! reporting and the fetch orchestration built on them.
//!
//! # Examples
//!
//! ```rust,no_run
//! use drive_fetcher::app::{DriveFetcher, FetchOptions, FolderFetcher};
//!
//! # async fn example() -> drive_fetcher::Result<()> {
//! let fetcher = DriveFetcher::default();
//! let options = FetchOptions::default();
//!
//! let files = fetcher
//!     .fetch("https://drive.google.com/drive/folders/1jFZvTNlQnoFRB3WVw4cKewKW15olW95U", &options)
//!     .await?;
//! for file in files {
//!     println!("Downloaded {}", file.display());
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod fetcher;
pub mod models;
pub mod progress;

// Re-export main public API
pub use client::{ClientConfig, DriveClient};
pub use fetcher::{fetch_datasets, resolve_root, DriveFetcher, FetchOptions, FolderFetcher};
pub use models::{sanitize_name, Dataset, DriveEntry, DriveFolder, DriveNode, FolderId, PlannedEntry};
pub use progress::{FetchProgress, FileProgress};
