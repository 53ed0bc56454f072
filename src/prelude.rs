//! Prelude module for Drive Fetcher Library
//!
//! This module re-exports the most commonly used items from the library,
//! so typical usage needs a single `use drive_fetcher::prelude::*;` statement.
//!
//! # Usage
//!
//! ```rust,no_run
//! use drive_fetcher::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let fetcher = DriveFetcher::new(ClientConfig::default());
//!     let files = fetch_datasets(&fetcher, &Dataset::defaults(), &FetchOptions::default()).await?;
//!     println!("{} files", files.len());
//!     Ok(())
//! }
//! ```

// Core result types
pub use crate::errors::{AppError, Result};

// Fetching
pub use crate::app::{
    fetch_datasets, ClientConfig, Dataset, DriveFetcher, DriveFolder, FetchOptions, FolderFetcher,
    FolderId,
};

// Configuration
pub use crate::config::AppConfig;

// Commonly used constants
pub use crate::constants::{COMMODITIES_URL, MACRO_URL, USER_AGENT};

// Standard library re-exports that are commonly needed
pub use std::path::{Path, PathBuf};

pub use tokio;
