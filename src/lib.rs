//! Drive Fetcher Library
//!
//! A Rust library for downloading publicly shared Google Drive folders,
//! preserving their folder structure on local disk.

pub mod app;
pub mod auth;
pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;
pub mod prelude;

// Re-export commonly used types for convenience
pub use errors::{AppError, Result};
