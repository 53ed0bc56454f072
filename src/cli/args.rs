//! Command-line argument parsing for Drive Fetcher
//!
//! This module defines the CLI structure using clap derive macros. Run with
//! no arguments the tool fetches the configured datasets; subcommands fetch
//! or list explicit folders.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::app::FetchOptions;

/// Drive Fetcher - Download shared Google Drive folders
#[derive(Parser, Debug)]
#[command(
    name = "drive_fetcher",
    version,
    about = "Download the commodities and macro datasets from Google Drive",
    long_about = "Downloads every file of publicly shared Google Drive folders, keeping the folder structure.
Without a subcommand the configured datasets (commodities and macro by default) are fetched in order."
)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Fetch options
    #[command(flatten)]
    pub fetch: FetchArgs,

    /// Subcommands
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Global arguments available to all subcommands
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Very verbose logging (debug level)
    #[arg(long, global = true)]
    pub very_verbose: bool,

    /// Quiet mode - suppress progress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Options applied to every fetched folder
#[derive(Args, Debug, Clone, Default)]
pub struct FetchArgs {
    /// Authenticate with the browser cookies in the cookie file
    #[arg(long, global = true)]
    pub use_cookies: bool,

    /// Destination directory; a trailing "/" places each folder in its own sub-directory
    #[arg(short, long, global = true, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Accept folders whose listing stops at 50 entries
    #[arg(long, global = true)]
    pub remaining_ok: bool,

    /// List the files that would be written without downloading
    #[arg(long, global = true)]
    pub dry_run: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch explicit folders instead of the configured datasets
    Fetch {
        /// Folder URLs or IDs
        #[arg(required = true, value_name = "IDENTIFIER")]
        folders: Vec<String>,
    },

    /// Print the remote tree of a folder without downloading
    List {
        /// Folder URL or ID
        #[arg(value_name = "IDENTIFIER")]
        folder: String,
    },

    /// Print a default configuration file
    Config,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the logging level based on global arguments, `configured` when no
    /// verbosity flag is given
    pub fn log_level(&self, configured: tracing::Level) -> tracing::Level {
        if self.global.quiet {
            tracing::Level::ERROR
        } else if self.global.very_verbose {
            tracing::Level::DEBUG
        } else if self.global.verbose {
            tracing::Level::INFO
        } else {
            configured
        }
    }

    /// Merge command-line flags over configured fetch options
    ///
    /// Flags can only switch behavior on; an output directory given on the
    /// command line replaces the configured one.
    pub fn fetch_options(&self, configured: FetchOptions) -> FetchOptions {
        FetchOptions {
            quiet: configured.quiet || self.global.quiet,
            use_cookies: configured.use_cookies || self.fetch.use_cookies,
            output: self.fetch.output.clone().or(configured.output),
            remaining_ok: configured.remaining_ok || self.fetch.remaining_ok,
            dry_run: self.fetch.dry_run,
        }
    }
}
