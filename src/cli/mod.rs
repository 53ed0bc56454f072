//! Command-line interface components
//!
//! This module contains CLI-specific code for the Drive Fetcher application:
//! argument parsing and the command handlers.

pub mod args;
pub mod commands;

pub use args::{Cli, Commands, FetchArgs, GlobalArgs};
pub use commands::{handle_config, handle_datasets, handle_fetch, handle_list, render_tree};
