//! Command handlers for Drive Fetcher CLI
//!
//! This module implements the command handlers that connect parsed arguments
//! and configuration to the fetcher.

use std::fmt::Write as _;
use std::path::PathBuf;
use std::time::Instant;

use tracing::info;

use crate::app::{fetch_datasets, Dataset, DriveFetcher, DriveFolder, DriveNode, FetchOptions, FolderFetcher};
use crate::config::AppConfig;
use crate::errors::Result;

/// Handle the default invocation: fetch every configured dataset in order
///
/// Stops at the first dataset that fails.
pub async fn handle_datasets(
    fetcher: &dyn FolderFetcher,
    datasets: &[Dataset],
    options: &FetchOptions,
) -> Result<Vec<PathBuf>> {
    let start_time = Instant::now();
    info!("Fetching {} datasets", datasets.len());

    let files = fetch_datasets(fetcher, datasets, options).await?;
    report(&files, options, start_time);
    Ok(files)
}

/// Handle the fetch command: fetch explicit folders in order
pub async fn handle_fetch(
    fetcher: &dyn FolderFetcher,
    folders: &[String],
    options: &FetchOptions,
) -> Result<Vec<PathBuf>> {
    let start_time = Instant::now();

    let mut files = Vec::new();
    for folder in folders {
        info!("Fetching folder {}", folder);
        files.extend(fetcher.fetch(folder, options).await?);
    }

    report(&files, options, start_time);
    Ok(files)
}

/// Handle the list command: print the remote tree of one folder
pub async fn handle_list(fetcher: &DriveFetcher, folder: &str, options: &FetchOptions) -> Result<()> {
    // Status lines would interleave with the tree
    let listing_options = FetchOptions {
        quiet: true,
        ..options.clone()
    };
    let tree = fetcher.list(folder, &listing_options).await?;

    print!("{}", render_tree(&tree));
    if !options.quiet {
        println!("{} files", tree.file_count());
    }
    Ok(())
}

/// Handle the config command: print a default configuration file
pub fn handle_config() -> Result<()> {
    print!("{}", AppConfig::generate_default_config_content());
    if let Some(path) = AppConfig::default_config_path() {
        eprintln!("# Save as ./drive-fetcher.toml or {}", path.display());
    }
    Ok(())
}

fn report(files: &[PathBuf], options: &FetchOptions, start_time: Instant) {
    if options.dry_run {
        for file in files {
            println!("{}", file.display());
        }
    }
    if !options.quiet {
        let verb = if options.dry_run { "Would fetch" } else { "Fetched" };
        println!("{} {} files in {:.1?}", verb, files.len(), start_time.elapsed());
    }
}

/// Indented tree of a listed folder, folders suffixed with `/`
pub fn render_tree(folder: &DriveFolder) -> String {
    let mut out = format!("{}/\n", folder.name);
    render_children(folder, 1, &mut out);
    out
}

fn render_children(folder: &DriveFolder, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    for child in &folder.children {
        match child {
            DriveNode::File(file) => {
                let _ = writeln!(out, "{}{}  ({})", indent, file.name, file.id);
            }
            DriveNode::Folder(sub) => {
                let _ = writeln!(out, "{}{}/", indent, sub.name);
                render_children(sub, depth + 1, out);
            }
        }
    }
}
