//! Progress output for fetch operations
//!
//! Status lines and per-file byte progress go to standard output unless the
//! fetch is quiet. When stdout is not a terminal the bars are replaced by one
//! line per finished file.

use std::fmt::Display;
use std::time::Instant;

use indicatif::{HumanBytes, ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::constants::progress;
use crate::errors::ProgressError;

const BAR_TEMPLATE: &str =
    "{spinner:.green} {msg} [{bar:30.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})";
const SPINNER_TEMPLATE: &str = "{spinner:.green} {msg} {bytes} ({bytes_per_sec})";

/// Progress reporter shared by the listing and download steps of one fetch
#[derive(Debug, Clone)]
pub struct FetchProgress {
    quiet: bool,
    is_terminal: bool,
}

impl FetchProgress {
    /// Create a reporter, detecting whether stdout is a terminal
    pub fn new(quiet: bool) -> Self {
        Self {
            quiet,
            is_terminal: atty::is(atty::Stream::Stdout),
        }
    }

    /// A reporter that prints nothing
    pub fn hidden() -> Self {
        Self {
            quiet: true,
            is_terminal: false,
        }
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    /// Print a status line
    pub fn status(&self, message: impl Display) {
        tracing::debug!("{}", message);
        if !self.quiet {
            println!("{}", message);
        }
    }

    /// Start byte progress for one file
    ///
    /// # Errors
    ///
    /// Returns `ProgressError` if the bar template is rejected
    pub fn start_file(&self, name: &str, total_bytes: Option<u64>) -> Result<FileProgress, ProgressError> {
        let bar = if self.quiet || !self.is_terminal {
            ProgressBar::hidden()
        } else {
            let (bar, template) = match total_bytes {
                Some(total) => (ProgressBar::new(total), BAR_TEMPLATE),
                None => (ProgressBar::new_spinner(), SPINNER_TEMPLATE),
            };
            bar.set_draw_target(ProgressDrawTarget::stdout());
            bar.set_style(
                ProgressStyle::default_bar()
                    .template(template)
                    .map_err(|e| ProgressError::Template {
                        reason: e.to_string(),
                    })?
                    .progress_chars("##-"),
            );
            bar.enable_steady_tick(progress::TICK_INTERVAL);
            bar
        };
        bar.set_message(name.to_string());

        Ok(FileProgress {
            bar,
            name: name.to_string(),
            text_mode: !self.quiet && !self.is_terminal,
            started: Instant::now(),
            last_report: Instant::now(),
            bytes: 0,
        })
    }
}

/// Byte progress of a single file download
pub struct FileProgress {
    bar: ProgressBar,
    name: String,
    text_mode: bool,
    started: Instant,
    last_report: Instant,
    bytes: u64,
}

impl FileProgress {
    /// Record `delta` more bytes written
    pub fn advance(&mut self, delta: u64) {
        self.bytes += delta;
        self.bar.inc(delta);
        if self.text_mode && self.last_report.elapsed() >= progress::TEXT_REPORT_INTERVAL {
            println!("  {}: {} so far", self.name, HumanBytes(self.bytes));
            self.last_report = Instant::now();
        }
    }

    /// Bytes recorded so far
    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    /// Finish successfully
    pub fn finish(self) {
        self.bar.finish_and_clear();
        if self.text_mode {
            println!(
                "  {}: {} in {:.1?}",
                self.name,
                HumanBytes(self.bytes),
                self.started.elapsed()
            );
        }
    }

    /// Drop the bar after a failure
    pub fn abandon(self) {
        self.bar.abandon();
    }
}
