//! Progress bar implementation for CLI operations.

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use iso_archiver::ProgressReporter;

/// Progress display for CLI operations
pub struct CliProgress {
    multi: MultiProgress,
    overall: ProgressBar,
    current: Option<ProgressBar>,
    quiet: bool,
}

impl CliProgress {
    /// Creates a progress display with an entry counter. The total is not
    /// known up front, so the counter is a spinner.
    pub fn new(quiet: bool) -> Self {
        let multi = MultiProgress::new();

        let overall = if quiet {
            ProgressBar::hidden()
        } else {
            let pb = multi.add(ProgressBar::new_spinner());
            if let Ok(style) =
                ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {pos} entries {msg}")
            {
                pb.set_style(style);
            }
            pb
        };

        Self {
            multi,
            overall,
            current: None,
            quiet,
        }
    }

    /// Sets a message on the overall progress bar
    pub fn set_message(&self, msg: impl Into<String>) {
        if !self.quiet {
            self.overall.set_message(msg.into());
        }
    }

    /// Finishes the progress display
    pub fn finish(&self) {
        self.overall.finish_and_clear();
    }

    /// Finishes with a custom message
    pub fn finish_with_message(&self, msg: impl Into<String>) {
        self.overall.finish_with_message(msg.into());
    }
}

impl ProgressReporter for CliProgress {
    fn on_entry_start(&mut self, entry_name: &str, entry_size: u64) {
        if self.quiet || entry_size == 0 {
            return;
        }

        let pb = self.multi.add(ProgressBar::new(entry_size));
        if let Ok(style) = ProgressStyle::default_bar()
            .template("  {spinner:.green} {wide_msg} [{bar:30}] {bytes}/{total_bytes}")
        {
            pb.set_style(style.progress_chars("#>-"));
        }

        // Keep the tail of long names
        let display_name = match entry_name.char_indices().rev().nth(36) {
            Some((pos, _)) if entry_name.len() > 40 => format!("...{}", &entry_name[pos..]),
            _ => entry_name.to_string(),
        };
        pb.set_message(display_name);
        self.current = Some(pb);
    }

    fn on_progress(&mut self, bytes_processed: u64, _total_bytes: u64) {
        if let Some(pb) = self.current.as_ref() {
            pb.set_position(bytes_processed);
        }
    }

    fn on_entry_complete(&mut self, _entry_name: &str, _success: bool) {
        if let Some(pb) = self.current.take() {
            pb.finish_and_clear();
        }
        self.overall.inc(1);
    }
}
