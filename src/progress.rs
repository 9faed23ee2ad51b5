//! Progress reporting for pipeline operations.
//!
//! Pipeline operations call a [`ProgressReporter`] as they move entries. All
//! hooks have no-op defaults, so a reporter only implements what it shows.
//! There is no cancellation hook: an operation runs to completion or failure.
//!
//! # Example
//!
//! ```rust
//! use iso_archiver::progress::{ProgressReporter, StatisticsProgress};
//!
//! let mut progress = StatisticsProgress::new();
//! progress.on_entry_start("a.txt", 3);
//! progress.on_progress(3, 3);
//! progress.on_entry_complete("a.txt", true);
//! assert_eq!(progress.entries_completed, 1);
//! assert_eq!(progress.bytes_processed, 3);
//! ```

/// IEC byte unit: 1 KiB = 1024 bytes.
pub const BYTES_KIB: u64 = 1024;
/// IEC byte unit: 1 MiB = 1024 KiB.
pub const BYTES_MIB: u64 = 1024 * BYTES_KIB;
/// IEC byte unit: 1 GiB = 1024 MiB.
pub const BYTES_GIB: u64 = 1024 * BYTES_MIB;

/// Progress callbacks for create, extract and patch.
pub trait ProgressReporter {
    /// Called before an entry's header is written or its file is created.
    fn on_entry_start(&mut self, entry_name: &str, size: u64) {
        let _ = (entry_name, size);
    }

    /// Called after each chunk of the current entry's payload.
    ///
    /// `bytes_processed` counts bytes of the current entry only.
    fn on_progress(&mut self, bytes_processed: u64, total_bytes: u64) {
        let _ = (bytes_processed, total_bytes);
    }

    /// Called when an entry is done. `success` is `false` when the entry was
    /// skipped.
    fn on_entry_complete(&mut self, entry_name: &str, success: bool) {
        let _ = (entry_name, success);
    }

    /// Called for non-fatal problems such as an mtime that could not be set.
    fn on_warning(&mut self, message: &str) {
        let _ = message;
    }
}

/// A progress reporter that does nothing (null object pattern).
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {}

/// A progress reporter that collects counters and warnings.
#[derive(Debug, Default, Clone)]
pub struct StatisticsProgress {
    /// Entries that completed successfully.
    pub entries_completed: u64,
    /// Entries that were skipped.
    pub entries_skipped: u64,
    /// Total payload bytes reported across entries.
    pub bytes_processed: u64,
    /// Warnings collected.
    pub warnings: Vec<String>,
    current: u64,
}

impl StatisticsProgress {
    /// Creates a new statistics progress reporter.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressReporter for StatisticsProgress {
    fn on_entry_start(&mut self, _entry_name: &str, _size: u64) {
        self.current = 0;
    }

    fn on_progress(&mut self, bytes_processed: u64, _total_bytes: u64) {
        self.bytes_processed += bytes_processed.saturating_sub(self.current);
        self.current = bytes_processed;
    }

    fn on_entry_complete(&mut self, _entry_name: &str, success: bool) {
        if success {
            self.entries_completed += 1;
        } else {
            self.entries_skipped += 1;
        }
    }

    fn on_warning(&mut self, message: &str) {
        self.warnings.push(message.to_string());
    }
}

/// Formats a byte count with IEC units, e.g. `1.50 MiB`.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [(u64, &str); 3] = [(BYTES_GIB, "GiB"), (BYTES_MIB, "MiB"), (BYTES_KIB, "KiB")];
    for (unit, name) in UNITS {
        if bytes >= unit {
            return format!("{:.2} {}", bytes as f64 / unit as f64, name);
        }
    }
    format!("{} B", bytes)
}
