//! Whole-archive operations built on [`Reader`](crate::Reader) and
//! [`Writer`](crate::Writer).
//!
//! * [`create_iso`] builds an image from a [`FileMapping`].
//! * [`extract_iso`] unpacks the regular files of an image into a directory.
//! * [`patch_iso`] copies an image entry by entry and injects extra files.
//!
//! Each operation has a `_with` variant taking [`TransformOptions`] and a
//! [`ProgressReporter`]. None of them roll back: a failure leaves whatever
//! was written so far in place.
//!
//! # Example
//!
//! ```rust,no_run
//! use iso_archiver::{FileMapping, create_iso, extract_iso};
//!
//! let mapping = FileMapping::new().with("/etc/hostname", "/etc/hostname")?;
//! create_iso("out.iso", &mapping, &["volume-id=CONFIG"])?;
//! let result = extract_iso("out.iso", "unpacked")?;
//! assert_eq!(result.entries_extracted, 1);
//! # Ok::<(), iso_archiver::Error>(())
//! ```

mod extract;
mod patch;

use std::io::{self, Write};

use crate::Result;
use crate::chunk::ChunkSource;
use crate::codec::Format;
use crate::progress::ProgressReporter;

pub use extract::{extract_iso, extract_iso_with};
pub use patch::{create_iso, create_iso_with, patch_iso, patch_iso_with};

/// How injected files interact with source entries of the same path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MergePolicy {
    /// Copy every source entry and add the injected file after it. Both
    /// headers are written; the ISO9660 encoder keeps the later one, so the
    /// injected file wins. A type clash (file over directory) is an encode
    /// error.
    #[default]
    Append,
    /// Leave out source entries whose path is an injected target.
    /// Directories are always copied.
    Replace,
}

/// Options for [`create_iso_with`] and [`patch_iso_with`].
#[derive(Debug, Clone, Default)]
pub struct TransformOptions {
    /// Output format.
    pub format: Format,
    /// Authoring directives handed to the encoder, in order.
    pub directives: Vec<String>,
    /// Duplicate path handling.
    pub merge_policy: MergePolicy,
}

impl TransformOptions {
    /// Creates options with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the authoring directives.
    pub fn directives<S: AsRef<str>>(mut self, directives: &[S]) -> Self {
        self.directives = directives.iter().map(|d| d.as_ref().to_string()).collect();
        self
    }

    /// Appends one authoring directive.
    pub fn directive(mut self, directive: impl Into<String>) -> Self {
        self.directives.push(directive.into());
        self
    }

    /// Sets the merge policy.
    pub fn merge_policy(mut self, policy: MergePolicy) -> Self {
        self.merge_policy = policy;
        self
    }

    /// Sets the output format.
    pub fn format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }
}

/// Result of a create or patch operation.
#[must_use = "patch results report what ended up in the image"]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchResult {
    /// Entries copied from the source image.
    pub entries_copied: usize,
    /// Source entries left out under [`MergePolicy::Replace`].
    pub entries_replaced: usize,
    /// Files injected from the mapping.
    pub entries_injected: usize,
    /// Payload bytes written, copied and injected.
    pub bytes_written: u64,
    /// Size of the finished image in bytes.
    pub image_size: u64,
}

impl PatchResult {
    /// Total entries written to the image.
    pub fn total_entries(&self) -> usize {
        self.entries_copied + self.entries_injected
    }
}

/// Result of an extract operation.
#[must_use = "extraction results report skipped entries"]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractResult {
    /// Regular files written.
    pub entries_extracted: usize,
    /// Directories, symlinks and special files that were not extracted.
    pub entries_skipped: usize,
    /// Payload bytes written.
    pub bytes_extracted: u64,
}

/// A [`ChunkSource`] that reports each chunk to a progress reporter.
struct Reporting<'a, S> {
    source: S,
    progress: &'a mut dyn ProgressReporter,
    done: u64,
    total: u64,
}

impl<'a, S> Reporting<'a, S> {
    fn new(source: S, progress: &'a mut dyn ProgressReporter, total: u64) -> Self {
        Self {
            source,
            progress,
            done: 0,
            total,
        }
    }
}

impl<S: ChunkSource> ChunkSource for Reporting<'_, S> {
    fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize> {
        let n = self.source.read_chunk(buf)?;
        if n > 0 {
            self.done += n as u64;
            self.progress.on_progress(self.done, self.total);
        }
        Ok(n)
    }
}

/// A sink that reports each accepted write to a progress reporter.
struct ReportingSink<'a, W> {
    inner: W,
    progress: &'a mut dyn ProgressReporter,
    done: u64,
    total: u64,
}

impl<W: Write> Write for ReportingSink<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.done += n as u64;
        self.progress.on_progress(self.done, self.total);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
