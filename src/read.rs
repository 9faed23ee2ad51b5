//! Sequential archive reading.
//!
//! A [`Reader`] owns one decode session. The input format is detected by
//! libarchive rather than assumed: compressed inputs are unwrapped by its
//! filters, and any archive format it knows (ISO9660, tar, zip, cpio, ...)
//! can be iterated.
//!
//! # Example
//!
//! ```rust,no_run
//! use iso_archiver::Reader;
//!
//! let mut reader = Reader::open("image.iso")?;
//! while let Some(entry) = reader.next_entry()? {
//!     println!("{} {}", entry.mode_string(), entry.path());
//!     let size = entry.size();
//!     reader.copy_to(std::io::sink(), size)?;
//! }
//! reader.close();
//! # Ok::<(), iso_archiver::Error>(())
//! ```

use std::io::Write;
use std::path::Path;

use crate::chunk::{ChunkSource, Chunks, pump};
use crate::codec::{self, Decoder};
use crate::entry::Entry;
use crate::{Error, Result, ResultExt};

/// An open decode session over one archive.
pub struct Reader {
    decoder: Box<dyn Decoder>,
    source: String,
    entries: usize,
}

impl Reader {
    /// Opens the archive at `path`.
    ///
    /// Fails with an open error if the file cannot be read or holds no
    /// archive format libarchive recognizes.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let decoder = codec::open_decoder(path)?;
        Ok(Self::with_decoder(decoder, path.display().to_string()))
    }

    /// Reads an archive held in memory.
    pub fn from_memory(data: impl Into<Vec<u8>>) -> Result<Self> {
        let source = "<memory>".to_string();
        let decoder = codec::memory_decoder(data.into().into_boxed_slice(), source.clone())?;
        Ok(Self::with_decoder(decoder, source))
    }

    fn with_decoder(decoder: Box<dyn Decoder>, source: String) -> Self {
        let filters = decoder.filters();
        if filters.is_empty() {
            log::debug!("{}: opened", source);
        } else {
            log::debug!("{}: opened inside {}", source, filters.join(" > "));
        }
        Self {
            decoder,
            source,
            entries: 0,
        }
    }

    /// Advances to the next entry. Returns `None` at the end of the archive.
    ///
    /// Payload of the previous entry that was not copied is discarded.
    pub fn next_entry(&mut self) -> Result<Option<Entry>> {
        let entry = self
            .decoder
            .next_header()
            .with_context(|| format!("reading entry {} of {}", self.entries + 1, self.source))?;
        if entry.is_some() {
            self.entries += 1;
        }
        Ok(entry)
    }

    /// Reads payload bytes of the current entry; `Ok(0)` once exhausted.
    pub fn read_data(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.decoder.read_data(buf)
    }

    /// Streams the current entry's payload into `sink`.
    ///
    /// Copies until the decoder has no bytes left for the entry. A failure
    /// on either side, or a payload shorter than `expected`, is reported as
    /// a transfer error carrying the number of bytes delivered. `expected`
    /// of zero is a no-op.
    pub fn copy_to<W: Write>(&mut self, mut sink: W, expected: u64) -> Result<u64> {
        if expected == 0 {
            return Ok(0);
        }
        let mut chunks = Chunks::new(&mut *self);
        let copied = pump(&mut chunks, expected, |chunk| {
            sink.write_all(chunk)?;
            Ok(chunk.len())
        })?;
        if copied < expected {
            return Err(Error::transfer(
                copied,
                expected,
                "entry payload ended early",
            ));
        }
        sink.flush()
            .map_err(|e| Error::transfer(copied, expected, e.to_string()))?;
        Ok(copied)
    }

    /// Name of the detected archive format, e.g. `"ISO9660 with Rockridge
    /// extensions"` or `"POSIX ustar format"`. Known once the first header
    /// has been read.
    pub fn format_name(&self) -> Option<String> {
        self.decoder.format_name()
    }

    /// Compression filters unwrapped before the archive, outermost first.
    pub fn filters(&self) -> Vec<String> {
        self.decoder.filters()
    }

    /// Display name of the input.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Ends the session and releases the input.
    pub fn close(self) {
        log::debug!("{}: closed after {} entries", self.source, self.entries);
    }
}

impl ChunkSource for Reader {
    fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.read_data(buf)
    }
}

impl std::fmt::Debug for Reader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reader")
            .field("source", &self.source)
            .field("entries", &self.entries)
            .finish_non_exhaustive()
    }
}
