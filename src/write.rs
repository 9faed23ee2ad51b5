//! Sequential archive writing.
//!
//! A [`Writer`] owns one encode session for a fixed output [`Format`].
//! Authoring directives are checked when they are given and frozen once the
//! output is opened. Every session starts from the format's
//! [default directives](Format::default_directives); later directives win.
//!
//! # Example
//!
//! ```rust,no_run
//! use iso_archiver::{Entry, Format, Writer};
//!
//! let mut writer = Writer::config(Format::Iso9660)
//!     .options(&["volume-id=DATA", "publisher=Example"])?
//!     .open("out.iso")?;
//! writer.write_entry(&Entry::directory("docs"))?;
//! writer.write_entry(&Entry::file("docs/hello.txt", 5))?;
//! writer.write(b"hello")?;
//! let summary = writer.close()?;
//! println!("{} bytes", summary.image_size);
//! # Ok::<(), iso_archiver::Error>(())
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use crate::archive_path::ArchivePath;
use crate::chunk::{ChunkSource, Chunks, pump};
use crate::codec::{self, Encoder, Format, WriteSummary, join_directives};
use crate::entry::Entry;
use crate::{Error, Result, ResultExt};

/// Writer configuration collected before the output is opened.
#[derive(Debug, Clone)]
pub struct WriterConfig {
    format: Format,
    directives: Vec<String>,
}

impl WriterConfig {
    /// Adds authoring directives, validating them immediately.
    ///
    /// Directives use libarchive's `key=value` / `!key` spelling, e.g.
    /// `volume-id=DATA`, `boot=isolinux/isolinux.bin` or `!joliet`.
    pub fn options<S: AsRef<str>>(mut self, directives: &[S]) -> Result<Self> {
        join_directives(directives)?;
        let mut all = self.directives.clone();
        all.extend(directives.iter().map(|d| d.as_ref().to_string()));
        // A session that is never opened leaves nothing on disk.
        codec::build_encoder(self.format, &join_directives(&all)?)?;
        self.directives = all;
        Ok(self)
    }

    /// Output format.
    pub fn format(&self) -> Format {
        self.format
    }

    /// Directives added so far, defaults excluded.
    pub fn directives(&self) -> &[String] {
        &self.directives
    }

    /// Creates the output file and starts the session.
    pub fn open(self, path: impl AsRef<Path>) -> Result<Writer> {
        let path = path.as_ref();
        let mut encoder = codec::build_encoder(self.format, &join_directives(&self.directives)?)?;
        encoder.open(path)?;
        log::debug!("{}: opened for {}", path.display(), self.format);
        Ok(Writer {
            encoder,
            format: self.format,
            path: path.to_path_buf(),
            target: path.display().to_string(),
            entries: 0,
            payload_bytes: 0,
            pending: None,
        })
    }
}

/// Payload accounting for the current regular file.
#[derive(Debug)]
struct Pending {
    path: String,
    declared: u64,
    written: u64,
}

/// An open encode session.
pub struct Writer {
    encoder: Box<dyn Encoder>,
    format: Format,
    path: PathBuf,
    target: String,
    entries: usize,
    payload_bytes: u64,
    pending: Option<Pending>,
}

impl Writer {
    /// Starts configuring a writer for `format`.
    pub fn config(format: Format) -> WriterConfig {
        WriterConfig {
            format,
            directives: Vec::new(),
        }
    }

    /// Opens `path` for `format` with default options.
    pub fn open(path: impl AsRef<Path>, format: Format) -> Result<Self> {
        Self::config(format).open(path)
    }

    /// Writes an entry header. A regular file must be followed by exactly
    /// `entry.size()` payload bytes.
    ///
    /// Fails with an encode error if the path is empty or climbs out of the
    /// archive root, or if the format rejects the entry.
    pub fn write_entry(&mut self, entry: &Entry) -> Result<()> {
        self.settle()?;
        let path = ArchivePath::new(entry.path())
            .map_err(|e| Error::encode(entry.path(), e.to_string()))
            .with_context(|| format!("writing entry '{}' to {}", entry.path(), self.target))?;
        let mut entry = entry.clone();
        entry.set_path(path.as_str());
        self.encoder
            .write_header(&entry)
            .with_context(|| format!("writing entry '{}' to {}", entry.path(), self.target))?;
        self.entries += 1;
        if entry.file_type().has_payload() {
            self.pending = Some(Pending {
                path: entry.path().to_string(),
                declared: entry.size(),
                written: 0,
            });
        }
        Ok(())
    }

    /// Writes `data` as payload of the current entry. Every byte must be
    /// accepted.
    pub fn write(&mut self, data: &[u8]) -> Result<u64> {
        if data.is_empty() {
            return Ok(0);
        }
        let accepted = self.accept(data)?;
        if accepted != data.len() {
            return Err(Error::transfer(
                accepted as u64,
                data.len() as u64,
                format!("{} accepted {} of {} bytes", self.target, accepted, data.len()),
            ));
        }
        Ok(accepted as u64)
    }

    fn accept(&mut self, data: &[u8]) -> Result<usize> {
        let accepted = self.encoder.write_data(data)?;
        self.payload_bytes += accepted as u64;
        if let Some(pending) = &mut self.pending {
            pending.written += accepted as u64;
        }
        Ok(accepted)
    }

    /// Streams `size` bytes from `source` into the current entry.
    ///
    /// Fails with a transfer error if the source runs dry early, holds more
    /// than `size` bytes, or the encoder refuses part of a chunk.
    pub fn copy_from<S: ChunkSource>(&mut self, source: S, size: u64) -> Result<u64> {
        let mut chunks = Chunks::bounded(source, size);
        let copied = pump(&mut chunks, size, |chunk| self.accept(chunk))?;
        if copied < size {
            return Err(Error::transfer(
                copied,
                size,
                format!("source ended after {} of {} bytes", copied, size),
            ));
        }
        let mut extra = [0u8; 1];
        let more = chunks
            .into_inner()
            .read_chunk(&mut extra)
            .map_err(|e| Error::transfer(copied, size, e.to_string()))?;
        if more > 0 {
            return Err(Error::transfer(
                copied,
                size,
                format!("source holds more than {} bytes", size),
            ));
        }
        Ok(copied)
    }

    /// Output format.
    pub fn format(&self) -> Format {
        self.format
    }

    /// Entries written so far.
    pub fn entries(&self) -> usize {
        self.entries
    }

    // The encoder pads a short entry with zeros, so undersupply is caught here.
    fn settle(&mut self) -> Result<()> {
        match self.pending.take() {
            Some(p) if p.written < p.declared => Err(Error::transfer(
                p.written,
                p.declared,
                format!("'{}' declared {} bytes but got {}", p.path, p.declared, p.written),
            )),
            _ => Ok(()),
        }
    }

    /// Finalizes the archive.
    pub fn close(mut self) -> Result<WriteSummary> {
        self.settle()
            .with_context(|| format!("finishing {}", self.target))?;
        self.encoder
            .finish()
            .with_context(|| format!("finishing {}", self.target))?;
        let image_size = fs::metadata(&self.path)
            .map_err(Error::from)
            .with_context(|| format!("finishing {}", self.target))?
            .len();
        log::debug!(
            "{}: {} entries, {} bytes",
            self.target,
            self.entries,
            image_size
        );
        Ok(WriteSummary {
            entries: self.entries,
            payload_bytes: self.payload_bytes,
            image_size,
        })
    }
}

impl std::fmt::Debug for Writer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Writer")
            .field("target", &self.target)
            .field("format", &self.format)
            .field("entries", &self.entries)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use crate::chunk::IoSource;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn temp_writer(dir: &TempDir, options: &[&str]) -> Result<Writer> {
        Writer::config(Format::Iso9660)
            .options(options)?
            .open(dir.path().join("out.iso"))
    }

    #[test]
    fn test_bad_options_fail_at_config() {
        let err = Writer::config(Format::Iso9660)
            .options(&["no-such-option"])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Option);

        let err = Writer::config(Format::Iso9660)
            .options(&["publisher=a,b"])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Option);

        let config = Writer::config(Format::Iso9660)
            .options(&["volume-id=OK"])
            .unwrap();
        assert_eq!(config.directives(), ["volume-id=OK"]);
    }

    #[test]
    fn test_oversupply_is_transfer_error() {
        let dir = TempDir::new().unwrap();
        let mut w = temp_writer(&dir, &[]).unwrap();
        w.write_entry(&Entry::file("f", 3)).unwrap();
        let err = w.write(b"four").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
        assert_eq!(err.transferred(), Some(3));
    }

    #[test]
    fn test_undersupply_detected_at_close() {
        let dir = TempDir::new().unwrap();
        let mut w = temp_writer(&dir, &[]).unwrap();
        w.write_entry(&Entry::file("f", 5)).unwrap();
        w.write(b"ab").unwrap();
        let err = w.close().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
        assert_eq!(err.transferred(), Some(2));
    }

    #[test]
    fn test_undersupply_detected_at_next_entry() {
        let dir = TempDir::new().unwrap();
        let mut w = temp_writer(&dir, &[]).unwrap();
        w.write_entry(&Entry::file("f", 5)).unwrap();
        w.write(b"abc").unwrap();
        let err = w.write_entry(&Entry::file("g", 0)).unwrap_err();
        assert_eq!(err.transferred(), Some(3));
        assert_eq!(w.entries(), 1);
    }

    #[test]
    fn test_copy_from_short_source() {
        let dir = TempDir::new().unwrap();
        let mut w = temp_writer(&dir, &[]).unwrap();
        w.write_entry(&Entry::file("f", 100)).unwrap();
        let err = w
            .copy_from(IoSource(Cursor::new(vec![0u8; 40])), 100)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
        assert_eq!(err.transferred(), Some(40));
    }

    #[test]
    fn test_copy_from_oversized_source() {
        let dir = TempDir::new().unwrap();
        let mut w = temp_writer(&dir, &[]).unwrap();
        w.write_entry(&Entry::file("f", 10)).unwrap();
        let err = w
            .copy_from(IoSource(Cursor::new(vec![7u8; 11])), 10)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
        assert_eq!(err.transferred(), Some(10));
        assert!(err.to_string().contains("more than 10 bytes"));

        // A declared-empty file whose source is not empty.
        w.write_entry(&Entry::file("g", 0)).unwrap();
        let err = w
            .copy_from(IoSource(Cursor::new(b"x".to_vec())), 0)
            .unwrap_err();
        assert_eq!(err.transferred(), Some(0));
    }

    #[test]
    fn test_copy_from_exact() {
        let dir = TempDir::new().unwrap();
        let mut w = temp_writer(&dir, &["volume-id=test"]).unwrap();
        let payload = vec![3u8; 3 * crate::READ_BUFFER_SIZE + 17];
        w.write_entry(&Entry::file("f", payload.len() as u64)).unwrap();
        let n = w
            .copy_from(IoSource(Cursor::new(payload.clone())), payload.len() as u64)
            .unwrap();
        assert_eq!(n, payload.len() as u64);
        let summary = w.close().unwrap();
        assert_eq!(summary.entries, 1);
        assert_eq!(summary.payload_bytes, payload.len() as u64);
        assert_eq!(
            summary.image_size,
            fs::metadata(dir.path().join("out.iso")).unwrap().len()
        );
    }

    #[test]
    fn test_encode_error_keeps_kind_through_context() {
        let dir = TempDir::new().unwrap();
        let mut w = temp_writer(&dir, &[]).unwrap();
        let err = w.write_entry(&Entry::file("", 0)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Encode);
        assert!(err.to_string().contains("out.iso"));

        let err = w.write_entry(&Entry::file("a/../../b", 0)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Encode);
        assert_eq!(w.entries(), 0);
    }

    #[test]
    fn test_symlink_needs_rock_ridge() {
        let dir = TempDir::new().unwrap();
        let mut w = temp_writer(&dir, &["!rockridge"]).unwrap();
        let err = w.write_entry(&Entry::symlink("l", "t")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Encode);
    }
}
