//! Archive codec infrastructure.
//!
//! This module provides the entry-level abstraction the reader and writer
//! drive: a [`Decoder`] yields headers and payload bytes, an [`Encoder`]
//! accepts them. Both are implemented over libarchive, which recognizes
//! every common archive format and compression filter on input and
//! authors ISO9660 on output.

pub(crate) mod libarchive;

use std::fmt;
use std::path::Path;

use crate::entry::Entry;
use crate::{Error, Result};

/// Directives applied to every ISO9660 session before the caller's own.
///
/// Strict Rock Ridge keeps permissions and ownership as given, and level 3
/// lets files of 4 GiB or more span several extents. Either can be
/// overridden (`rockridge=useful`, `iso-level=2`, ...).
pub const DEFAULT_ISO_DIRECTIVES: &[&str] = &["rockridge=strict", "iso-level=3"];

/// Output archive formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum Format {
    /// ISO9660 disk image with Rock Ridge, Joliet and El Torito.
    #[default]
    Iso9660,
}

impl Format {
    /// Human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Iso9660 => "ISO9660",
        }
    }

    /// Conventional file extension, without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Iso9660 => "iso",
        }
    }

    /// Looks a format up by name, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "iso9660" | "iso" => Some(Self::Iso9660),
            _ => None,
        }
    }

    /// Directives every session of this format starts from.
    pub fn default_directives(&self) -> &'static [&'static str] {
        match self {
            Self::Iso9660 => DEFAULT_ISO_DIRECTIVES,
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of closing a writer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteSummary {
    /// Entry headers accepted, directories included.
    pub entries: usize,
    /// Payload bytes received.
    pub payload_bytes: u64,
    /// Size of the written archive in bytes.
    pub image_size: u64,
}

/// Sequential archive decoder.
pub trait Decoder {
    /// Advances to the next entry, or `None` at the end of the archive.
    fn next_header(&mut self) -> Result<Option<Entry>>;

    /// Reads payload bytes of the current entry; `Ok(0)` once exhausted.
    fn read_data(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Name of the detected archive format, once known.
    fn format_name(&self) -> Option<String> {
        None
    }

    /// Compression filters around the archive, outermost first.
    fn filters(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Sequential archive encoder.
pub trait Encoder {
    /// Applies comma separated authoring directives. Only valid before
    /// [`open`](Encoder::open).
    fn set_options(&mut self, directives: &str) -> Result<()>;

    /// Creates the output file.
    fn open(&mut self, path: &Path) -> Result<()>;

    /// Starts a new entry.
    fn write_header(&mut self, entry: &Entry) -> Result<()>;

    /// Accepts payload bytes for the current entry and returns how many were
    /// taken.
    fn write_data(&mut self, data: &[u8]) -> Result<usize>;

    /// Completes the archive.
    fn finish(&mut self) -> Result<()>;
}

/// Joins directives into the comma separated form the encoder takes.
///
/// A directive may not itself contain a comma or NUL byte, since it would
/// be split into (or truncated to) something else.
///
/// ```rust
/// use iso_archiver::codec::join_directives;
///
/// assert_eq!(join_directives(&["volume-id=A", "!joliet"]).unwrap(), "volume-id=A,!joliet");
/// assert!(join_directives(&["publisher=a,b"]).is_err());
/// ```
pub fn join_directives<S: AsRef<str>>(directives: &[S]) -> Result<String> {
    let mut joined = String::new();
    for directive in directives {
        let directive = directive.as_ref();
        if directive.contains(',') || directive.contains('\0') {
            return Err(Error::option(
                directive,
                "a directive cannot contain ',' or NUL",
            ));
        }
        if directive.is_empty() {
            continue;
        }
        if !joined.is_empty() {
            joined.push(',');
        }
        joined.push_str(directive);
    }
    Ok(joined)
}

/// Opens a decoder over the file at `path`.
pub fn open_decoder(path: &Path) -> Result<Box<dyn Decoder>> {
    Ok(Box::new(libarchive::ReadSession::open_file(path)?))
}

/// Opens a decoder over bytes held in memory.
pub fn memory_decoder(data: Box<[u8]>, source: String) -> Result<Box<dyn Decoder>> {
    Ok(Box::new(libarchive::ReadSession::open_memory(data, source)?))
}

/// Builds an encoder for `format` with `directives` applied on top of the
/// format defaults. The encoder is not opened yet.
pub fn build_encoder(format: Format, directives: &str) -> Result<Box<dyn Encoder>> {
    let mut encoder = libarchive::WriteSession::new(format)?;
    encoder.set_options(&join_directives(format.default_directives())?)?;
    encoder.set_options(directives)?;
    Ok(Box::new(encoder))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_names() {
        assert_eq!(Format::Iso9660.to_string(), "ISO9660");
        assert_eq!(Format::from_name("ISO"), Some(Format::Iso9660));
        assert_eq!(Format::from_name("zip"), None);
        assert_eq!(Format::default().extension(), "iso");
    }

    #[test]
    fn test_join_directives() {
        assert_eq!(join_directives::<&str>(&[]).unwrap(), "");
        assert_eq!(join_directives(&["a", "", "b=1"]).unwrap(), "a,b=1");
        let err = join_directives(&["x\0y"]).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Option);
    }

    #[test]
    fn test_trait_objects_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.iso");
        {
            let mut encoder = build_encoder(Format::Iso9660, "volume-id=TRAIT").unwrap();
            encoder.open(&path).unwrap();
            encoder.write_header(&Entry::file("x.bin", 2)).unwrap();
            assert_eq!(encoder.write_data(b"ok").unwrap(), 2);
            encoder.finish().unwrap();
        }
        let mut decoder = open_decoder(&path).unwrap();
        let entry = decoder.next_header().unwrap().unwrap();
        assert_eq!(entry.path(), "x.bin");
        assert!(decoder.format_name().unwrap().starts_with("ISO9660"));
        assert!(decoder.filters().is_empty());
        let mut buf = [0u8; 8];
        assert_eq!(decoder.read_data(&mut buf).unwrap(), 2);
        assert_eq!(&buf[..2], b"ok");
        assert!(decoder.next_header().unwrap().is_none());
    }

    #[test]
    fn test_default_directives_can_be_overridden() {
        assert!(build_encoder(Format::Iso9660, "rockridge=useful,iso-level=2").is_ok());
        let err = build_encoder(Format::Iso9660, "iso-level=9").err().unwrap();
        assert_eq!(err.kind(), crate::ErrorKind::Option);
    }
}
