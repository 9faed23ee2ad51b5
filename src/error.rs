//! Error types for ISO image operations.
//!
//! This module provides the [`Error`] enum which represents every failure mode
//! of the reader, the writer and the transform pipeline, along with a
//! [`Result<T>`] alias and the [`ResultExt`] helper used to attach context.
//!
//! # Error Kinds
//!
//! Every error has a stable [`ErrorKind`]. Context added while an error travels
//! up the call stack never changes the kind, so callers can always match on it:
//!
//! ```rust
//! use iso_archiver::{Error, ErrorKind, ResultExt};
//!
//! fn stat(path: &str) -> iso_archiver::Result<u64> {
//!     let meta = std::fs::metadata(path).map_err(Error::from);
//!     Ok(meta.with_context(|| format!("stat {}", path))?.len())
//! }
//!
//! let err = stat("/definitely/not/here").unwrap_err();
//! assert_eq!(err.kind(), ErrorKind::Io);
//! assert!(err.to_string().starts_with("stat /definitely/not/here"));
//! ```
//!
//! | Kind | Variant | Typical Cause |
//! |------|---------|---------------|
//! | Open | [`Open`][Error::Open] | Missing file, unrecognized archive format |
//! | Decode | [`Decode`][Error::Decode] | Corrupt or truncated image |
//! | Encode | [`Encode`][Error::Encode] | Entry rejected by the output format, path type clash |
//! | Option | [`Option`][Error::Option] | Unknown or malformed authoring directive |
//! | Io | [`Io`][Error::Io], [`Transfer`][Error::Transfer] | Filesystem failure, byte count mismatch |
//! | Validation | [`Validation`][Error::Validation] | Injected path is not a regular file |

use std::fmt;
use std::io;

/// The category of an [`Error`], independent of any context wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// A read or write session could not be established.
    Open,
    /// Structural corruption or short read while iterating entries.
    Decode,
    /// An entry header was rejected by the output format.
    Encode,
    /// A malformed or unsupported authoring directive.
    Option,
    /// Payload transfer or filesystem failure.
    Io,
    /// An injected source path is not a regular file or does not exist.
    Validation,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Open => "open error",
            Self::Decode => "decode error",
            Self::Encode => "encode error",
            Self::Option => "option error",
            Self::Io => "I/O error",
            Self::Validation => "validation error",
        };
        f.write_str(name)
    }
}

/// The main error type for ISO image operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// An I/O error occurred during a filesystem operation.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A read or write session could not be established.
    ///
    /// Returned for unreadable paths and for inputs that libarchive does not
    /// recognize as any archive format. The reason carries libarchive's
    /// message.
    #[error("cannot open '{path}': {reason}")]
    Open {
        /// The path that failed to open.
        path: String,
        /// Why the session could not be established.
        reason: String,
    },

    /// The image is structurally corrupt or truncated.
    #[error("corrupt image at offset {offset:#x}: {reason}")]
    Decode {
        /// Byte offset in the (decompressed) image where the problem was found.
        offset: u64,
        /// A description of the corruption.
        reason: String,
    },

    /// An entry was rejected by the output format's constraints.
    #[error("cannot encode '{path}': {reason}")]
    Encode {
        /// Archive path of the rejected entry.
        path: String,
        /// The constraint that was violated.
        reason: String,
    },

    /// An authoring directive was malformed, unknown or applied too late.
    #[error("invalid option '{option}': {reason}")]
    Option {
        /// The offending directive as given.
        option: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Payload transfer did not move exactly the requested number of bytes.
    ///
    /// `transferred` is the number of bytes that were moved before the
    /// failure, so callers can tell a clean failure from a partial one.
    #[error("transfer failed after {transferred} of {expected} bytes: {reason}")]
    Transfer {
        /// Bytes actually transferred.
        transferred: u64,
        /// Bytes that were requested.
        expected: u64,
        /// What interrupted the transfer.
        reason: String,
    },

    /// An injected source path failed validation.
    #[error("invalid source '{path}': {reason}")]
    Validation {
        /// Filesystem path that was rejected.
        path: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Another error with a description of what was being done.
    #[error("{context}: {source}")]
    Context {
        /// Which path, entry or operation failed.
        context: String,
        /// The underlying error.
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Returns the kind of this error, looking through any context layers.
    ///
    /// # Example
    ///
    /// ```rust
    /// use iso_archiver::{Error, ErrorKind};
    ///
    /// let err = Error::validation("/tmp", "not a regular file").context("inject /boot");
    /// assert_eq!(err.kind(), ErrorKind::Validation);
    /// ```
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Io(_) | Error::Transfer { .. } => ErrorKind::Io,
            Error::Open { .. } => ErrorKind::Open,
            Error::Decode { .. } => ErrorKind::Decode,
            Error::Encode { .. } => ErrorKind::Encode,
            Error::Option { .. } => ErrorKind::Option,
            Error::Validation { .. } => ErrorKind::Validation,
            Error::Context { source, .. } => source.kind(),
        }
    }

    /// Returns the innermost error, skipping context layers.
    pub fn root(&self) -> &Error {
        match self {
            Error::Context { source, .. } => source.root(),
            other => other,
        }
    }

    /// Returns the number of bytes moved before a transfer failure.
    ///
    /// Only [`Error::Transfer`] carries a count; every other variant returns
    /// `None`.
    pub fn transferred(&self) -> Option<u64> {
        match self.root() {
            Error::Transfer { transferred, .. } => Some(*transferred),
            _ => None,
        }
    }

    /// Returns `true` if the image itself is damaged or unrecognized.
    pub fn is_bad_archive(&self) -> bool {
        matches!(self.kind(), ErrorKind::Open | ErrorKind::Decode)
    }

    /// Wraps this error with a description of what was being done.
    pub fn context(self, context: impl Into<String>) -> Self {
        Error::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Creates an Open error.
    pub fn open(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Open {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Creates a Decode error.
    pub fn decode(offset: u64, reason: impl Into<String>) -> Self {
        Error::Decode {
            offset,
            reason: reason.into(),
        }
    }

    /// Creates an Encode error.
    pub fn encode(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Encode {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Creates an Option error.
    pub fn option(option: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Option {
            option: option.into(),
            reason: reason.into(),
        }
    }

    /// Creates a Transfer error.
    pub fn transfer(transferred: u64, expected: u64, reason: impl Into<String>) -> Self {
        Error::Transfer {
            transferred,
            expected,
            reason: reason.into(),
        }
    }

    /// Creates a Validation error.
    pub fn validation(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Validation {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Extension methods for attaching context to results.
pub trait ResultExt<T> {
    /// Wraps the error, if any, with a fixed context string.
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Wraps the error, if any, with a lazily built context string.
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: Into<String>,
        F: FnOnce() -> C;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.context(context))
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: Into<String>,
        F: FnOnce() -> C,
    {
        self.map_err(|e| e.context(f()))
    }
}

/// A specialized Result type for ISO image operations.
pub type Result<T> = std::result::Result<T, Error>;
