//! Normalized archive paths.
//!
//! Archive paths arrive in several spellings: the path mapping uses rooted
//! paths (`/boot/isolinux.bin`), decoded entries use relative ones
//! (`boot/isolinux.bin`), and hand-built entries may carry `./` prefixes or
//! trailing slashes. [`ArchivePath`] folds all of them into one canonical,
//! relative, slash-separated form and rejects anything that could escape
//! the archive root.

use std::fmt;
use std::path::{Component, Path, PathBuf};

/// Maximum length for archive paths (in bytes).
const MAX_PATH_LENGTH: usize = 4096;

/// Why a string is not a valid archive path.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum PathError {
    /// No components remain after normalization.
    #[error("empty path")]
    Empty,
    /// The path contains a NUL byte.
    #[error("contains NUL byte")]
    Nul,
    /// A `..` component would leave the archive root.
    #[error("'..' segment not allowed (path traversal)")]
    Traversal,
    /// The path is longer than the accepted maximum.
    #[error("path exceeds maximum length of {MAX_PATH_LENGTH} bytes")]
    TooLong,
}

/// A canonical archive path: relative, `/`-separated, no empty, `.` or `..`
/// segments.
///
/// # Examples
///
/// ```
/// use iso_archiver::ArchivePath;
///
/// let path = ArchivePath::new("/boot//isolinux/./isolinux.bin").unwrap();
/// assert_eq!(path.as_str(), "boot/isolinux/isolinux.bin");
/// assert_eq!(path.to_rooted(), "/boot/isolinux/isolinux.bin");
/// assert_eq!(path.file_name(), "isolinux.bin");
///
/// assert!(ArchivePath::new("../secret").is_err());
/// assert!(ArchivePath::new("/").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArchivePath(String);

impl ArchivePath {
    /// Normalizes and validates an archive path.
    ///
    /// Leading and repeated slashes and `.` segments are dropped. Backslashes
    /// are kept as ordinary name characters.
    pub fn new(s: &str) -> Result<Self, PathError> {
        if s.contains('\0') {
            return Err(PathError::Nul);
        }
        if s.len() > MAX_PATH_LENGTH {
            return Err(PathError::TooLong);
        }
        let mut parts = Vec::new();
        for segment in s.split('/') {
            match segment {
                "" | "." => {}
                ".." => return Err(PathError::Traversal),
                name => parts.push(name),
            }
        }
        if parts.is_empty() {
            return Err(PathError::Empty);
        }
        Ok(Self(parts.join("/")))
    }

    /// Returns the path as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the path with a leading `/`, the form used by path mappings.
    pub fn to_rooted(&self) -> String {
        format!("/{}", self.0)
    }

    /// Iterates over the path segments.
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }

    /// Number of segments.
    pub fn depth(&self) -> usize {
        self.components().count()
    }

    /// Returns the last segment.
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Returns the parent path, or `None` for a top-level name.
    pub fn parent(&self) -> Option<Self> {
        self.0.rfind('/').map(|pos| Self(self.0[..pos].to_string()))
    }

    /// Resolves the path under `dest_root` for extraction.
    ///
    /// The result is always inside `dest_root`: the path was normalized on
    /// construction and each segment is checked again as a single normal
    /// filesystem component, which rejects drive prefixes and host separators
    /// hidden inside a segment.
    pub fn resolve_under(&self, dest_root: &Path) -> Result<PathBuf, PathError> {
        let mut out = dest_root.to_path_buf();
        for segment in self.components() {
            let mut comps = Path::new(segment).components();
            match (comps.next(), comps.next()) {
                (Some(Component::Normal(name)), None) => out.push(name),
                _ => return Err(PathError::Traversal),
            }
        }
        Ok(out)
    }
}

impl AsRef<str> for ArchivePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArchivePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<&str> for ArchivePath {
    type Error = PathError;

    fn try_from(s: &str) -> Result<Self, PathError> {
        Self::new(s)
    }
}
