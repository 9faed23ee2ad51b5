//! Filesystem to archive path mappings.
//!
//! A [`FileMapping`] lists which host files are injected into an image and
//! under which archive path. Targets are stored in rooted form (`/dir/name`)
//! with forward slashes regardless of the host's separator. Iteration order
//! is insertion order, and the pipeline injects files in that order.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::{ArchivePath, Error, Result};

/// One source file and the archive path it is written to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedFile {
    /// Absolute path of the host file.
    pub source: PathBuf,
    /// Rooted archive path, e.g. `/isolinux/isolinux.cfg`.
    pub target: String,
}

/// An ordered set of (host path, archive path) pairs with unique targets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileMapping {
    files: Vec<MappedFile>,
}

impl FileMapping {
    /// Creates an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a pair. The target is normalized to rooted form.
    ///
    /// Mapping a target that is already present replaces the earlier source
    /// and keeps the original position, so targets stay unique.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the target is empty or escapes the
    /// archive root.
    pub fn insert(&mut self, source: impl Into<PathBuf>, target: &str) -> Result<()> {
        let source = source.into();
        let target = ArchivePath::new(target)
            .map_err(|e| Error::validation(source.display().to_string(), e.to_string()))?
            .to_rooted();
        match self.files.iter_mut().find(|f| f.target == target) {
            Some(existing) => existing.source = source,
            None => self.files.push(MappedFile { source, target }),
        }
        Ok(())
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, source: impl Into<PathBuf>, target: &str) -> Result<Self> {
        self.insert(source, target)?;
        Ok(self)
    }

    /// Maps every non-directory under `base` to `/<relative path>`.
    ///
    /// The walk is sorted by file name so the resulting order, and therefore
    /// the layout of the produced image, is reproducible. Symlinks are not
    /// followed by the walk; a symlink is mapped like any other
    /// non-directory, and injection reads whatever it points at.
    pub fn from_dir(base: impl AsRef<Path>) -> Result<Self> {
        let base = base.as_ref();
        let mut mapping = Self::new();
        for item in WalkDir::new(base).min_depth(1).sort_by_file_name() {
            let item = item.map_err(|e| {
                let path = e
                    .path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| base.display().to_string());
                Error::from(std::io::Error::from(e)).context(format!("walk {}", path))
            })?;
            if item.file_type().is_dir() {
                continue;
            }
            let rel = item.path().strip_prefix(base).map_err(|_| {
                Error::validation(item.path().display().to_string(), "outside base directory")
            })?;
            let target: Vec<String> = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            mapping.insert(item.path(), &target.join("/"))?;
        }
        log::debug!("mapped {} files from {}", mapping.len(), base.display());
        Ok(mapping)
    }

    /// Number of pairs.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Returns `true` if the mapping is empty.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Iterates over the pairs in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, MappedFile> {
        self.files.iter()
    }

    /// Returns `true` if some pair targets the given archive path (any
    /// spelling).
    pub fn contains_target(&self, target: &str) -> bool {
        match ArchivePath::new(target) {
            Ok(path) => {
                let rooted = path.to_rooted();
                self.files.iter().any(|f| f.target == rooted)
            }
            Err(_) => false,
        }
    }
}

impl<'a> IntoIterator for &'a FileMapping {
    type Item = &'a MappedFile;
    type IntoIter = std::slice::Iter<'a, MappedFile>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_insert_normalizes_target() {
        let mut m = FileMapping::new();
        m.insert("/tmp/b.txt", "a.txt").unwrap();
        m.insert("/tmp/c.txt", "//dir/./c.txt").unwrap();
        let targets: Vec<_> = m.iter().map(|f| f.target.as_str()).collect();
        assert_eq!(targets, ["/a.txt", "/dir/c.txt"]);
        assert!(m.contains_target("a.txt"));
        assert!(m.contains_target("/dir/c.txt"));
        assert!(!m.contains_target("/dir"));
    }

    #[test]
    fn test_duplicate_target_replaces_source() {
        let m = FileMapping::new()
            .with("/one", "/x")
            .unwrap()
            .with("/two", "/y")
            .unwrap()
            .with("/three", "x")
            .unwrap();
        assert_eq!(m.len(), 2);
        let first = m.iter().next().unwrap();
        assert_eq!(first.source, PathBuf::from("/three"));
        assert_eq!(first.target, "/x");
    }

    #[test]
    fn test_insert_rejects_traversal() {
        let err = FileMapping::new().with("/etc/passwd", "../passwd").unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Validation);
    }

    #[test]
    fn test_from_dir() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("boot/isolinux")).unwrap();
        std::fs::create_dir_all(dir.path().join("empty")).unwrap();
        std::fs::write(dir.path().join("boot/isolinux/isolinux.bin"), b"x").unwrap();
        std::fs::write(dir.path().join("z.txt"), b"z").unwrap();
        std::fs::write(dir.path().join("a.txt"), b"a").unwrap();

        let m = FileMapping::from_dir(dir.path()).unwrap();
        let targets: Vec<_> = m.iter().map(|f| f.target.as_str()).collect();
        assert_eq!(
            targets,
            ["/a.txt", "/boot/isolinux/isolinux.bin", "/z.txt"]
        );
        assert_eq!(m.iter().next().unwrap().source, dir.path().join("a.txt"));
    }

    #[test]
    fn test_from_missing_dir() {
        let dir = TempDir::new().unwrap();
        let err = FileMapping::from_dir(dir.path().join("nope")).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Io);
    }
}
