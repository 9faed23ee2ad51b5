use std::fs::{self, File, OpenOptions};
use std::path::Path;

use super::{ExtractResult, ReportingSink};
use crate::archive_path::ArchivePath;
use crate::entry::Entry;
use crate::progress::{NoProgress, ProgressReporter};
use crate::read::Reader;
use crate::{Error, Result, ResultExt};

/// Extracts the regular files of `source` under `dest`.
///
/// Parent directories are created as needed. Directories, symlinks and
/// special files are skipped and counted. An entry whose path would land
/// outside `dest` fails with [`Error::Validation`].
pub fn extract_iso(source: impl AsRef<Path>, dest: impl AsRef<Path>) -> Result<ExtractResult> {
    extract_iso_with(source, dest, &mut NoProgress)
}

/// [`extract_iso`] with progress reporting.
pub fn extract_iso_with(
    source: impl AsRef<Path>,
    dest: impl AsRef<Path>,
    progress: &mut dyn ProgressReporter,
) -> Result<ExtractResult> {
    let source = source.as_ref();
    let dest = dest.as_ref();
    let mut reader = Reader::open(source)?;
    let mut result = ExtractResult::default();

    while let Some(entry) = reader.next_entry()? {
        if !entry.is_file() {
            log::trace!("skipping {} '{}'", entry.file_type(), entry.path());
            progress.on_entry_start(entry.path(), 0);
            progress.on_entry_complete(entry.path(), false);
            result.entries_skipped += 1;
            continue;
        }

        let target = ArchivePath::new(entry.path())
            .and_then(|p| p.resolve_under(dest))
            .map_err(|e| Error::validation(entry.path(), e.to_string()))?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .map_err(Error::Io)
                .with_context(|| format!("creating {}", parent.display()))?;
        }

        progress.on_entry_start(entry.path(), entry.size());
        let file = create_file(&target, &entry)?;
        let sink = ReportingSink {
            inner: file,
            progress: &mut *progress,
            done: 0,
            total: entry.size(),
        };
        let copied = reader
            .copy_to(sink, entry.size())
            .with_context(|| format!("extracting '{}' from {}", entry.path(), source.display()))?;
        apply_times(&target, &entry, progress);
        progress.on_entry_complete(entry.path(), true);

        log::debug!(
            "extracted {} mode {:o}",
            target.display(),
            entry.permissions()
        );
        result.entries_extracted += 1;
        result.bytes_extracted += copied;
    }
    reader.close();

    log::info!(
        "extracted {} files ({} bytes) from {}, skipped {}",
        result.entries_extracted,
        result.bytes_extracted,
        source.display(),
        result.entries_skipped
    );
    Ok(result)
}

fn create_file(path: &Path, entry: &Entry) -> Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(entry.permissions() & 0o777);
    }
    #[cfg(not(unix))]
    let _ = entry;
    options
        .open(path)
        .map_err(Error::Io)
        .with_context(|| format!("creating {}", path.display()))
}

fn apply_times(path: &Path, entry: &Entry, progress: &mut dyn ProgressReporter) {
    let Some(modified) = entry.modified() else {
        return;
    };
    if let Err(e) = filetime::set_file_mtime(path, modified.as_file_time()) {
        let message = format!(
            "failed to set modification time on '{}': {}",
            path.display(),
            e
        );
        log::warn!("{}", message);
        progress.on_warning(&message);
    }
}
