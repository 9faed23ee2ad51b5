use std::fs::{self, File};
use std::path::Path;

use super::{MergePolicy, PatchResult, Reporting, TransformOptions};
use crate::chunk::IoSource;
use crate::entry::Entry;
use crate::mapping::{FileMapping, MappedFile};
use crate::progress::{NoProgress, ProgressReporter};
use crate::read::Reader;
use crate::write::Writer;
use crate::{Error, Result, ResultExt};

/// Builds a new image at `dest` holding the files of `mapping`.
///
/// An empty image is written to a temporary file next to `dest` and then
/// patched into `dest`. The temporary file is removed whether or not the
/// patch succeeds.
pub fn create_iso<S: AsRef<str>>(
    dest: impl AsRef<Path>,
    mapping: &FileMapping,
    directives: &[S],
) -> Result<PatchResult> {
    create_iso_with(
        dest,
        mapping,
        &TransformOptions::new().directives(directives),
        &mut NoProgress,
    )
}

/// [`create_iso`] with explicit options and progress reporting.
pub fn create_iso_with(
    dest: impl AsRef<Path>,
    mapping: &FileMapping,
    options: &TransformOptions,
    progress: &mut dyn ProgressReporter,
) -> Result<PatchResult> {
    let dest = dest.as_ref();
    let dir = match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let scratch = tempfile::Builder::new()
        .prefix(".iso-archiver-")
        .suffix(".iso")
        .tempfile_in(dir)
        .map_err(|e| Error::open(dir.display().to_string(), e.to_string()))?
        .into_temp_path();
    log::debug!("empty base image at {}", scratch.display());

    Writer::open(&scratch, options.format)?
        .close()
        .with_context(|| format!("creating empty image for {}", dest.display()))?;

    let result = patch_iso_with(&scratch, dest, mapping, options, progress);
    if let Err(e) = scratch.close() {
        log::warn!("failed to remove temporary image: {}", e);
    }
    result
}

/// Copies `source` to `dest` and appends the files of `mapping`.
///
/// Every source entry is copied in stored order, then each mapped file is
/// injected in mapping order. A mapped path that is missing or is not a
/// regular file fails with [`Error::Validation`] before anything is written
/// for it.
pub fn patch_iso<S: AsRef<str>>(
    source: impl AsRef<Path>,
    dest: impl AsRef<Path>,
    mapping: &FileMapping,
    directives: &[S],
) -> Result<PatchResult> {
    patch_iso_with(
        source,
        dest,
        mapping,
        &TransformOptions::new().directives(directives),
        &mut NoProgress,
    )
}

/// [`patch_iso`] with explicit options and progress reporting.
pub fn patch_iso_with(
    source: impl AsRef<Path>,
    dest: impl AsRef<Path>,
    mapping: &FileMapping,
    options: &TransformOptions,
    progress: &mut dyn ProgressReporter,
) -> Result<PatchResult> {
    let source = source.as_ref();
    let dest = dest.as_ref();
    let mut reader = Reader::open(source)?;
    let mut writer = Writer::config(options.format)
        .options(&options.directives)?
        .open(dest)?;
    let mut result = PatchResult::default();

    while let Some(entry) = reader.next_entry()? {
        if options.merge_policy == MergePolicy::Replace
            && !entry.is_dir()
            && mapping.contains_target(entry.path())
        {
            log::debug!("replacing '{}' from {}", entry.path(), source.display());
            progress.on_entry_start(entry.path(), entry.size());
            progress.on_entry_complete(entry.path(), false);
            result.entries_replaced += 1;
            continue;
        }

        progress.on_entry_start(entry.path(), entry.size());
        writer.write_entry(&entry)?;
        let size = if entry.file_type().has_payload() {
            entry.size()
        } else {
            0
        };
        let copied = writer
            .copy_from(Reporting::new(&mut reader, progress, size), size)
            .with_context(|| format!("copying '{}' from {}", entry.path(), source.display()))?;
        progress.on_entry_complete(entry.path(), true);
        result.entries_copied += 1;
        result.bytes_written += copied;
    }
    reader.close();

    for item in mapping {
        let copied = inject(&mut writer, item, progress)?;
        result.entries_injected += 1;
        result.bytes_written += copied;
    }

    let summary = writer.close()?;
    result.image_size = summary.image_size;
    log::info!(
        "wrote {}: {} copied, {} injected, {} replaced, {} bytes",
        dest.display(),
        result.entries_copied,
        result.entries_injected,
        result.entries_replaced,
        result.image_size
    );
    Ok(result)
}

fn inject(
    writer: &mut Writer,
    item: &MappedFile,
    progress: &mut dyn ProgressReporter,
) -> Result<u64> {
    let display = item.source.display().to_string();
    let meta = fs::metadata(&item.source).map_err(|e| Error::validation(&display, e.to_string()))?;
    if !meta.is_file() {
        return Err(Error::validation(&display, "not a regular file"));
    }

    let path = item.target.trim_start_matches('/');
    let entry = Entry::from_metadata(path, &meta);
    let file = File::open(&item.source).map_err(|e| Error::validation(&display, e.to_string()))?;

    progress.on_entry_start(path, entry.size());
    writer.write_entry(&entry)?;
    let copied = writer
        .copy_from(
            Reporting::new(IoSource(file), progress, entry.size()),
            entry.size(),
        )
        .with_context(|| format!("injecting {} as '{}'", display, item.target))?;
    progress.on_entry_complete(path, true);
    log::debug!(
        "injected {} as '{}' mode {:o}",
        display,
        item.target,
        entry.permissions()
    );
    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use tempfile::TempDir;

    fn contents(path: &Path) -> Vec<(String, Vec<u8>)> {
        let mut reader = Reader::open(path).unwrap();
        let mut out = Vec::new();
        while let Some(entry) = reader.next_entry().unwrap() {
            let mut data = Vec::new();
            if entry.is_file() {
                reader.copy_to(&mut data, entry.size()).unwrap();
            }
            out.push((entry.path().to_string(), data));
        }
        out
    }

    #[test]
    fn test_create_then_patch() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.txt");
        let b = dir.path().join("b.txt");
        fs::write(&a, b"one").unwrap();
        fs::write(&b, b"two!").unwrap();

        let base = dir.path().join("base.iso");
        let mapping = FileMapping::new().with(&a, "/a.txt").unwrap();
        let created = create_iso(&base, &mapping, &["volume-id=BASE"]).unwrap();
        assert_eq!(created.entries_copied, 0);
        assert_eq!(created.entries_injected, 1);

        let out = dir.path().join("out.iso");
        let mapping = FileMapping::new().with(&b, "/sub/b.txt").unwrap();
        let patched = patch_iso(&base, &out, &mapping, &[] as &[&str]).unwrap();
        assert_eq!(patched.entries_copied, 1);
        assert_eq!(patched.entries_injected, 1);
        assert_eq!(patched.bytes_written, 7);

        let files: Vec<_> = contents(&out)
            .into_iter()
            .filter(|(_, d)| !d.is_empty())
            .collect();
        assert_eq!(
            files,
            [
                ("a.txt".to_string(), b"one".to_vec()),
                ("sub/b.txt".to_string(), b"two!".to_vec())
            ]
        );
    }

    #[test]
    fn test_create_leaves_no_scratch_file() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("empty.iso");
        create_iso(&out, &FileMapping::new(), &[] as &[&str]).unwrap();
        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, [std::ffi::OsString::from("empty.iso")]);
    }

    #[test]
    fn test_scratch_removed_on_failure() {
        let dir = TempDir::new().unwrap();
        let mapping = FileMapping::new()
            .with(dir.path().join("missing"), "/m")
            .unwrap();
        let out = dir.path().join("out.iso");
        let err = create_iso(&out, &mapping, &[] as &[&str]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        let leftovers = fs::read_dir(dir.path())
            .unwrap()
            .filter(|e| {
                e.as_ref()
                    .unwrap()
                    .file_name()
                    .to_string_lossy()
                    .starts_with(".iso-archiver-")
            })
            .count();
        assert_eq!(leftovers, 0);
    }

    #[test]
    fn test_replace_policy_drops_source_entry() {
        let dir = TempDir::new().unwrap();
        let old = dir.path().join("old");
        let new = dir.path().join("new");
        fs::write(&old, b"old").unwrap();
        fs::write(&new, b"newer").unwrap();

        let base = dir.path().join("base.iso");
        create_iso(&base, &FileMapping::new().with(&old, "/a.txt").unwrap(), &[] as &[&str])
            .unwrap();

        let out = dir.path().join("out.iso");
        let options = TransformOptions::new().merge_policy(MergePolicy::Replace);
        let result = patch_iso_with(
            &base,
            &out,
            &FileMapping::new().with(&new, "a.txt").unwrap(),
            &options,
            &mut NoProgress,
        )
        .unwrap();
        assert_eq!(result.entries_replaced, 1);
        assert_eq!(contents(&out), [("a.txt".to_string(), b"newer".to_vec())]);
    }

    #[derive(Default)]
    struct Recorder {
        started: Vec<String>,
    }

    impl ProgressReporter for Recorder {
        fn on_entry_start(&mut self, entry_name: &str, _size: u64) {
            self.started.push(entry_name.to_string());
        }
    }

    #[test]
    fn test_rejected_injection_writes_no_header() {
        let dir = TempDir::new().unwrap();
        let not_a_file = dir.path().join("subdir");
        fs::create_dir(&not_a_file).unwrap();
        let mapping = FileMapping::new().with(&not_a_file, "/cfg/subdir").unwrap();

        let mut writer = Writer::open(dir.path().join("out.iso"), crate::Format::Iso9660).unwrap();
        writer.write_entry(&Entry::directory("keep")).unwrap();
        let mut recorder = Recorder::default();
        for item in &mapping {
            let err = inject(&mut writer, item, &mut recorder).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation);
        }
        assert!(recorder.started.is_empty());
        assert_eq!(writer.entries(), 1);
        writer.close().unwrap();

        let missing = FileMapping::new()
            .with(dir.path().join("gone"), "/gone")
            .unwrap();
        let mut writer = Writer::open(dir.path().join("out2.iso"), crate::Format::Iso9660).unwrap();
        for item in &missing {
            assert!(inject(&mut writer, item, &mut recorder).is_err());
        }
        assert!(recorder.started.is_empty());
        assert_eq!(writer.entries(), 0);
    }

    #[test]
    fn test_bad_option_fails_before_output_exists() {
        let dir = TempDir::new().unwrap();
        let base = dir.path().join("base.iso");
        create_iso(&base, &FileMapping::new(), &[] as &[&str]).unwrap();
        let out = dir.path().join("out.iso");
        let err = patch_iso(&base, &out, &FileMapping::new(), &["bogus=1"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Option);
        assert!(!out.exists());
    }
}
