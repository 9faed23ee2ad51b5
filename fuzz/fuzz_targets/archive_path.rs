//! Fuzz target for ArchivePath::new with arbitrary string input.
//!
//! Run with: cargo +nightly fuzz run archive_path
//!
//! Properties checked on every accepted path:
//! - no `.` or `..` segment and no empty segment
//! - no leading slash and no NUL byte
//! - normalizing twice is a no-op
//! - resolving under a root never leaves it

#![no_main]

use libfuzzer_sys::fuzz_target;
use std::path::Path;

fuzz_target!(|data: &[u8]| {
    let Ok(path_str) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(path) = iso_archiver::ArchivePath::new(path_str) else {
        return;
    };
    let normalized = path.as_str();

    assert!(
        normalized
            .split('/')
            .all(|seg| !seg.is_empty() && seg != "." && seg != ".."),
        "bad segment in normalized path: {:?}",
        normalized
    );
    assert!(!normalized.starts_with('/'), "rooted path: {:?}", normalized);
    assert!(!normalized.contains('\0'), "NUL byte: {:?}", normalized);

    let again = iso_archiver::ArchivePath::new(normalized).expect("normalized path reparses");
    assert_eq!(again.as_str(), normalized);

    let root = Path::new("/fuzz-root");
    if let Ok(resolved) = path.resolve_under(root) {
        assert!(resolved.starts_with(root), "escaped root: {:?}", resolved);
    }
});
