//! Error reporting for bad inputs, bad options and byte-count mismatches.

mod common;

use std::fs;
use std::io::Cursor;

use iso_archiver::{
    Entry, ErrorKind, FileMapping, Format, IoSource, Reader, Writer, create_iso, extract_iso,
    patch_iso,
};
use tempfile::TempDir;

const SECTOR: usize = 2048;

fn sample_image() -> Vec<u8> {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("s.iso");
    common::build_files(&path, &[("a.txt", b"alpha"), ("dir/b.txt", &[7u8; 5000])]);
    fs::read(path).unwrap()
}

// =============================================================================
// Unreadable inputs
// =============================================================================

#[test]
fn test_unrecognized_bytes_fail_open() {
    let noise: Vec<u8> = (0..64 * 1024u32)
        .map(|i| (i.wrapping_mul(2_654_435_761) >> 11) as u8 | 0x80)
        .collect();
    let err = Reader::from_memory(noise).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Open);
    assert!(err.is_bad_archive());
}

#[test]
fn test_undersized_image_is_not_recognized() {
    // Shorter than the system area plus eight descriptors.
    let mut image = sample_image();
    image.truncate(20 * SECTOR);
    match Reader::from_memory(image) {
        Err(err) => assert_eq!(err.kind(), ErrorKind::Open),
        Ok(mut reader) => {
            // The zeroed system area passes for an empty tar archive.
            assert!(reader.next_entry().unwrap().is_none());
            let name = reader.format_name().unwrap_or_default();
            assert!(!name.starts_with("ISO9660"), "{}", name);
        }
    }
}

#[test]
fn test_truncated_image_fails_to_decode() {
    let mut image = sample_image();
    // Keep the descriptors, drop the directories and data behind them.
    image.truncate(24 * SECTOR);
    let result = Reader::from_memory(image).and_then(|mut reader| {
        while let Some(entry) = reader.next_entry()? {
            reader.copy_to(std::io::sink(), entry.size())?;
        }
        Ok(())
    });
    let err = result.unwrap_err();
    assert!(
        matches!(err.kind(), ErrorKind::Open | ErrorKind::Decode | ErrorKind::Io),
        "{}",
        err
    );
}

#[test]
fn test_corrupt_source_aborts_patch() {
    let temp = TempDir::new().unwrap();
    let src = temp.path().join("bad.iso");
    fs::write(&src, b"definitely not an image").unwrap();
    let err = patch_iso(&src, temp.path().join("out.iso"), &FileMapping::new(), &[] as &[&str])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Open);

    let err = extract_iso(&src, temp.path().join("out")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Open);
}

// =============================================================================
// Options
// =============================================================================

#[test]
fn test_option_errors() {
    for bad in [
        "boot-type=floppy-disk",
        "boot-load-size=0",
        "boot-load-size=70000",
        "boot-load-seg=xyz",
        "iso-level=5",
        "unknown-key=1",
        "volume-id=this-volume-identifier-is-far-too-long",
    ] {
        let err = Writer::config(Format::Iso9660).options(&[bad]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Option, "{}", bad);
    }

    Writer::config(Format::Iso9660)
        .options(&["iso9660:!joliet", "joliet", "rockridge=useful", "boot-load-seg=0x7c0"])
        .unwrap();
}

#[test]
fn test_bad_option_in_create_writes_nothing() {
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("out.iso");
    let err = create_iso(&out, &FileMapping::new(), &["boot-type=nope"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Option);
    assert!(!out.exists());
}

#[test]
fn test_missing_boot_image_fails_at_close() {
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("out.iso");
    let err = create_iso(&out, &FileMapping::new(), &["boot=isolinux/isolinux.bin"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Encode);
}

// =============================================================================
// Byte counts
// =============================================================================

#[test]
fn test_oversupply_and_undersupply() {
    let temp = TempDir::new().unwrap();

    let mut writer = Writer::open(temp.path().join("over.iso"), Format::Iso9660).unwrap();
    writer.write_entry(&Entry::file("f", 4)).unwrap();
    let err = writer.write(b"12345").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
    assert_eq!(err.transferred(), Some(4));

    let mut writer = Writer::open(temp.path().join("under.iso"), Format::Iso9660).unwrap();
    writer.write_entry(&Entry::file("f", 10)).unwrap();
    let err = writer
        .copy_from(IoSource(Cursor::new(b"short".to_vec())), 10)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
    assert_eq!(err.transferred(), Some(5));

    let mut writer = Writer::open(temp.path().join("next.iso"), Format::Iso9660).unwrap();
    writer.write_entry(&Entry::file("f", 10)).unwrap();
    writer.write(b"abc").unwrap();
    let err = writer.write_entry(&Entry::file("g", 0)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
}

#[test]
fn test_encode_limits() {
    let temp = TempDir::new().unwrap();
    let mut writer = Writer::open(temp.path().join("x.iso"), Format::Iso9660).unwrap();
    assert_eq!(
        writer.write_entry(&Entry::file("../up", 0)).unwrap_err().kind(),
        ErrorKind::Encode
    );
    assert_eq!(writer.write_entry(&Entry::file("/", 0)).unwrap_err().kind(), ErrorKind::Encode);

    writer.write_entry(&Entry::file("taken", 0)).unwrap();
    assert_eq!(
        writer.write_entry(&Entry::file("taken/child", 0)).unwrap_err().kind(),
        ErrorKind::Encode
    );
    // Same path, different type.
    assert_eq!(
        writer.write_entry(&Entry::directory("taken")).unwrap_err().kind(),
        ErrorKind::Encode
    );
    assert_eq!(writer.entries(), 1);
}

#[test]
fn test_empty_create_has_no_entries() {
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("empty.iso");
    let result = create_iso(&out, &FileMapping::new(), &[] as &[&str]).unwrap();
    assert_eq!(result.total_entries(), 0);
    assert!(common::read_image(&out).is_empty());
    assert_eq!(fs::metadata(&out).unwrap().len() % SECTOR as u64, 0);
}
