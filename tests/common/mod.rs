//! Shared test utilities for integration tests.
//!
//! Note: `#![allow(dead_code)]` is required because each integration test file
//! compiles as a separate crate and may only use a subset of these helpers.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use iso_archiver::{Entry, Format, Reader, Writer};

/// Writes `files` under `dir`, creating parent directories, and returns the
/// host paths in the same order.
pub fn write_tree(dir: &Path, files: &[(&str, &[u8])]) -> Vec<PathBuf> {
    files
        .iter()
        .map(|(rel, data)| {
            let path = dir.join(rel);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).expect("create parent");
            }
            fs::write(&path, data).expect("write file");
            path
        })
        .collect()
}

/// Builds an image at `path` from explicit entries and their payloads.
pub fn build_image(path: &Path, options: &[&str], entries: &[(Entry, &[u8])]) {
    let mut writer = Writer::config(Format::Iso9660)
        .options(options)
        .expect("valid options")
        .open(path)
        .expect("open output");
    for (entry, data) in entries {
        writer.write_entry(entry).expect("write entry");
        writer.write(data).expect("write payload");
    }
    writer.close().expect("close image");
}

/// Builds an image of regular files at `path`.
pub fn build_files(path: &Path, files: &[(&str, &[u8])]) {
    let entries: Vec<(Entry, &[u8])> = files
        .iter()
        .map(|(name, data)| (Entry::file(*name, data.len() as u64), *data))
        .collect();
    build_image(path, &[], &entries);
}

/// Builds a tar archive at `path`. Entries whose name ends in `/` become
/// directories.
pub fn build_tar(path: &Path, files: &[(&str, &[u8])]) {
    let mut builder = tar::Builder::new(Vec::new());
    for (name, data) in files {
        let mut header = tar::Header::new_ustar();
        if name.ends_with('/') {
            header.set_entry_type(tar::EntryType::Directory);
            header.set_mode(0o755);
            header.set_size(0);
        } else {
            header.set_entry_type(tar::EntryType::Regular);
            header.set_mode(0o640);
            header.set_size(data.len() as u64);
        }
        header.set_mtime(1_650_000_000);
        header.set_uid(1000);
        header.set_gid(1000);
        header.set_cksum();
        builder
            .append_data(&mut header, name.trim_end_matches('/'), *data)
            .expect("append tar entry");
    }
    fs::write(path, builder.into_inner().expect("finish tar")).expect("write tar");
}

/// Decodes every entry of a reader together with its payload.
pub fn drain(mut reader: Reader) -> Vec<(Entry, Vec<u8>)> {
    let mut out = Vec::new();
    while let Some(entry) = reader.next_entry().expect("next entry") {
        let mut data = Vec::new();
        if entry.is_file() {
            reader.copy_to(&mut data, entry.size()).expect("copy payload");
        }
        out.push((entry, data));
    }
    reader.close();
    out
}

/// Decodes the image at `path`.
pub fn read_image(path: &Path) -> Vec<(Entry, Vec<u8>)> {
    drain(Reader::open(path).expect("open image"))
}

/// Decodes an in-memory image.
pub fn read_bytes(bytes: Vec<u8>) -> Vec<(Entry, Vec<u8>)> {
    drain(Reader::from_memory(bytes).expect("open image"))
}

/// Regular files of a decoded image as (path, payload) pairs.
pub fn files(decoded: &[(Entry, Vec<u8>)]) -> Vec<(String, Vec<u8>)> {
    decoded
        .iter()
        .filter(|(e, _)| e.is_file())
        .map(|(e, d)| (e.path().to_string(), d.clone()))
        .collect()
}
