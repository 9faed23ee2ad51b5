//! # iso-archiver
//!
//! Compose, extract and patch ISO9660 disk images.
//!
//! The crate streams entries between a decoder and an encoder, both backed
//! by libarchive: it reads the entries of an existing archive (an ISO image,
//! or anything else libarchive recognizes, compressed or not), rewrites them
//! into a new ISO9660 image, and injects
//! files from the host filesystem, honoring authoring options such as
//! El Torito boot parameters. Payloads move in fixed 8 KiB chunks, so memory
//! use does not depend on image size.
//!
//! ## Quick Start
//!
//! ### Building an Image From a Directory
//!
//! ```rust,no_run
//! use iso_archiver::{FileMapping, Result, create_iso};
//!
//! fn main() -> Result<()> {
//!     let mapping = FileMapping::from_dir("./rootfs")?;
//!     let result = create_iso("out.iso", &mapping, &["volume-id=ROOTFS"])?;
//!     println!("{} entries, {} bytes", result.total_entries(), result.image_size);
//!     Ok(())
//! }
//! ```
//!
//! ### Patching a Bootable Image
//!
//! Every entry of the source image is copied, then the mapped files are
//! appended. Boot options are given the way libarchive spells them.
//!
//! ```rust,no_run
//! use iso_archiver::{FileMapping, Result, patch_iso};
//!
//! fn main() -> Result<()> {
//!     let mapping = FileMapping::new().with("./ks.cfg", "/ks.cfg")?;
//!     patch_iso(
//!         "boot.iso",
//!         "boot-patched.iso",
//!         &mapping,
//!         &[
//!             "boot-type=no-emulation",
//!             "boot=isolinux/isolinux.bin",
//!             "boot-catalog=boot.catalog",
//!             "boot-load-size=4",
//!             "boot-info-table",
//!         ],
//!     )?;
//!     Ok(())
//! }
//! ```
//!
//! ### Reading Entries
//!
//! ```rust,no_run
//! use iso_archiver::{Reader, Result};
//!
//! fn main() -> Result<()> {
//!     let mut reader = Reader::open("image.iso")?;
//!     while let Some(entry) = reader.next_entry()? {
//!         println!("{} {:>10} {}", entry.mode_string(), entry.size(), entry.path());
//!     }
//!     reader.close();
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli` | No | Command-line interface tool |
//!
//! Compression filters (gzip, bzip2, xz, zstd, lz4) are always available
//! through the vendored libarchive.
//!
//! ## Error Handling
//!
//! All operations return [`Result<T>`]. Errors carry context describing the
//! path, entry and operation that failed, and [`Error::kind`] sees through
//! that context:
//!
//! ```rust,no_run
//! use iso_archiver::{ErrorKind, extract_iso};
//!
//! match extract_iso("image.iso", "./out") {
//!     Ok(result) => println!("{} files", result.entries_extracted),
//!     Err(e) if e.kind() == ErrorKind::Validation => eprintln!("unsafe path: {}", e),
//!     Err(e) if e.is_bad_archive() => eprintln!("not a usable image: {}", e),
//!     Err(e) => eprintln!("error: {}", e),
//! }
//! ```
//!
//! ## Minimum Supported Rust Version (MSRV)
//!
//! This crate requires **Rust 1.85** or later.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

/// Size of the window used by every payload copy (8 KiB).
pub const READ_BUFFER_SIZE: usize = 8192;

pub mod archive_path;
pub mod chunk;
pub mod codec;
pub mod entry;
pub mod error;
pub mod mapping;
pub mod pipeline;
pub mod progress;
pub mod read;
pub mod timestamp;
pub mod write;

pub use archive_path::{ArchivePath, PathError};
pub use chunk::{ChunkSource, IoSource};
pub use codec::{Format, WriteSummary};
pub use entry::{Entry, FileType};
pub use error::{Error, ErrorKind, Result, ResultExt};
pub use mapping::{FileMapping, MappedFile};
pub use pipeline::{
    ExtractResult, MergePolicy, PatchResult, TransformOptions, create_iso, create_iso_with,
    extract_iso, extract_iso_with, patch_iso, patch_iso_with,
};
pub use progress::{NoProgress, ProgressReporter, StatisticsProgress};
pub use read::Reader;
pub use timestamp::Timestamp;
pub use write::{Writer, WriterConfig};
