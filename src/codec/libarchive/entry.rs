//! Conversion between [`Entry`] and `struct archive_entry`.

use std::ptr::NonNull;

use libarchive2_sys as sys;

use super::{c_string, optional_str};
use crate::entry::{Entry, FileType};
use crate::timestamp::Timestamp;
use crate::{Error, Result};

/// An owned `archive_entry`, freed on drop.
pub(crate) struct RawEntry(NonNull<sys::archive_entry>);

impl RawEntry {
    /// Builds a libarchive entry carrying `entry`'s metadata.
    pub(crate) fn from_entry(entry: &Entry) -> Result<Self> {
        let path = entry.path();
        let c_path =
            c_string(path).ok_or_else(|| Error::encode(path, "path contains a NUL byte"))?;
        let size = if entry.file_type().has_payload() {
            i64::try_from(entry.size())
                .map_err(|_| Error::encode(path, format!("size {} is too large", entry.size())))?
        } else {
            0
        };
        let uid = id_value(path, "uid", entry.uid())?;
        let gid = id_value(path, "gid", entry.gid())?;
        let c_target = match entry.link_target() {
            Some(target) => Some(
                c_string(target)
                    .ok_or_else(|| Error::encode(path, "link target contains a NUL byte"))?,
            ),
            None => None,
        };

        let raw = NonNull::new(unsafe { sys::archive_entry_new() })
            .ok_or_else(|| Error::encode(path, "out of memory"))?;
        let out = Self(raw);
        let e = out.as_ptr();
        unsafe {
            sys::archive_entry_set_pathname_utf8(e, c_path.as_ptr());
            sys::archive_entry_set_filetype(e, entry.file_type().mode_bits() as _);
            sys::archive_entry_set_perm(e, entry.permissions() as _);
            sys::archive_entry_set_size(e, size);
            if let Some(uid) = uid {
                sys::archive_entry_set_uid(e, uid);
            }
            if let Some(gid) = gid {
                sys::archive_entry_set_gid(e, gid);
            }
            if let Some(ts) = entry.modified() {
                sys::archive_entry_set_mtime(e, ts.as_unix_secs() as _, ts.subsec_nanos() as _);
            }
            if let Some(ts) = entry.accessed() {
                sys::archive_entry_set_atime(e, ts.as_unix_secs() as _, ts.subsec_nanos() as _);
            }
            if let Some(target) = &c_target {
                sys::archive_entry_set_symlink_utf8(e, target.as_ptr());
            }
        }
        Ok(out)
    }

    pub(crate) fn as_ptr(&self) -> *mut sys::archive_entry {
        self.0.as_ptr()
    }
}

impl Drop for RawEntry {
    fn drop(&mut self) {
        unsafe { sys::archive_entry_free(self.0.as_ptr()) }
    }
}

fn id_value(path: &str, what: &str, id: Option<i64>) -> Result<Option<i64>> {
    match id {
        Some(id) if u32::try_from(id).is_err() => Err(Error::encode(
            path,
            format!("{} {} does not fit in 32 bits", what, id),
        )),
        other => Ok(other),
    }
}

/// Copies the header libarchive just decoded into an owned [`Entry`].
///
/// # Safety
///
/// `raw` must point to the entry returned by the last successful
/// `archive_read_next_header`.
pub(crate) unsafe fn to_entry(raw: *mut sys::archive_entry, offset: u64) -> Result<Entry> {
    unsafe {
        let path = optional_str(sys::archive_entry_pathname_utf8(raw))
            .or_else(|| optional_str(sys::archive_entry_pathname(raw)))
            .ok_or_else(|| Error::decode(offset, "entry has no readable path"))?;
        let path = match path.trim_end_matches('/') {
            "" => path,
            trimmed => trimmed,
        };

        let mode_type = sys::archive_entry_filetype(raw) as u32;
        let file_type = FileType::from_mode_bits(mode_type).ok_or_else(|| {
            Error::decode(offset, format!("'{}' has unknown type {:o}", path, mode_type))
        })?;

        let mut entry = Entry::new(path, file_type);
        entry.set_permissions(sys::archive_entry_perm(raw) as u32);

        if let Some(target) = optional_str(sys::archive_entry_hardlink_utf8(raw))
            .or_else(|| optional_str(sys::archive_entry_hardlink(raw)))
        {
            log::warn!("'{}' is a hard link to '{}', kept as an empty file", path, target);
        }
        if file_type.has_payload() {
            let size = sys::archive_entry_size(raw);
            entry.set_size(u64::try_from(size).unwrap_or(0));
        }

        if sys::archive_entry_uid_is_set(raw) != 0 {
            entry.set_uid(Some(sys::archive_entry_uid(raw)));
        }
        if sys::archive_entry_gid_is_set(raw) != 0 {
            entry.set_gid(Some(sys::archive_entry_gid(raw)));
        }
        if sys::archive_entry_mtime_is_set(raw) != 0 {
            entry.set_modified(Some(timestamp(
                sys::archive_entry_mtime(raw) as i64,
                sys::archive_entry_mtime_nsec(raw) as i64,
            )));
        }
        if sys::archive_entry_atime_is_set(raw) != 0 {
            entry.set_accessed(Some(timestamp(
                sys::archive_entry_atime(raw) as i64,
                sys::archive_entry_atime_nsec(raw) as i64,
            )));
        }

        if file_type == FileType::Symlink {
            let target = optional_str(sys::archive_entry_symlink_utf8(raw))
                .or_else(|| optional_str(sys::archive_entry_symlink(raw)))
                .unwrap_or("");
            entry.set_link_target(Some(target.to_string()));
        }
        Ok(entry)
    }
}

fn timestamp(secs: i64, nanos: i64) -> Timestamp {
    Timestamp::new(secs, nanos.clamp(0, 999_999_999) as u32)
}
