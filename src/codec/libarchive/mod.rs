//! Sessions over the vendored libarchive.
//!
//! [`ReadSession`] decodes any format and compression filter libarchive
//! recognizes; [`WriteSession`] authors ISO9660 images. Both own their
//! `struct archive` handle and free it on drop. Status codes other than
//! `ARCHIVE_OK` are turned into crate errors carrying libarchive's message.

mod entry;
mod read;
mod write;

use std::ffi::{CStr, CString, c_char};
use std::path::Path;

use libarchive2_sys as sys;

pub(crate) use read::ReadSession;
pub(crate) use write::WriteSession;

pub(crate) const OK: i32 = sys::ARCHIVE_OK as i32;
pub(crate) const EOF: i32 = sys::ARCHIVE_EOF as i32;

/// Block size handed to `archive_read_open_filename`.
const READ_BLOCK_SIZE: usize = 10_240;

/// Returns the last error recorded on `archive`.
///
/// # Safety
///
/// `archive` must be a live handle.
pub(crate) unsafe fn error_message(archive: *mut sys::archive) -> String {
    unsafe {
        let msg = sys::archive_error_string(archive);
        if msg.is_null() {
            format!("libarchive error {}", sys::archive_errno(archive))
        } else {
            CStr::from_ptr(msg).to_string_lossy().into_owned()
        }
    }
}

/// Borrows a NUL-terminated string owned by libarchive.
///
/// # Safety
///
/// `ptr` must be null or point to a NUL-terminated string that outlives
/// the returned value.
pub(crate) unsafe fn optional_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        None
    } else {
        unsafe { CStr::from_ptr(ptr) }.to_str().ok()
    }
}

pub(crate) fn c_string(s: &str) -> Option<CString> {
    CString::new(s).ok()
}

#[cfg(unix)]
pub(crate) fn c_path(path: &Path) -> Option<CString> {
    use std::os::unix::ffi::OsStrExt;
    CString::new(path.as_os_str().as_bytes()).ok()
}

#[cfg(not(unix))]
pub(crate) fn c_path(path: &Path) -> Option<CString> {
    path.to_str().and_then(c_string)
}
