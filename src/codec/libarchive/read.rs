use std::ffi::c_void;
use std::path::Path;
use std::ptr::{self, NonNull};

use libarchive2_sys as sys;

use super::entry::to_entry;
use super::{EOF, OK, READ_BLOCK_SIZE, c_path, error_message, optional_str};
use crate::codec::Decoder;
use crate::entry::Entry;
use crate::{Error, Result};

/// A libarchive read handle with every format and filter enabled.
pub(crate) struct ReadSession {
    archive: NonNull<sys::archive>,
    // Backing bytes for `archive_read_open_memory`; must outlive the handle.
    _memory: Option<Box<[u8]>>,
    source: String,
}

impl ReadSession {
    fn new(source: String) -> Result<Self> {
        let archive = NonNull::new(unsafe { sys::archive_read_new() })
            .ok_or_else(|| Error::open(&source, "out of memory"))?;
        let session = Self {
            archive,
            _memory: None,
            source,
        };
        let a = session.raw();
        unsafe {
            if sys::archive_read_support_filter_all(a) != OK
                || sys::archive_read_support_format_all(a) != OK
            {
                return Err(Error::open(&session.source, error_message(a)));
            }
        }
        Ok(session)
    }

    /// Opens the file at `path`.
    pub(crate) fn open_file(path: &Path) -> Result<Self> {
        let session = Self::new(path.display().to_string())?;
        let c_path = c_path(path)
            .ok_or_else(|| Error::open(&session.source, "path cannot be passed to libarchive"))?;
        let a = session.raw();
        if unsafe { sys::archive_read_open_filename(a, c_path.as_ptr(), READ_BLOCK_SIZE as _) }
            != OK
        {
            return Err(Error::open(&session.source, unsafe { error_message(a) }));
        }
        Ok(session)
    }

    /// Opens an in-memory archive.
    pub(crate) fn open_memory(data: Box<[u8]>, source: String) -> Result<Self> {
        let mut session = Self::new(source)?;
        let a = session.raw();
        let status = unsafe {
            sys::archive_read_open_memory(a, data.as_ptr() as *const c_void, data.len() as _)
        };
        session._memory = Some(data);
        if status != OK {
            return Err(Error::open(&session.source, unsafe { error_message(a) }));
        }
        Ok(session)
    }

    fn raw(&self) -> *mut sys::archive {
        self.archive.as_ptr()
    }

    fn position(&self) -> u64 {
        u64::try_from(unsafe { sys::archive_read_header_position(self.raw()) }).unwrap_or(0)
    }
}

impl Decoder for ReadSession {
    fn next_header(&mut self) -> Result<Option<Entry>> {
        let a = self.raw();
        let mut raw = ptr::null_mut();
        let status = unsafe { sys::archive_read_next_header(a, &mut raw) };
        if status == EOF {
            return Ok(None);
        }
        // A warning leaves the entry incomplete, so it is an error here.
        if status != OK || raw.is_null() {
            return Err(Error::decode(self.position(), unsafe { error_message(a) }));
        }
        unsafe { to_entry(raw, self.position()) }.map(Some)
    }

    fn read_data(&mut self, buf: &mut [u8]) -> Result<usize> {
        let a = self.raw();
        let n = unsafe { sys::archive_read_data(a, buf.as_mut_ptr() as *mut c_void, buf.len() as _) };
        if n < 0 {
            return Err(Error::decode(self.position(), unsafe { error_message(a) }));
        }
        Ok(n as usize)
    }

    fn format_name(&self) -> Option<String> {
        unsafe { optional_str(sys::archive_format_name(self.raw())) }.map(str::to_string)
    }

    fn filters(&self) -> Vec<String> {
        let a = self.raw();
        let count = unsafe { sys::archive_filter_count(a) };
        // Index 0 is the innermost filter; report outermost first.
        (0..count)
            .rev()
            .filter_map(|i| unsafe { optional_str(sys::archive_filter_name(a, i)) })
            .filter(|name| *name != "none")
            .map(str::to_string)
            .collect()
    }
}

impl Drop for ReadSession {
    fn drop(&mut self) {
        unsafe {
            sys::archive_read_free(self.raw());
        }
    }
}
