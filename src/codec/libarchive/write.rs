use std::ffi::c_void;
use std::path::Path;
use std::ptr::NonNull;

use libarchive2_sys as sys;

use super::entry::RawEntry;
use super::{OK, c_path, c_string, error_message};
use crate::codec::{Encoder, Format};
use crate::entry::Entry;
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    New,
    Open,
    Closed,
}

/// A libarchive write handle for one output format.
pub(crate) struct WriteSession {
    archive: NonNull<sys::archive>,
    state: State,
    target: String,
}

impl WriteSession {
    pub(crate) fn new(format: Format) -> Result<Self> {
        let archive = NonNull::new(unsafe { sys::archive_write_new() })
            .ok_or_else(|| Error::encode("", "out of memory"))?;
        let session = Self {
            archive,
            state: State::New,
            target: String::new(),
        };
        let a = session.raw();
        let status = match format {
            Format::Iso9660 => unsafe { sys::archive_write_set_format_iso9660(a) },
        };
        if status != OK {
            return Err(Error::encode("", unsafe { error_message(a) }));
        }
        Ok(session)
    }

    fn raw(&self) -> *mut sys::archive {
        self.archive.as_ptr()
    }
}

impl Encoder for WriteSession {
    fn set_options(&mut self, directives: &str) -> Result<()> {
        if self.state != State::New {
            return Err(Error::option(
                directives,
                "options must be set before the output is opened",
            ));
        }
        if directives.is_empty() {
            return Ok(());
        }
        let c_opts = c_string(directives)
            .ok_or_else(|| Error::option(directives, "contains a NUL byte"))?;
        let a = self.raw();
        if unsafe { sys::archive_write_set_options(a, c_opts.as_ptr()) } != OK {
            return Err(Error::option(directives, unsafe { error_message(a) }));
        }
        Ok(())
    }

    fn open(&mut self, path: &Path) -> Result<()> {
        self.target = path.display().to_string();
        if self.state != State::New {
            return Err(Error::open(&self.target, "session already opened"));
        }
        let c_path = c_path(path)
            .ok_or_else(|| Error::open(&self.target, "path cannot be passed to libarchive"))?;
        let a = self.raw();
        if unsafe { sys::archive_write_open_filename(a, c_path.as_ptr()) } != OK {
            return Err(Error::open(&self.target, unsafe { error_message(a) }));
        }
        self.state = State::Open;
        Ok(())
    }

    fn write_header(&mut self, entry: &Entry) -> Result<()> {
        let raw = RawEntry::from_entry(entry)?;
        let a = self.raw();
        // Warnings mean the entry was dropped (e.g. a symlink without Rock
        // Ridge), which callers must hear about.
        if unsafe { sys::archive_write_header(a, raw.as_ptr()) } != OK {
            return Err(Error::encode(entry.path(), unsafe { error_message(a) }));
        }
        Ok(())
    }

    fn write_data(&mut self, data: &[u8]) -> Result<usize> {
        let a = self.raw();
        let n = unsafe { sys::archive_write_data(a, data.as_ptr() as *const c_void, data.len() as _) };
        if n < 0 {
            return Err(Error::Io(std::io::Error::other(unsafe { error_message(a) })));
        }
        Ok(n as usize)
    }

    fn finish(&mut self) -> Result<()> {
        if self.state != State::Open {
            return Err(Error::encode(&self.target, "session is not open"));
        }
        self.state = State::Closed;
        let a = self.raw();
        if unsafe { sys::archive_write_close(a) } != OK {
            return Err(Error::encode(&self.target, unsafe { error_message(a) }));
        }
        Ok(())
    }
}

impl Drop for WriteSession {
    fn drop(&mut self) {
        unsafe {
            sys::archive_write_free(self.raw());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn test_option_validation() {
        let mut session = WriteSession::new(Format::Iso9660).unwrap();
        session.set_options("volume-id=DATA,joliet").unwrap();
        session.set_options("").unwrap();

        for bad in ["no-such-option", "boot-type=floppy", "boot-load-seg=zz"] {
            let err = session.set_options(bad).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Option, "{}", bad);
        }
    }

    #[test]
    fn test_options_frozen_after_open() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = WriteSession::new(Format::Iso9660).unwrap();
        session.open(&dir.path().join("out.iso")).unwrap();
        let err = session.set_options("volume-id=late").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Option);
        session.finish().unwrap();
    }
}
