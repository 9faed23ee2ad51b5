//! Archive entry metadata.
//!
//! An [`Entry`] describes one archive member (file, directory, symlink, ...)
//! without its payload. Entries come from two places:
//!
//! - [`Reader::next_entry`](crate::Reader::next_entry) decodes them from an
//!   image. The reader hands out an owned copy, so the entry stays valid
//!   after the reader advances.
//! - [`Entry::from_metadata`] synthesizes them from a filesystem stat record
//!   for injection.
//!
//! # Invariant
//!
//! [`size`](Entry::size) must equal the number of bytes later streamed for the
//! entry. The writer rejects both over- and under-supply.

use std::fs::Metadata;

use crate::timestamp::Timestamp;

const S_IFMT: u32 = 0o170000;
const S_IFSOCK: u32 = 0o140000;
const S_IFLNK: u32 = 0o120000;
const S_IFREG: u32 = 0o100000;
const S_IFBLK: u32 = 0o060000;
const S_IFDIR: u32 = 0o040000;
const S_IFCHR: u32 = 0o020000;
const S_IFIFO: u32 = 0o010000;

/// Permission bits kept by an entry (rwx for all classes plus setuid,
/// setgid and sticky).
pub const PERMISSION_MASK: u32 = 0o7777;

/// The type of an archive member.
///
/// This is the single mapping between entry types and POSIX `st_mode` type
/// bits; both the libarchive entry conversion and the filesystem side go through
/// [`FileType::from_mode_bits`] and [`FileType::mode_bits`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FileType {
    /// A regular file with a data payload.
    #[default]
    Regular,
    /// A directory.
    Directory,
    /// A symbolic link.
    Symlink,
    /// A block device node.
    BlockDevice,
    /// A character device node.
    CharacterDevice,
    /// A named pipe.
    Fifo,
    /// A Unix domain socket.
    Socket,
}

impl FileType {
    /// Decodes the type bits of a POSIX mode. Returns `None` for an unknown
    /// type field.
    pub fn from_mode_bits(mode: u32) -> Option<Self> {
        match mode & S_IFMT {
            S_IFREG => Some(Self::Regular),
            S_IFDIR => Some(Self::Directory),
            S_IFLNK => Some(Self::Symlink),
            S_IFBLK => Some(Self::BlockDevice),
            S_IFCHR => Some(Self::CharacterDevice),
            S_IFIFO => Some(Self::Fifo),
            S_IFSOCK => Some(Self::Socket),
            _ => None,
        }
    }

    /// Returns the POSIX mode type bits for this type.
    pub const fn mode_bits(self) -> u32 {
        match self {
            Self::Regular => S_IFREG,
            Self::Directory => S_IFDIR,
            Self::Symlink => S_IFLNK,
            Self::BlockDevice => S_IFBLK,
            Self::CharacterDevice => S_IFCHR,
            Self::Fifo => S_IFIFO,
            Self::Socket => S_IFSOCK,
        }
    }

    /// Returns `true` for entries that carry a data payload.
    pub const fn has_payload(self) -> bool {
        matches!(self, Self::Regular)
    }

    /// One-character code in the style of `ls -l`.
    pub const fn code(self) -> char {
        match self {
            Self::Regular => '-',
            Self::Directory => 'd',
            Self::Symlink => 'l',
            Self::BlockDevice => 'b',
            Self::CharacterDevice => 'c',
            Self::Fifo => 'p',
            Self::Socket => 's',
        }
    }

    /// Lowercase name used in logs and JSON output.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Regular => "file",
            Self::Directory => "directory",
            Self::Symlink => "symlink",
            Self::BlockDevice => "block-device",
            Self::CharacterDevice => "char-device",
            Self::Fifo => "fifo",
            Self::Socket => "socket",
        }
    }
}

impl std::fmt::Display for FileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Metadata for one archive member.
///
/// Paths are archive-relative and slash separated. A leading `/` is accepted
/// and ignored by the writer, so `"/a.txt"` and `"a.txt"` name the same member.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Entry {
    path: String,
    file_type: FileType,
    permissions: u32,
    size: u64,
    uid: Option<i64>,
    gid: Option<i64>,
    accessed: Option<Timestamp>,
    modified: Option<Timestamp>,
    link_target: Option<String>,
}

impl Entry {
    /// Creates an entry with no ownership and no times.
    pub fn new(path: impl Into<String>, file_type: FileType) -> Self {
        Self {
            path: path.into(),
            file_type,
            ..Self::default()
        }
    }

    /// Creates a regular file entry of `size` bytes with mode `0644`.
    pub fn file(path: impl Into<String>, size: u64) -> Self {
        let mut entry = Self::new(path, FileType::Regular);
        entry.permissions = 0o644;
        entry.size = size;
        entry
    }

    /// Creates a directory entry with mode `0755`.
    pub fn directory(path: impl Into<String>) -> Self {
        let mut entry = Self::new(path, FileType::Directory);
        entry.permissions = 0o755;
        entry
    }

    /// Creates a symlink entry with mode `0777`.
    pub fn symlink(path: impl Into<String>, target: impl Into<String>) -> Self {
        let mut entry = Self::new(path, FileType::Symlink);
        entry.permissions = 0o777;
        entry.link_target = Some(target.into());
        entry
    }

    /// Synthesizes an injection entry from a filesystem stat record.
    ///
    /// The entry is a regular file whose permission bits are the file's mode
    /// masked to `0o777`. The file's modification time is used for both the
    /// access and modification time. Ownership is left unset.
    pub fn from_metadata(path: impl Into<String>, meta: &Metadata) -> Self {
        let mut entry = Self::file(path, meta.len());
        entry.permissions = metadata_permissions(meta);
        let mtime = meta.modified().ok().map(Timestamp::from_system_time);
        entry.modified = mtime;
        entry.accessed = mtime;
        entry
    }

    /// Archive path of the member.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Replaces the archive path.
    pub fn set_path(&mut self, path: impl Into<String>) {
        self.path = path.into();
    }

    /// Member type.
    pub fn file_type(&self) -> FileType {
        self.file_type
    }

    /// Changes the member type.
    pub fn set_file_type(&mut self, file_type: FileType) {
        self.file_type = file_type;
    }

    /// Returns `true` if this is a regular file.
    pub fn is_file(&self) -> bool {
        self.file_type == FileType::Regular
    }

    /// Returns `true` if this is a directory.
    pub fn is_dir(&self) -> bool {
        self.file_type == FileType::Directory
    }

    /// POSIX permission bits (`0o7777` at most).
    pub fn permissions(&self) -> u32 {
        self.permissions
    }

    /// Sets the permission bits; anything outside `0o7777` is dropped.
    pub fn set_permissions(&mut self, permissions: u32) {
        self.permissions = permissions & PERMISSION_MASK;
    }

    /// Full POSIX mode: type bits combined with permission bits.
    pub fn mode(&self) -> u32 {
        self.file_type.mode_bits() | self.permissions
    }

    /// Sets type and permissions from a full POSIX mode.
    ///
    /// An unknown type field leaves the current type unchanged.
    pub fn set_mode(&mut self, mode: u32) {
        if let Some(file_type) = FileType::from_mode_bits(mode) {
            self.file_type = file_type;
        }
        self.set_permissions(mode);
    }

    /// Payload size in bytes. Only meaningful for regular files.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Sets the declared payload size.
    pub fn set_size(&mut self, size: u64) {
        self.size = size;
    }

    /// Owner user id, if recorded.
    pub fn uid(&self) -> Option<i64> {
        self.uid
    }

    /// Sets or clears the owner user id.
    pub fn set_uid(&mut self, uid: Option<i64>) {
        self.uid = uid;
    }

    /// Owner group id, if recorded.
    pub fn gid(&self) -> Option<i64> {
        self.gid
    }

    /// Sets or clears the owner group id.
    pub fn set_gid(&mut self, gid: Option<i64>) {
        self.gid = gid;
    }

    /// Last access time, or `None` if the header never had one.
    pub fn accessed(&self) -> Option<Timestamp> {
        self.accessed
    }

    /// Sets or clears the access time.
    pub fn set_accessed(&mut self, time: Option<Timestamp>) {
        self.accessed = time;
    }

    /// Last modification time, or `None` if the header never had one.
    pub fn modified(&self) -> Option<Timestamp> {
        self.modified
    }

    /// Sets or clears the modification time.
    pub fn set_modified(&mut self, time: Option<Timestamp>) {
        self.modified = time;
    }

    /// Symlink target, for symlink entries.
    pub fn link_target(&self) -> Option<&str> {
        self.link_target.as_deref()
    }

    /// Sets or clears the symlink target.
    pub fn set_link_target(&mut self, target: Option<String>) {
        self.link_target = target;
    }

    /// Returns the last path component.
    pub fn name(&self) -> &str {
        self.path
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default()
    }

    /// Formats the mode the way `ls -l` does, e.g. `-rw-r--r--`.
    pub fn mode_string(&self) -> String {
        let mut s = String::with_capacity(10);
        s.push(self.file_type.code());
        let p = self.permissions;
        let triads = [
            (p >> 6 & 7, p & 0o4000 != 0, 's'),
            (p >> 3 & 7, p & 0o2000 != 0, 's'),
            (p & 7, p & 0o1000 != 0, 't'),
        ];
        for (bits, special, special_char) in triads {
            s.push(if bits & 4 != 0 { 'r' } else { '-' });
            s.push(if bits & 2 != 0 { 'w' } else { '-' });
            s.push(match (bits & 1 != 0, special) {
                (true, true) => special_char,
                (false, true) => special_char.to_ascii_uppercase(),
                (true, false) => 'x',
                (false, false) => '-',
            });
        }
        s
    }
}

#[cfg(unix)]
fn metadata_permissions(meta: &Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o777
}

#[cfg(not(unix))]
fn metadata_permissions(meta: &Metadata) -> u32 {
    if meta.permissions().readonly() {
        0o444
    } else {
        0o644
    }
}
