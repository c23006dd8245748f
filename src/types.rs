//! # Core Value Types
//!
//! The plain data this crate's traits pass around: file modes, open
//! flags, access checks, metadata, and directory entries.
//!
//! ## Quick Reference
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`FileMode`] | Bitset: permission bits + type bits (dir, symlink, device, ...) |
//! | [`OpenFlags`] | Bitset controlling how [`crate::handle::Directory::open_file`] behaves |
//! | [`AccessMode`] | Bitset for [`crate::handle::Directory::access`] checks |
//! | [`Metadata`] | Size, mode, timestamps, link count for one entry |
//! | [`DirEntry`] | One entry from a directory listing |
//!
//! ## Serde Support
//!
//! `Metadata` and `DirEntry` support serialization when the `serde`
//! feature is enabled:
//!
//! ```toml
//! [dependencies]
//! vfs-core = { version = "0.1", features = ["serde"] }
//! ```

use std::time::SystemTime;

use bitflags::bitflags;

bitflags! {
    /// A bitset encoding both permission bits (rwx × user/group/other,
    /// plus setuid/setgid/sticky) and the entry's type.
    ///
    /// The low 12 bits mirror POSIX permission bits; the higher bits are
    /// mutually-exclusive type markers. Use [`FileMode::perm`] to read
    /// just the permission bits and [`FileMode::is_dir`] / friends to
    /// read the type.
    ///
    /// # Example
    ///
    /// ```
    /// use vfs_core::types::FileMode;
    ///
    /// let mode = FileMode::DIR | FileMode::from_bits_truncate(0o755);
    /// assert!(mode.is_dir());
    /// assert_eq!(mode.perm(), 0o755);
    /// ```
    #[derive(Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct FileMode: u32 {
        /// Set-user-ID bit.
        const SETUID = 0o4000;
        /// Set-group-ID bit.
        const SETGID = 0o2000;
        /// Sticky bit.
        const STICKY = 0o1000;
        /// Regular file.
        const FILE = 1 << 20;
        /// Directory.
        const DIR = 1 << 21;
        /// Symbolic link.
        const SYMLINK = 1 << 22;
        /// Block device.
        const DEVICE = 1 << 23;
        /// Character device.
        const CHAR_DEVICE = 1 << 24;
        /// Named pipe (FIFO).
        const NAMED_PIPE = 1 << 25;
        /// Unix domain socket.
        const SOCKET = 1 << 26;
    }
}

impl FileMode {
    /// Mask covering only the permission bits (rwx × ugo, plus the
    /// setuid/setgid/sticky bits).
    pub const PERM_MASK: u32 = 0o7777;

    /// Builds a `FileMode` for a regular file with the given permission
    /// bits (only the low 12 bits of `perm` are honored).
    pub fn new_file(perm: u32) -> Self {
        FileMode::FILE | FileMode::from_bits_truncate(perm & Self::PERM_MASK)
    }

    /// Builds a `FileMode` for a directory with the given permission
    /// bits.
    pub fn new_dir(perm: u32) -> Self {
        FileMode::DIR | FileMode::from_bits_truncate(perm & Self::PERM_MASK)
    }

    /// Builds a `FileMode` for a symlink. Symlinks have no meaningful
    /// permission bits on most hosts; this always reports `0o777`.
    pub fn new_symlink() -> Self {
        FileMode::SYMLINK | FileMode::from_bits_truncate(0o777)
    }

    /// Returns just the permission bits (rwx × ugo, setuid/setgid/sticky).
    pub fn perm(&self) -> u32 {
        self.bits() & Self::PERM_MASK
    }

    /// `true` if this mode marks a regular file.
    pub fn is_file(&self) -> bool {
        self.contains(FileMode::FILE)
    }

    /// `true` if this mode marks a directory.
    pub fn is_dir(&self) -> bool {
        self.contains(FileMode::DIR)
    }

    /// `true` if this mode marks a symlink.
    pub fn is_symlink(&self) -> bool {
        self.contains(FileMode::SYMLINK)
    }

    /// `true` if this mode marks a block or character device.
    pub fn is_device(&self) -> bool {
        self.intersects(FileMode::DEVICE | FileMode::CHAR_DEVICE)
    }
}

bitflags! {
    /// Flags controlling how [`crate::handle::Directory::open_file`]
    /// behaves, mirroring the POSIX `open(2)` flag vocabulary described
    /// in the crate's external interface.
    ///
    /// `READ`/`WRITE`/`READ_WRITE` are provided as documented aliases;
    /// the access mode is not itself a distinct bit pair the way POSIX's
    /// `O_RDONLY == 0` can be surprising, so [`OpenFlags::is_read_only`]
    /// is the recommended way to query it.
    #[derive(Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct OpenFlags: u32 {
        /// Open for writing.
        const WRITE = 1 << 0;
        /// Open for both reading and writing.
        const READ_WRITE = 1 << 1;
        /// Append writes to the end of the file atomically.
        const APPEND = 1 << 2;
        /// Create the file if it does not exist.
        const CREATE = 1 << 3;
        /// Fail if `CREATE` is set and the file already exists.
        const EXCL = 1 << 4;
        /// Truncate an existing file to zero length on open.
        const TRUNC = 1 << 5;
        /// Fail if the final component is a symlink rather than following it.
        const NOFOLLOW = 1 << 6;
        /// Fail unless the target is a directory.
        const DIRECTORY = 1 << 7;
        /// Request synchronous I/O file integrity completion.
        const SYNC = 1 << 8;
        /// Request synchronous I/O data integrity completion. Aliases
        /// `SYNC` on hosts without a distinct data-only durability mode.
        const DSYNC = 1 << 9;
        /// Request synchronous I/O for reads as well as writes. Aliases
        /// `SYNC` on hosts without a distinct read-integrity mode.
        const RSYNC = 1 << 10;
        /// Non-blocking open, for FIFOs and devices that would otherwise
        /// block waiting for a peer.
        const NONBLOCK = 1 << 11;
        /// Open for path resolution only; no read or write is permitted
        /// through the returned handle. Used internally by
        /// [`crate::rootfs`] to probe intermediate components without
        /// triggering device/FIFO open side effects.
        const PATH = 1 << 12;
    }
}

impl OpenFlags {
    /// Read-only open (no bits set beyond the ones given). Provided for
    /// readability at call sites, matching the POSIX `O_RDONLY == 0`
    /// convention.
    pub const READ: Self = Self::empty();

    /// `true` unless `WRITE` or `READ_WRITE` is set.
    pub fn is_read_only(&self) -> bool {
        !self.intersects(OpenFlags::WRITE | OpenFlags::READ_WRITE)
    }

    /// `true` if the open should be allowed to write.
    pub fn is_writable(&self) -> bool {
        self.intersects(OpenFlags::WRITE | OpenFlags::READ_WRITE)
    }
}

bitflags! {
    /// Flags for [`crate::handle::Directory::access`], folding the
    /// requested check into the low three bits the way POSIX `access(2)`
    /// does (read/write/execute), without distinguishing owner, group,
    /// or other — the check is "can the current caller do this", not
    /// "which bit of the mode matched".
    #[derive(Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct AccessMode: u32 {
        /// Readable.
        const READ = 0b100;
        /// Writable.
        const WRITE = 0b010;
        /// Executable (or, for a directory, searchable).
        const EXEC = 0b001;
    }
}

/// Size, mode, timestamps, and link count for one filesystem entry, as
/// returned by `stat`/`lstat`.
///
/// # Example
///
/// ```
/// use vfs_core::types::{FileMode, Metadata};
/// use std::time::SystemTime;
///
/// let meta = Metadata {
///     mode: FileMode::new_file(0o644),
///     size: 0,
///     modified: SystemTime::now(),
///     accessed: SystemTime::now(),
///     nlink: 1,
///     dev: None,
/// };
/// assert!(meta.mode.is_file());
/// ```
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Metadata {
    /// Permission and type bits.
    pub mode: FileMode,
    /// Size in bytes. Meaningless (and conventionally zero) for
    /// directories and symlinks on some hosts.
    pub size: u64,
    /// Last-modified time.
    pub modified: SystemTime,
    /// Last-accessed time.
    pub accessed: SystemTime,
    /// Hard-link count.
    pub nlink: u64,
    /// Packed `(major, minor)` device number, present only for device
    /// nodes. See [`crate::device`].
    pub dev: Option<u64>,
}

impl Metadata {
    /// `true` if this entry is a regular file.
    pub fn is_file(&self) -> bool {
        self.mode.is_file()
    }

    /// `true` if this entry is a directory.
    pub fn is_dir(&self) -> bool {
        self.mode.is_dir()
    }

    /// `true` if this entry is a symlink.
    pub fn is_symlink(&self) -> bool {
        self.mode.is_symlink()
    }
}

/// One entry from a directory listing.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DirEntry {
    /// The entry's name within its parent directory (no path separators).
    pub name: String,
    /// The entry's type bits (a subset of [`FileMode`]: `FILE`, `DIR`,
    /// `SYMLINK`, or one of the device/pipe/socket variants).
    pub file_type: FileMode,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_mode_reports_perm_bits_only() {
        let mode = FileMode::new_file(0o640);
        assert_eq!(mode.perm(), 0o640);
        assert!(mode.is_file());
        assert!(!mode.is_dir());
    }

    #[test]
    fn dir_mode_is_dir() {
        let mode = FileMode::new_dir(0o755);
        assert!(mode.is_dir());
        assert!(!mode.is_symlink());
    }

    #[test]
    fn open_flags_read_only_default() {
        assert!(OpenFlags::READ.is_read_only());
        assert!(!OpenFlags::WRITE.is_read_only());
        assert!((OpenFlags::WRITE | OpenFlags::CREATE).is_writable());
    }

    #[test]
    fn access_mode_bits() {
        let rw = AccessMode::READ | AccessMode::WRITE;
        assert!(rw.contains(AccessMode::READ));
        assert!(!rw.contains(AccessMode::EXEC));
    }

    #[test]
    fn metadata_predicates_follow_mode() {
        let meta = Metadata {
            mode: FileMode::new_symlink(),
            size: 0,
            modified: SystemTime::UNIX_EPOCH,
            accessed: SystemTime::UNIX_EPOCH,
            nlink: 1,
            dev: None,
        };
        assert!(meta.is_symlink());
        assert!(!meta.is_dir());
    }
}
