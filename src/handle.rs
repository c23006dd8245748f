//! # File/Directory Capability Contract
//!
//! The capability-oriented core of this crate: a
//! single [`Directory`] trait covers every namespace-rooted filesystem
//! *and* every open directory handle, and [`File`] extends it with the
//! byte-stream operations a regular file additionally supports.
//!
//! ## Why one trait instead of two
//!
//! A "filesystem" and "an open directory handle" are the same capability
//! viewed from two angles: both resolve a relative path to something and
//! let you act on it. Modeling them as the same trait is what makes
//! `openat`-style resolution fall out for free — [`DirFS`](crate::dirfs::DirFS)
//! and [`RootFS`](crate::rootfs::RootFS) implement `Directory` directly as
//! their root, and any `File` handle that turns out to refer to a
//! directory is *also* a valid `Directory` to resolve further paths
//! against, with no separate "convert this handle into a filesystem"
//! step required.
//!
//! | Item | Purpose |
//! |------|---------|
//! | [`Directory`] | Namespace operations: open, list, link, rename, stat, ... |
//! | [`File`] | Adds read/write/seek/truncate/sync to an open handle. |
//! | [`CloseGuard`] | Shared use-after-close tracking for implementors. |
//! | [`validate_name`] / [`validate_target`] | Shared path-argument validation. |
//! | [`ReadDirIter`] | A `Vec<DirEntry>`-backed iterator for `read_dir` results. |

use std::any::Any;
use std::io::{Read, SeekFrom, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::SystemTime;

use crate::error::{ErrorKind, PathError};
use crate::path::valid_path;
use crate::types::{AccessMode, DirEntry, FileMode, Metadata};

/// Namespace-rooted filesystem operations, implemented both by
/// standalone roots ([`crate::dirfs::DirFS`], [`crate::rootfs::RootFS`],
/// the [`crate::compose`] wrappers) and by any open directory handle.
///
/// All paths passed to these methods are validated against
/// [`crate::path::valid_path`] by the implementor before use; passing an
/// invalid path is an [`ErrorKind::Invalid`] error, not a panic.
pub trait Directory: Send + Sync {
    /// Opens `name` relative to this directory, creating/truncating per
    /// `flags`, with `perm` applied only when a new file is created.
    fn open_file(
        &self,
        name: &str,
        flags: OpenFlags,
        perm: FileMode,
    ) -> Result<Box<dyn File>, PathError>;

    /// Lists directory entries. `n <= 0` returns every remaining entry;
    /// `n > 0` returns at most `n` entries and remembers the listing
    /// position across calls the way a real directory stream does.
    fn read_dir(&self, n: i64) -> Result<Vec<DirEntry>, PathError>;

    /// Checks whether the caller could perform the access described by
    /// `mode` against `name`, without opening it.
    fn access(&self, name: &str, mode: AccessMode) -> Result<(), PathError>;

    /// Creates a device, FIFO, or socket node at `name`.
    fn mknod(&self, name: &str, mode: FileMode, dev: u64) -> Result<(), PathError>;

    /// Creates a directory at `name`. The parent must already exist;
    /// see [`crate::ops::mkdir_all`] for the recursive variant.
    fn mkdir(&self, name: &str, perm: FileMode) -> Result<(), PathError>;

    /// Removes the (empty) directory at `name`.
    fn rmdir(&self, name: &str) -> Result<(), PathError>;

    /// Removes the file, device node, or symlink at `name`.
    fn unlink(&self, name: &str) -> Result<(), PathError>;

    /// Creates a symlink at `new_name` pointing at the literal text
    /// `old_name` (not resolved or validated against this dialect — the
    /// link target is opaque until it is itself resolved).
    fn symlink(&self, old_name: &str, new_name: &str) -> Result<(), PathError>;

    /// Creates a hard link at `new_name` under `new_dir` pointing at the
    /// same inode as `old_name` under `self`.
    fn link(&self, old_name: &str, new_dir: &dyn Directory, new_name: &str) -> Result<(), PathError>;

    /// Moves `old_name` under `self` to `new_name` under `new_dir`.
    fn rename(&self, old_name: &str, new_dir: &dyn Directory, new_name: &str) -> Result<(), PathError>;

    /// Stats `name` without following a trailing symlink.
    fn lstat(&self, name: &str) -> Result<Metadata, PathError>;

    /// Returns a native handle accessor for backends that want to expose
    /// a fast path to their underlying host representation (for example,
    /// a raw file descriptor). Returns `None` by default; only
    /// [`crate::dirfs::DirFS`] overrides this.
    fn sys(&self) -> Option<&(dyn Any + Send + Sync)> {
        None
    }
}

/// An open file handle. Every `File` is also a [`Directory`] — relative
/// operations on it succeed only when the handle actually refers to a
/// directory, failing with [`ErrorKind::NotDirectory`] otherwise — which
/// is how `openat`-style resolution chains through a path one directory
/// handle at a time without a separate "as filesystem" conversion.
pub trait File: Directory {
    /// The name this handle was opened with (not a full path — just the
    /// final path component).
    fn name(&self) -> &str;

    /// Reads from the current position, advancing it.
    fn read(&self, buf: &mut [u8]) -> Result<usize, PathError>;

    /// Reads at a fixed offset, without touching the handle's position.
    fn read_at(&self, buf: &mut [u8], offset: u64) -> Result<usize, PathError>;

    /// Writes at the current position, advancing it (or appending,
    /// if opened with `OpenFlags::APPEND`).
    fn write(&self, buf: &[u8]) -> Result<usize, PathError>;

    /// Writes at a fixed offset, without touching the handle's position.
    fn write_at(&self, buf: &[u8], offset: u64) -> Result<usize, PathError>;

    /// Convenience wrapper over [`File::write`] for string data.
    fn write_str(&self, s: &str) -> Result<usize, PathError> {
        self.write(s.as_bytes())
    }

    /// Repositions the handle, returning the new absolute offset.
    fn seek(&self, pos: SeekFrom) -> Result<u64, PathError>;

    /// Reads the literal target text of a symlink handle.
    fn readlink(&self) -> Result<String, PathError>;

    /// Changes permission bits.
    fn chmod(&self, mode: FileMode) -> Result<(), PathError>;

    /// Changes access and modification times.
    fn chtimes(&self, atime: SystemTime, mtime: SystemTime) -> Result<(), PathError>;

    /// Truncates (or extends with zeros) to `size` bytes.
    fn truncate(&self, size: u64) -> Result<(), PathError>;

    /// Flushes file data and metadata to the backing store.
    fn sync(&self) -> Result<(), PathError>;

    /// Flushes file data only (implementors without a distinct fast path
    /// may treat this the same as [`File::sync`]).
    fn datasync(&self) -> Result<(), PathError> {
        self.sync()
    }

    /// Stats the handle itself, following no further symlinks (the
    /// handle already denotes a concrete entry).
    fn stat(&self) -> Result<Metadata, PathError>;

    /// Closes the handle. Idempotent calls after the first return
    /// [`ErrorKind::Closed`].
    fn close(&self) -> Result<(), PathError>;
}

pub use crate::types::OpenFlags;

/// Copies bytes from `src` into `file` via repeated [`File::write`]
/// calls, returning the total written. A small, dependency-free stand-in
/// for `std::io::copy` when the source is an arbitrary `Read` rather
/// than another `File`.
pub fn copy_into(file: &dyn File, src: &mut dyn Read) -> Result<u64, PathError> {
    let mut buf = [0u8; 8192];
    let mut total = 0u64;
    loop {
        let n = src.read(&mut buf).map_err(|e| PathError::from_io("read", file.name(), e))?;
        if n == 0 {
            break;
        }
        let mut written = 0;
        while written < n {
            written += file.write(&buf[written..n])?;
        }
        total += n as u64;
    }
    Ok(total)
}

/// Copies bytes from a [`File`] into an arbitrary `Write` sink.
pub fn copy_from(file: &dyn File, dst: &mut dyn Write) -> Result<u64, PathError> {
    let mut buf = [0u8; 8192];
    let mut total = 0u64;
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        dst.write_all(&buf[..n])
            .map_err(|e| PathError::from_io("write", file.name(), e))?;
        total += n as u64;
    }
    Ok(total)
}

/// Validates `name` as a legal relative path argument in *source*
/// position (`open_file`, `mkdir`, `rmdir`, `unlink`, `lstat`, `access`,
/// `rename`'s first argument, ...). Every [`Directory`]/[`File`]
/// implementor calls this before touching the host so a malformed name
/// always surfaces as [`ErrorKind::NotExist`] — a source path that isn't
/// even well-formed can't refer to anything — rather than an
/// implementation-specific panic or a confusing host error.
pub fn validate_name(op: &'static str, name: &str) -> Result<(), PathError> {
    if valid_path(name) {
        Ok(())
    } else {
        Err(PathError::new(op, name, ErrorKind::NotExist))
    }
}

/// Validates `name` as a legal relative path argument in *target*
/// position (`link`'s and `rename`'s destination, `symlink`'s new name).
/// Unlike [`validate_name`], a malformed target is [`ErrorKind::Invalid`]:
/// the operand exists and is well-formed, but what the caller asked to
/// create it as is not.
pub fn validate_target(op: &'static str, name: &str) -> Result<(), PathError> {
    if valid_path(name) {
        Ok(())
    } else {
        Err(PathError::new(op, name, ErrorKind::Invalid))
    }
}

/// Shared use-after-close tracking, embedded as a field by every
/// concrete [`File`]/[`Directory`] implementation in this crate rather
/// than expressed as a generic wrapper type — each backend's close
/// semantics differ enough (closing a real fd vs. marking an in-memory
/// handle dead) that a shared field plus two tiny helper methods reads
/// more clearly than a decorator around a boxed trait object.
#[derive(Debug, Default)]
pub struct CloseGuard {
    closed: AtomicBool,
}

impl CloseGuard {
    /// A fresh, open guard.
    pub fn new() -> Self {
        Self {
            closed: AtomicBool::new(false),
        }
    }

    /// Returns [`ErrorKind::Closed`] if this handle has already been
    /// closed; otherwise `Ok(())`. Call at the top of every method that
    /// should fail after close.
    pub fn check(&self, op: &'static str, path: &str) -> Result<(), PathError> {
        if self.closed.load(Ordering::Acquire) {
            Err(PathError::new(op, path, ErrorKind::Closed))
        } else {
            Ok(())
        }
    }

    /// Marks the guard closed. Returns [`ErrorKind::Closed`] if it was
    /// already closed (closing twice is an error, not a no-op, per the
    /// handle-lifecycle contract).
    pub fn close(&self, op: &'static str, path: &str) -> Result<(), PathError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            Err(PathError::new(op, path, ErrorKind::Closed))
        } else {
            Ok(())
        }
    }

    /// `true` if [`CloseGuard::close`] has already succeeded once.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

/// A `Vec<DirEntry>`-backed iterator for [`Directory::read_dir`]
/// results, handling the `n`-entries-at-a-time chunking convention so
/// individual backends only need to produce the full listing once.
pub struct ReadDirIter {
    entries: std::vec::IntoIter<DirEntry>,
}

impl ReadDirIter {
    /// Wraps a complete, already-collected listing.
    pub fn from_vec(entries: Vec<DirEntry>) -> Self {
        Self {
            entries: entries.into_iter(),
        }
    }

    /// Takes up to `n` entries (or all remaining, if `n <= 0`) and
    /// returns the usual `read_dir` result shape.
    pub fn take_n(&mut self, n: i64) -> Vec<DirEntry> {
        if n <= 0 {
            self.entries.by_ref().collect()
        } else {
            self.entries.by_ref().take(n as usize).collect()
        }
    }
}

impl Iterator for ReadDirIter {
    type Item = DirEntry;

    fn next(&mut self) -> Option<DirEntry> {
        self.entries.next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_guard_allows_first_close() {
        let guard = CloseGuard::new();
        assert!(guard.check("read", "a").is_ok());
        assert!(guard.close("close", "a").is_ok());
    }

    #[test]
    fn close_guard_rejects_use_after_close() {
        let guard = CloseGuard::new();
        guard.close("close", "a").unwrap();
        let err = guard.check("read", "a").unwrap_err();
        assert!(err.kind().is_closed());
    }

    #[test]
    fn close_guard_rejects_double_close() {
        let guard = CloseGuard::new();
        guard.close("close", "a").unwrap();
        let err = guard.close("close", "a").unwrap_err();
        assert!(err.kind().is_closed());
    }

    #[test]
    fn validate_name_rejects_absolute() {
        assert!(validate_name("open", "/etc/passwd").is_err());
    }

    #[test]
    fn validate_name_accepts_relative() {
        assert!(validate_name("open", "a/b.txt").is_ok());
    }

    #[test]
    fn read_dir_iter_chunks() {
        let entries = vec![
            DirEntry {
                name: "a".into(),
                file_type: FileMode::new_file(0o644),
            },
            DirEntry {
                name: "b".into(),
                file_type: FileMode::new_file(0o644),
            },
            DirEntry {
                name: "c".into(),
                file_type: FileMode::new_file(0o644),
            },
        ];
        let mut iter = ReadDirIter::from_vec(entries);
        assert_eq!(iter.take_n(2).len(), 2);
        assert_eq!(iter.take_n(0).len(), 1);
    }
}
