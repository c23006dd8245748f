//! # Read-Only Projection
//!
//! [`ReadOnlyFS`] wraps any [`Directory`] and rejects every mutating
//! operation with [`ErrorKind::ReadOnly`], while passing reads straight
//! through. The projection is recursive: opening a
//! subdirectory through a `ReadOnlyFS`, or a file handle returned by it,
//! yields another read-only-wrapped handle (internally, [`RecursiveReadOnly`]),
//! so the restriction can't be bypassed by descending into the tree.
//!
//! [`ReadOnlyFile`] is the other, deliberately *non-recursive* wrapper:
//! it makes writes against a single already-open handle fail, but a
//! relative `open_file` through it returns the child exactly as the
//! inner handle would have, fully writable. Use [`ReadOnlyFS`] when the
//! restriction should hold for an entire subtree; use [`ReadOnlyFile`]
//! when only one handle, not its descendants, should be pinned read-only.

use std::any::Any;
use std::io::SeekFrom;
use std::sync::Arc;
use std::time::SystemTime;

use crate::compose::write_flags_requested;
use crate::error::{ErrorKind, PathError};
use crate::handle::{Directory, File};
use crate::types::{AccessMode, DirEntry, FileMode, Metadata, OpenFlags};

/// A read-only view over another [`Directory`].
///
/// # Example
///
/// ```
/// # fn demo(fs: std::sync::Arc<dyn vfs_core::handle::Directory>) {
/// use vfs_core::readonly::ReadOnlyFS;
///
/// let ro = ReadOnlyFS::new(fs);
/// // Any write through `ro` fails with ErrorKind::ReadOnly, reads pass through.
/// # }
/// ```
pub struct ReadOnlyFS {
    inner: Arc<dyn Directory>,
}

impl ReadOnlyFS {
    /// Wraps `inner` in a read-only projection.
    pub fn new(inner: Arc<dyn Directory>) -> Self {
        Self { inner }
    }
}

impl Directory for ReadOnlyFS {
    fn open_file(&self, name: &str, flags: OpenFlags, perm: FileMode) -> Result<Box<dyn File>, PathError> {
        if write_flags_requested(flags) {
            return Err(PathError::new("open", name, ErrorKind::ReadOnly));
        }
        let file = self.inner.open_file(name, flags, perm)?;
        Ok(Box::new(RecursiveReadOnly::new(file)))
    }

    fn read_dir(&self, n: i64) -> Result<Vec<DirEntry>, PathError> {
        self.inner.read_dir(n)
    }

    fn access(&self, name: &str, mode: AccessMode) -> Result<(), PathError> {
        self.inner.access(name, mode)
    }

    fn mknod(&self, name: &str, _mode: FileMode, _dev: u64) -> Result<(), PathError> {
        Err(PathError::new("mknod", name, ErrorKind::ReadOnly))
    }

    fn mkdir(&self, name: &str, _perm: FileMode) -> Result<(), PathError> {
        Err(PathError::new("mkdir", name, ErrorKind::ReadOnly))
    }

    fn rmdir(&self, name: &str) -> Result<(), PathError> {
        Err(PathError::new("rmdir", name, ErrorKind::ReadOnly))
    }

    fn unlink(&self, name: &str) -> Result<(), PathError> {
        Err(PathError::new("unlink", name, ErrorKind::ReadOnly))
    }

    fn symlink(&self, _old_name: &str, new_name: &str) -> Result<(), PathError> {
        Err(PathError::new("symlink", new_name, ErrorKind::ReadOnly))
    }

    fn link(&self, _old_name: &str, _new_dir: &dyn Directory, new_name: &str) -> Result<(), PathError> {
        Err(PathError::new("link", new_name, ErrorKind::ReadOnly))
    }

    fn rename(&self, _old_name: &str, _new_dir: &dyn Directory, new_name: &str) -> Result<(), PathError> {
        Err(PathError::new("rename", new_name, ErrorKind::ReadOnly))
    }

    fn lstat(&self, name: &str) -> Result<Metadata, PathError> {
        self.inner.lstat(name)
    }

    fn sys(&self) -> Option<&(dyn Any + Send + Sync)> {
        self.inner.sys()
    }
}

/// The recursive read-only handle returned by [`ReadOnlyFS::open_file`]:
/// every descendant opened through it is wrapped the same way, so the
/// restriction holds for the whole subtree. Not exported — reachable
/// only via [`ReadOnlyFS`]. Compare [`ReadOnlyFile`], the public,
/// single-level wrapper.
struct RecursiveReadOnly {
    inner: Box<dyn File>,
}

impl RecursiveReadOnly {
    fn new(inner: Box<dyn File>) -> Self {
        Self { inner }
    }
}

impl Directory for RecursiveReadOnly {
    fn open_file(&self, name: &str, flags: OpenFlags, perm: FileMode) -> Result<Box<dyn File>, PathError> {
        if write_flags_requested(flags) {
            return Err(PathError::new("open", name, ErrorKind::ReadOnly));
        }
        let file = self.inner.open_file(name, flags, perm)?;
        Ok(Box::new(RecursiveReadOnly::new(file)))
    }

    fn read_dir(&self, n: i64) -> Result<Vec<DirEntry>, PathError> {
        self.inner.read_dir(n)
    }

    fn access(&self, name: &str, mode: AccessMode) -> Result<(), PathError> {
        self.inner.access(name, mode)
    }

    fn mknod(&self, name: &str, _mode: FileMode, _dev: u64) -> Result<(), PathError> {
        Err(PathError::new("mknod", name, ErrorKind::ReadOnly))
    }

    fn mkdir(&self, name: &str, _perm: FileMode) -> Result<(), PathError> {
        Err(PathError::new("mkdir", name, ErrorKind::ReadOnly))
    }

    fn rmdir(&self, name: &str) -> Result<(), PathError> {
        Err(PathError::new("rmdir", name, ErrorKind::ReadOnly))
    }

    fn unlink(&self, name: &str) -> Result<(), PathError> {
        Err(PathError::new("unlink", name, ErrorKind::ReadOnly))
    }

    fn symlink(&self, _old_name: &str, new_name: &str) -> Result<(), PathError> {
        Err(PathError::new("symlink", new_name, ErrorKind::ReadOnly))
    }

    fn link(&self, _old_name: &str, _new_dir: &dyn Directory, new_name: &str) -> Result<(), PathError> {
        Err(PathError::new("link", new_name, ErrorKind::ReadOnly))
    }

    fn rename(&self, _old_name: &str, _new_dir: &dyn Directory, new_name: &str) -> Result<(), PathError> {
        Err(PathError::new("rename", new_name, ErrorKind::ReadOnly))
    }

    fn lstat(&self, name: &str) -> Result<Metadata, PathError> {
        self.inner.lstat(name)
    }

    fn sys(&self) -> Option<&(dyn Any + Send + Sync)> {
        self.inner.sys()
    }
}

impl File for RecursiveReadOnly {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn read(&self, buf: &mut [u8]) -> Result<usize, PathError> {
        self.inner.read(buf)
    }

    fn read_at(&self, buf: &mut [u8], offset: u64) -> Result<usize, PathError> {
        self.inner.read_at(buf, offset)
    }

    fn write(&self, _buf: &[u8]) -> Result<usize, PathError> {
        Err(PathError::new("write", self.inner.name(), ErrorKind::ReadOnly))
    }

    fn write_at(&self, _buf: &[u8], _offset: u64) -> Result<usize, PathError> {
        Err(PathError::new("write", self.inner.name(), ErrorKind::ReadOnly))
    }

    fn seek(&self, pos: SeekFrom) -> Result<u64, PathError> {
        self.inner.seek(pos)
    }

    fn readlink(&self) -> Result<String, PathError> {
        self.inner.readlink()
    }

    fn chmod(&self, _mode: FileMode) -> Result<(), PathError> {
        Err(PathError::new("chmod", self.inner.name(), ErrorKind::ReadOnly))
    }

    fn chtimes(&self, _atime: SystemTime, _mtime: SystemTime) -> Result<(), PathError> {
        Err(PathError::new("chtimes", self.inner.name(), ErrorKind::ReadOnly))
    }

    fn truncate(&self, _size: u64) -> Result<(), PathError> {
        Err(PathError::new("truncate", self.inner.name(), ErrorKind::ReadOnly))
    }

    fn sync(&self) -> Result<(), PathError> {
        Ok(())
    }

    fn datasync(&self) -> Result<(), PathError> {
        Ok(())
    }

    fn stat(&self) -> Result<Metadata, PathError> {
        self.inner.stat()
    }

    fn close(&self) -> Result<(), PathError> {
        self.inner.close()
    }
}

/// A read-only view over a single already-open [`File`] handle, applied
/// directly by a caller rather than produced by [`ReadOnlyFS`].
///
/// This wrapper is deliberately *not* recursive: a
/// directory opened through it and then used to open a child returns
/// that child exactly as the inner handle would have, fully writable.
/// Reach for [`ReadOnlyFS`] instead when the restriction needs to hold
/// for an entire subtree.
pub struct ReadOnlyFile {
    inner: Box<dyn File>,
}

impl ReadOnlyFile {
    /// Pins `inner` read-only; does not affect handles opened through it.
    pub fn new(inner: Box<dyn File>) -> Self {
        Self { inner }
    }
}

impl Directory for ReadOnlyFile {
    fn open_file(&self, name: &str, flags: OpenFlags, perm: FileMode) -> Result<Box<dyn File>, PathError> {
        self.inner.open_file(name, flags, perm)
    }

    fn read_dir(&self, n: i64) -> Result<Vec<DirEntry>, PathError> {
        self.inner.read_dir(n)
    }

    fn access(&self, name: &str, mode: AccessMode) -> Result<(), PathError> {
        self.inner.access(name, mode)
    }

    fn mknod(&self, name: &str, mode: FileMode, dev: u64) -> Result<(), PathError> {
        self.inner.mknod(name, mode, dev)
    }

    fn mkdir(&self, name: &str, perm: FileMode) -> Result<(), PathError> {
        self.inner.mkdir(name, perm)
    }

    fn rmdir(&self, name: &str) -> Result<(), PathError> {
        self.inner.rmdir(name)
    }

    fn unlink(&self, name: &str) -> Result<(), PathError> {
        self.inner.unlink(name)
    }

    fn symlink(&self, old_name: &str, new_name: &str) -> Result<(), PathError> {
        self.inner.symlink(old_name, new_name)
    }

    fn link(&self, old_name: &str, new_dir: &dyn Directory, new_name: &str) -> Result<(), PathError> {
        self.inner.link(old_name, new_dir, new_name)
    }

    fn rename(&self, old_name: &str, new_dir: &dyn Directory, new_name: &str) -> Result<(), PathError> {
        self.inner.rename(old_name, new_dir, new_name)
    }

    fn lstat(&self, name: &str) -> Result<Metadata, PathError> {
        self.inner.lstat(name)
    }

    fn sys(&self) -> Option<&(dyn Any + Send + Sync)> {
        self.inner.sys()
    }
}

impl File for ReadOnlyFile {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn read(&self, buf: &mut [u8]) -> Result<usize, PathError> {
        self.inner.read(buf)
    }

    fn read_at(&self, buf: &mut [u8], offset: u64) -> Result<usize, PathError> {
        self.inner.read_at(buf, offset)
    }

    fn write(&self, _buf: &[u8]) -> Result<usize, PathError> {
        Err(PathError::new("write", self.inner.name(), ErrorKind::ReadOnly))
    }

    fn write_at(&self, _buf: &[u8], _offset: u64) -> Result<usize, PathError> {
        Err(PathError::new("write", self.inner.name(), ErrorKind::ReadOnly))
    }

    fn seek(&self, pos: SeekFrom) -> Result<u64, PathError> {
        self.inner.seek(pos)
    }

    fn readlink(&self) -> Result<String, PathError> {
        self.inner.readlink()
    }

    fn chmod(&self, _mode: FileMode) -> Result<(), PathError> {
        Err(PathError::new("chmod", self.inner.name(), ErrorKind::ReadOnly))
    }

    fn chtimes(&self, _atime: SystemTime, _mtime: SystemTime) -> Result<(), PathError> {
        Err(PathError::new("chtimes", self.inner.name(), ErrorKind::ReadOnly))
    }

    fn truncate(&self, _size: u64) -> Result<(), PathError> {
        Err(PathError::new("truncate", self.inner.name(), ErrorKind::ReadOnly))
    }

    fn sync(&self) -> Result<(), PathError> {
        Ok(())
    }

    fn datasync(&self) -> Result<(), PathError> {
        Ok(())
    }

    fn stat(&self) -> Result<Metadata, PathError> {
        self.inner.stat()
    }

    fn close(&self) -> Result<(), PathError> {
        self.inner.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dirfs::DirFS;

    #[test]
    fn mutating_ops_are_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let fs: Arc<dyn Directory> = Arc::new(DirFS::new(tmp.path()).unwrap());
        let ro = ReadOnlyFS::new(fs);

        let err = ro.mkdir("sub", FileMode::new_dir(0o755)).unwrap_err();
        assert!(err.kind().is_read_only());

        let err = ro
            .open_file("a.txt", OpenFlags::WRITE | OpenFlags::CREATE, FileMode::new_file(0o644))
            .unwrap_err();
        assert!(err.kind().is_read_only());
    }

    #[test]
    fn reads_pass_through() {
        let tmp = tempfile::tempdir().unwrap();
        {
            let fs = DirFS::new(tmp.path()).unwrap();
            let file = fs
                .open_file("a.txt", OpenFlags::WRITE | OpenFlags::CREATE, FileMode::new_file(0o644))
                .unwrap();
            file.write(b"hi").unwrap();
        }
        let fs: Arc<dyn Directory> = Arc::new(DirFS::new(tmp.path()).unwrap());
        let ro = ReadOnlyFS::new(fs);
        let file = ro.open_file("a.txt", OpenFlags::READ, FileMode::default()).unwrap();
        let mut buf = [0u8; 2];
        let n = file.read(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"hi");
    }

    #[test]
    fn file_handle_from_readonly_rejects_writes() {
        let tmp = tempfile::tempdir().unwrap();
        {
            let fs = DirFS::new(tmp.path()).unwrap();
            fs.open_file("a.txt", OpenFlags::WRITE | OpenFlags::CREATE, FileMode::new_file(0o644))
                .unwrap();
        }
        let fs: Arc<dyn Directory> = Arc::new(DirFS::new(tmp.path()).unwrap());
        let ro = ReadOnlyFS::new(fs);
        let file = ro.open_file("a.txt", OpenFlags::READ, FileMode::default()).unwrap();
        let err = file.write(b"x").unwrap_err();
        assert!(err.kind().is_read_only());
    }

    #[test]
    fn readonly_file_does_not_recurse_into_children() {
        let tmp = tempfile::tempdir().unwrap();
        let fs = DirFS::new(tmp.path()).unwrap();
        fs.mkdir("sub", FileMode::new_dir(0o755)).unwrap();
        let dir = fs.open_file("sub", OpenFlags::DIRECTORY, FileMode::default()).unwrap();

        let ro = ReadOnlyFile::new(dir);
        let child = ro
            .open_file("a.txt", OpenFlags::WRITE | OpenFlags::CREATE, FileMode::new_file(0o644))
            .unwrap();
        assert_eq!(child.write(b"hi").unwrap(), 2);
    }
}
