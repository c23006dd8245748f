//! Error-injecting stub filesystem.

use std::any::Any;

use crate::error::{ErrorKind, PathError};
use crate::handle::{Directory, File};
use crate::types::{AccessMode, DirEntry, FileMode, Metadata, OpenFlags};

/// A [`Directory`] where every operation fails with the same fixed
/// [`ErrorKind`]. Useful as a placeholder for a backend that failed to
/// initialize, or to inject a specific failure mode in tests without
/// standing up a real backend.
pub struct ErrFS {
    kind: ErrorKind,
}

impl ErrFS {
    /// Every operation on the returned filesystem fails with `kind`.
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind }
    }

    fn err(&self, op: &'static str, path: &str) -> PathError {
        PathError::new(op, path, self.kind)
    }
}

impl Directory for ErrFS {
    fn open_file(&self, name: &str, _flags: OpenFlags, _perm: FileMode) -> Result<Box<dyn File>, PathError> {
        if name == "." {
            return Ok(Box::new(ErrFile { kind: self.kind }));
        }
        Err(self.err("open", name))
    }

    fn read_dir(&self, _n: i64) -> Result<Vec<DirEntry>, PathError> {
        Err(self.err("readdir", "."))
    }

    fn access(&self, name: &str, _mode: AccessMode) -> Result<(), PathError> {
        Err(self.err("access", name))
    }

    fn mknod(&self, name: &str, _mode: FileMode, _dev: u64) -> Result<(), PathError> {
        Err(self.err("mknod", name))
    }

    fn mkdir(&self, name: &str, _perm: FileMode) -> Result<(), PathError> {
        Err(self.err("mkdir", name))
    }

    fn rmdir(&self, name: &str) -> Result<(), PathError> {
        Err(self.err("rmdir", name))
    }

    fn unlink(&self, name: &str) -> Result<(), PathError> {
        Err(self.err("unlink", name))
    }

    fn symlink(&self, _old_name: &str, new_name: &str) -> Result<(), PathError> {
        Err(self.err("symlink", new_name))
    }

    fn link(&self, _old_name: &str, _new_dir: &dyn Directory, new_name: &str) -> Result<(), PathError> {
        Err(self.err("link", new_name))
    }

    fn rename(&self, _old_name: &str, _new_dir: &dyn Directory, new_name: &str) -> Result<(), PathError> {
        Err(self.err("rename", new_name))
    }

    fn lstat(&self, name: &str) -> Result<Metadata, PathError> {
        Err(self.err("lstat", name))
    }

    fn sys(&self) -> Option<&(dyn Any + Send + Sync)> {
        None
    }
}

/// The stub handle returned by opening `.` on an [`ErrFS`]: every
/// relative operation on it still fails with the configured kind, which
/// keeps chain construction composable (a caller can always open the
/// root of a failed backend and get a handle, it just can't do
/// anything with it).
struct ErrFile {
    kind: ErrorKind,
}

impl ErrFile {
    fn err(&self, op: &'static str, path: &str) -> PathError {
        PathError::new(op, path, self.kind)
    }
}

impl Directory for ErrFile {
    fn open_file(&self, name: &str, _flags: OpenFlags, _perm: FileMode) -> Result<Box<dyn File>, PathError> {
        if name == "." {
            return Ok(Box::new(ErrFile { kind: self.kind }));
        }
        Err(self.err("open", name))
    }

    fn read_dir(&self, _n: i64) -> Result<Vec<DirEntry>, PathError> {
        Err(self.err("readdir", "."))
    }

    fn access(&self, name: &str, _mode: AccessMode) -> Result<(), PathError> {
        Err(self.err("access", name))
    }

    fn mknod(&self, name: &str, _mode: FileMode, _dev: u64) -> Result<(), PathError> {
        Err(self.err("mknod", name))
    }

    fn mkdir(&self, name: &str, _perm: FileMode) -> Result<(), PathError> {
        Err(self.err("mkdir", name))
    }

    fn rmdir(&self, name: &str) -> Result<(), PathError> {
        Err(self.err("rmdir", name))
    }

    fn unlink(&self, name: &str) -> Result<(), PathError> {
        Err(self.err("unlink", name))
    }

    fn symlink(&self, _old_name: &str, new_name: &str) -> Result<(), PathError> {
        Err(self.err("symlink", new_name))
    }

    fn link(&self, _old_name: &str, _new_dir: &dyn Directory, new_name: &str) -> Result<(), PathError> {
        Err(self.err("link", new_name))
    }

    fn rename(&self, _old_name: &str, _new_dir: &dyn Directory, new_name: &str) -> Result<(), PathError> {
        Err(self.err("rename", new_name))
    }

    fn lstat(&self, name: &str) -> Result<Metadata, PathError> {
        Err(self.err("lstat", name))
    }

    fn sys(&self) -> Option<&(dyn Any + Send + Sync)> {
        None
    }
}

impl File for ErrFile {
    fn name(&self) -> &str {
        "."
    }

    fn read(&self, _buf: &mut [u8]) -> Result<usize, PathError> {
        Err(self.err("read", "."))
    }

    fn read_at(&self, _buf: &mut [u8], _offset: u64) -> Result<usize, PathError> {
        Err(self.err("read", "."))
    }

    fn write(&self, _buf: &[u8]) -> Result<usize, PathError> {
        Err(self.err("write", "."))
    }

    fn write_at(&self, _buf: &[u8], _offset: u64) -> Result<usize, PathError> {
        Err(self.err("write", "."))
    }

    fn seek(&self, _pos: std::io::SeekFrom) -> Result<u64, PathError> {
        Err(self.err("seek", "."))
    }

    fn readlink(&self) -> Result<String, PathError> {
        Err(self.err("readlink", "."))
    }

    fn chmod(&self, _mode: FileMode) -> Result<(), PathError> {
        Err(self.err("chmod", "."))
    }

    fn chtimes(&self, _atime: std::time::SystemTime, _mtime: std::time::SystemTime) -> Result<(), PathError> {
        Err(self.err("chtimes", "."))
    }

    fn truncate(&self, _size: u64) -> Result<(), PathError> {
        Err(self.err("truncate", "."))
    }

    fn sync(&self) -> Result<(), PathError> {
        Err(self.err("sync", "."))
    }

    fn stat(&self) -> Result<Metadata, PathError> {
        Err(self.err("stat", "."))
    }

    fn close(&self) -> Result<(), PathError> {
        Ok(())
    }
}
