//! Path-prefixing sub-root.

use std::any::Any;

use crate::error::PathError;
use crate::handle::{Directory, File};
use crate::path::join_path;
use crate::types::{AccessMode, DirEntry, FileMode, Metadata, OpenFlags};

/// Presents `prefix` within `inner` as if it were its own root: every
/// path passed to a `SubFS` method is joined onto `prefix` before being
/// forwarded to `inner`.
///
/// Unlike [`crate::rootfs::RootFS`], `SubFS` does not resolve symlinks or
/// guard against `..` escaping `prefix` itself — it is a convenience view
/// for a trusted inner filesystem, not a sandbox boundary. Wrap a
/// `RootFS` around the result if that guarantee is needed.
pub struct SubFS {
    inner: std::sync::Arc<dyn Directory>,
    prefix: String,
}

impl SubFS {
    /// Roots a new view at `prefix` within `inner`. `prefix` must satisfy
    /// [`crate::path::valid_path`].
    pub fn new(inner: std::sync::Arc<dyn Directory>, prefix: &str) -> Result<Self, PathError> {
        crate::handle::validate_name("subfs", prefix)?;
        Ok(Self {
            inner,
            prefix: prefix.to_string(),
        })
    }

    fn full(&self, name: &str) -> String {
        join_path(&self.prefix, name)
    }

    fn root_handle(&self) -> Result<Box<dyn File>, PathError> {
        self.inner
            .open_file(&self.prefix, OpenFlags::READ | OpenFlags::DIRECTORY, FileMode::default())
    }
}

impl Directory for SubFS {
    fn open_file(&self, name: &str, flags: OpenFlags, perm: FileMode) -> Result<Box<dyn File>, PathError> {
        self.inner.open_file(&self.full(name), flags, perm)
    }

    fn read_dir(&self, n: i64) -> Result<Vec<DirEntry>, PathError> {
        self.root_handle()?.read_dir(n)
    }

    fn access(&self, name: &str, mode: AccessMode) -> Result<(), PathError> {
        self.inner.access(&self.full(name), mode)
    }

    fn mknod(&self, name: &str, mode: FileMode, dev: u64) -> Result<(), PathError> {
        self.inner.mknod(&self.full(name), mode, dev)
    }

    fn mkdir(&self, name: &str, perm: FileMode) -> Result<(), PathError> {
        self.inner.mkdir(&self.full(name), perm)
    }

    fn rmdir(&self, name: &str) -> Result<(), PathError> {
        self.inner.rmdir(&self.full(name))
    }

    fn unlink(&self, name: &str) -> Result<(), PathError> {
        self.inner.unlink(&self.full(name))
    }

    fn symlink(&self, old_name: &str, new_name: &str) -> Result<(), PathError> {
        self.inner.symlink(old_name, &self.full(new_name))
    }

    fn link(&self, old_name: &str, new_dir: &dyn Directory, new_name: &str) -> Result<(), PathError> {
        self.inner.link(&self.full(old_name), new_dir, new_name)
    }

    fn rename(&self, old_name: &str, new_dir: &dyn Directory, new_name: &str) -> Result<(), PathError> {
        self.inner.rename(&self.full(old_name), new_dir, new_name)
    }

    fn lstat(&self, name: &str) -> Result<Metadata, PathError> {
        self.inner.lstat(&self.full(name))
    }

    fn sys(&self) -> Option<&(dyn Any + Send + Sync)> {
        None
    }
}
