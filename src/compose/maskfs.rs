//! Predicate-gated masking.

use std::any::Any;
use std::io::SeekFrom;
use std::sync::Arc;
use std::time::SystemTime;

use crate::compose::write_flags_requested;
use crate::error::{ErrorKind, PathError};
use crate::handle::{Directory, File};
use crate::path::join_path;
use crate::types::{AccessMode, DirEntry, FileMode, Metadata, OpenFlags};

/// What a [`MaskFS`] predicate decides for one opened entry.
#[derive(Debug, Clone, Copy)]
pub enum MaskAction {
    /// Let the open through unchanged.
    Allow,
    /// Fail the open with the given kind, as though the entry did not
    /// satisfy the caller's request.
    Deny(ErrorKind),
    /// Let reads through; fail any write-shaped open with
    /// [`ErrorKind::ReadOnly`].
    ReadOnly,
}

type Predicate = dyn Fn(&str, &Metadata) -> MaskAction + Send + Sync;

/// Gates every open under `inner` through a caller-supplied predicate
/// evaluated against the just-opened entry's stat.
///
/// Unlike [`crate::readonly::ReadOnlyFS`], which is a blanket policy, a
/// `MaskFS` predicate sees the entry's path and metadata and can mix
/// `Allow`/`Deny`/`ReadOnly` per entry — hiding dotfiles, or making
/// everything below a given depth read-only, without writing a new
/// wrapper for each policy.
///
/// Opening `.` itself is never masked, so chain construction stays
/// composable the same way [`crate::compose::errfs::ErrFS`]'s stub root
/// does; everything opened underneath it is.
pub struct MaskFS {
    inner: Arc<dyn Directory>,
    predicate: Arc<Predicate>,
}

impl MaskFS {
    /// Wraps `inner`, gating every non-`.` open through `predicate`.
    pub fn new(inner: Arc<dyn Directory>, predicate: impl Fn(&str, &Metadata) -> MaskAction + Send + Sync + 'static) -> Self {
        Self {
            inner,
            predicate: Arc::new(predicate),
        }
    }

    /// Hides every entry whose final path component starts with `.`
    /// (besides `.` itself), making masked entries behave as though
    /// they do not exist.
    pub fn hide_dotfiles(inner: Arc<dyn Directory>) -> Self {
        Self::new(inner, |path, _meta| {
            let last = path.rsplit('/').next().unwrap_or(path);
            if last != "." && last.starts_with('.') {
                MaskAction::Deny(ErrorKind::NotExist)
            } else {
                MaskAction::Allow
            }
        })
    }

    /// Makes every entry at or below `depth` path components from the
    /// root read-only, while leaving shallower entries writable.
    pub fn read_only_below(inner: Arc<dyn Directory>, depth: usize) -> Self {
        Self::new(inner, move |path, _meta| {
            if path == "." {
                return MaskAction::Allow;
            }
            if path.split('/').count() >= depth {
                MaskAction::ReadOnly
            } else {
                MaskAction::Allow
            }
        })
    }

    fn gate(predicate: &Predicate, path: &str, flags: OpenFlags, file: Box<dyn File>) -> Result<Box<dyn File>, PathError> {
        let meta = match file.stat() {
            Ok(meta) => meta,
            Err(e) => {
                let _ = file.close();
                return Err(e);
            }
        };
        match predicate(path, &meta) {
            MaskAction::Allow => Ok(file),
            MaskAction::Deny(kind) => {
                let _ = file.close();
                Err(PathError::new("open", path, kind))
            }
            MaskAction::ReadOnly if write_flags_requested(flags) => {
                let _ = file.close();
                Err(PathError::new("open", path, ErrorKind::ReadOnly))
            }
            MaskAction::ReadOnly => Ok(file),
        }
    }
}

impl Directory for MaskFS {
    fn open_file(&self, name: &str, flags: OpenFlags, perm: FileMode) -> Result<Box<dyn File>, PathError> {
        let file = self.inner.open_file(name, flags, perm)?;
        if name == "." {
            return Ok(Box::new(MaskedHandle {
                inner: file,
                path: ".".to_string(),
                predicate: Arc::clone(&self.predicate),
            }));
        }
        let file = Self::gate(&self.predicate, name, flags, file)?;
        Ok(Box::new(MaskedHandle {
            inner: file,
            path: name.to_string(),
            predicate: Arc::clone(&self.predicate),
        }))
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
        None
    }
}

/// A handle returned through [`MaskFS`], carrying its path relative to
/// the mask's root so further opens underneath it keep being checked
/// against the same predicate.
struct MaskedHandle {
    inner: Box<dyn File>,
    path: String,
    predicate: Arc<Predicate>,
}

impl Directory for MaskedHandle {
    fn open_file(&self, name: &str, flags: OpenFlags, perm: FileMode) -> Result<Box<dyn File>, PathError> {
        let full = join_path(&self.path, name);
        let file = self.inner.open_file(name, flags, perm)?;
        let file = MaskFS::gate(&self.predicate, &full, flags, file)?;
        Ok(Box::new(MaskedHandle {
            inner: file,
            path: full,
            predicate: Arc::clone(&self.predicate),
        }))
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

impl File for MaskedHandle {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn read(&self, buf: &mut [u8]) -> Result<usize, PathError> {
        self.inner.read(buf)
    }

    fn read_at(&self, buf: &mut [u8], offset: u64) -> Result<usize, PathError> {
        self.inner.read_at(buf, offset)
    }

    fn write(&self, buf: &[u8]) -> Result<usize, PathError> {
        self.inner.write(buf)
    }

    fn write_at(&self, buf: &[u8], offset: u64) -> Result<usize, PathError> {
        self.inner.write_at(buf, offset)
    }

    fn seek(&self, pos: SeekFrom) -> Result<u64, PathError> {
        self.inner.seek(pos)
    }

    fn readlink(&self) -> Result<String, PathError> {
        self.inner.readlink()
    }

    fn chmod(&self, mode: FileMode) -> Result<(), PathError> {
        self.inner.chmod(mode)
    }

    fn chtimes(&self, atime: SystemTime, mtime: SystemTime) -> Result<(), PathError> {
        self.inner.chtimes(atime, mtime)
    }

    fn truncate(&self, size: u64) -> Result<(), PathError> {
        self.inner.truncate(size)
    }

    fn sync(&self) -> Result<(), PathError> {
        self.inner.sync()
    }

    fn datasync(&self) -> Result<(), PathError> {
        self.inner.datasync()
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
    fn hide_dotfiles_denies_dotted_names() {
        let tmp = tempfile::tempdir().unwrap();
        let fs = DirFS::new(tmp.path()).unwrap();
        fs.open_file(".hidden", OpenFlags::WRITE | OpenFlags::CREATE, FileMode::new_file(0o644))
            .unwrap();
        fs.open_file("visible", OpenFlags::WRITE | OpenFlags::CREATE, FileMode::new_file(0o644))
            .unwrap();

        let inner: Arc<dyn Directory> = Arc::new(DirFS::new(tmp.path()).unwrap());
        let masked = MaskFS::hide_dotfiles(inner);

        let err = masked.open_file(".hidden", OpenFlags::READ, FileMode::default()).unwrap_err();
        assert!(err.kind().is_not_exist());

        assert!(masked.open_file("visible", OpenFlags::READ, FileMode::default()).is_ok());
    }

    #[test]
    fn read_only_below_blocks_writes_past_depth() {
        let tmp = tempfile::tempdir().unwrap();
        let fs = DirFS::new(tmp.path()).unwrap();
        fs.mkdir("a", FileMode::new_dir(0o755)).unwrap();
        fs.open_file("a/b.txt", OpenFlags::WRITE | OpenFlags::CREATE, FileMode::new_file(0o644))
            .unwrap();

        let inner: Arc<dyn Directory> = Arc::new(DirFS::new(tmp.path()).unwrap());
        let masked = MaskFS::read_only_below(inner, 1);

        let err = masked
            .open_file("a/b.txt", OpenFlags::WRITE, FileMode::default())
            .unwrap_err();
        assert!(err.kind().is_read_only());

        assert!(masked.open_file("a/b.txt", OpenFlags::READ, FileMode::default()).is_ok());
    }
}
