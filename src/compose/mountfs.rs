//! Mount-point stacking: routes by the most specific mounted prefix.

use std::any::Any;
use std::sync::Arc;

use crate::error::{ErrorKind, PathError};
use crate::handle::{validate_target, Directory, File};
use crate::path::{path_contains, valid_path};
use crate::types::{AccessMode, DirEntry, FileMode, Metadata, OpenFlags};

/// One mounted filesystem, grafted at `path` within a [`MountFS`].
struct MountPoint {
    path: String,
    fs: Arc<dyn Directory>,
}

/// Routes every operation to whichever of its mounted filesystems owns
/// the most specific prefix of the requested path, stripping that
/// prefix before forwarding — a specialization of [`crate::compose::layerfs::LayerFS`]'s
/// stacking where precedence is decided by path prefix rather than
/// declaration order.
///
/// This only routes operations; it does not synthesize mount-point
/// entries into a parent directory's listing the way a real mount
/// table would appear in `/proc/mounts` — `read_dir` on `MountFS`
/// itself simply lists the root filesystem's own entries. Callers that
/// need mount points to be visible in a listing should materialize a
/// real directory at each mount path in the root filesystem.
pub struct MountFS {
    root: Arc<dyn Directory>,
    mounts: Vec<MountPoint>,
}

impl MountFS {
    /// Builds a router over `root`, grafting each `(path, fs)` pair in
    /// `mounts` at its path. Every mount path must satisfy
    /// [`crate::path::valid_path`] and must not be `.` (the root itself
    /// can't be remounted this way); violating either fails with
    /// [`ErrorKind::Invalid`].
    pub fn new(root: Arc<dyn Directory>, mounts: Vec<(String, Arc<dyn Directory>)>) -> Result<Self, PathError> {
        let mut built = Vec::with_capacity(mounts.len());
        for (path, fs) in mounts {
            if path == "." || !valid_path(&path) {
                return Err(PathError::new("mount", path, ErrorKind::Invalid));
            }
            built.push(MountPoint { path, fs });
        }
        Ok(Self { root, mounts: built })
    }

    /// Returns the mount path that most specifically covers `p`, or
    /// `None` if `p` is only covered by the root.
    pub fn find_mount_point(&self, p: &str) -> Option<&str> {
        self.mounts
            .iter()
            .filter(|mp| path_contains(&mp.path, p))
            .max_by_key(|mp| mp.path.len())
            .map(|mp| mp.path.as_str())
    }

    fn route(&self, name: &str) -> (&dyn Directory, String) {
        let best = self
            .mounts
            .iter()
            .filter(|mp| path_contains(&mp.path, name))
            .max_by_key(|mp| mp.path.len());

        match best {
            Some(mp) => {
                let relative = if name == mp.path {
                    ".".to_string()
                } else {
                    name[mp.path.len() + 1..].to_string()
                };
                (mp.fs.as_ref(), relative)
            }
            None => (self.root.as_ref(), name.to_string()),
        }
    }
}

impl Directory for MountFS {
    fn open_file(&self, name: &str, flags: OpenFlags, perm: FileMode) -> Result<Box<dyn File>, PathError> {
        let (fs, rel) = self.route(name);
        fs.open_file(&rel, flags, perm)
    }

    fn read_dir(&self, n: i64) -> Result<Vec<DirEntry>, PathError> {
        self.root.read_dir(n)
    }

    fn access(&self, name: &str, mode: AccessMode) -> Result<(), PathError> {
        let (fs, rel) = self.route(name);
        fs.access(&rel, mode)
    }

    fn mknod(&self, name: &str, mode: FileMode, dev: u64) -> Result<(), PathError> {
        let (fs, rel) = self.route(name);
        fs.mknod(&rel, mode, dev)
    }

    fn mkdir(&self, name: &str, perm: FileMode) -> Result<(), PathError> {
        let (fs, rel) = self.route(name);
        fs.mkdir(&rel, perm)
    }

    fn rmdir(&self, name: &str) -> Result<(), PathError> {
        let (fs, rel) = self.route(name);
        fs.rmdir(&rel)
    }

    fn unlink(&self, name: &str) -> Result<(), PathError> {
        let (fs, rel) = self.route(name);
        fs.unlink(&rel)
    }

    fn symlink(&self, old_name: &str, new_name: &str) -> Result<(), PathError> {
        validate_target("symlink", new_name)?;
        let (fs, rel) = self.route(new_name);
        fs.symlink(old_name, &rel)
    }

    fn link(&self, old_name: &str, new_dir: &dyn Directory, new_name: &str) -> Result<(), PathError> {
        let (fs, rel) = self.route(old_name);
        fs.link(&rel, new_dir, new_name)
    }

    fn rename(&self, old_name: &str, new_dir: &dyn Directory, new_name: &str) -> Result<(), PathError> {
        let (fs, rel) = self.route(old_name);
        fs.rename(&rel, new_dir, new_name)
    }

    fn lstat(&self, name: &str) -> Result<Metadata, PathError> {
        let (fs, rel) = self.route(name);
        fs.lstat(&rel)
    }

    fn sys(&self) -> Option<&(dyn Any + Send + Sync)> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dirfs::DirFS;

    #[test]
    fn routes_to_the_most_specific_mount() {
        let root = tempfile::tempdir().unwrap();
        let mnt = tempfile::tempdir().unwrap();
        DirFS::new(mnt.path())
            .unwrap()
            .open_file("x.txt", OpenFlags::WRITE | OpenFlags::CREATE, FileMode::new_file(0o644))
            .unwrap();

        let root_fs: Arc<dyn Directory> = Arc::new(DirFS::new(root.path()).unwrap());
        let mounted: Arc<dyn Directory> = Arc::new(DirFS::new(mnt.path()).unwrap());
        let fs = MountFS::new(root_fs, vec![("data".to_string(), mounted)]).unwrap();

        assert!(fs.lstat("data/x.txt").is_ok());
        assert_eq!(fs.find_mount_point("data/x.txt"), Some("data"));
    }

    #[test]
    fn unmounted_paths_route_to_root() {
        let root = tempfile::tempdir().unwrap();
        DirFS::new(root.path())
            .unwrap()
            .open_file("y.txt", OpenFlags::WRITE | OpenFlags::CREATE, FileMode::new_file(0o644))
            .unwrap();

        let unused_mount = tempfile::tempdir().unwrap();
        let root_fs: Arc<dyn Directory> = Arc::new(DirFS::new(root.path()).unwrap());
        let mounted: Arc<dyn Directory> = Arc::new(DirFS::new(unused_mount.path()).unwrap());
        let fs = MountFS::new(root_fs, vec![("data".to_string(), mounted)]).unwrap();

        assert!(fs.lstat("y.txt").is_ok());
        assert_eq!(fs.find_mount_point("y.txt"), None);
    }

    #[test]
    fn rejects_root_as_a_mount_path() {
        let root_dir = tempfile::tempdir().unwrap();
        let other_dir = tempfile::tempdir().unwrap();
        let root_fs: Arc<dyn Directory> = Arc::new(DirFS::new(root_dir.path()).unwrap());
        let other: Arc<dyn Directory> = Arc::new(DirFS::new(other_dir.path()).unwrap());
        assert!(MountFS::new(root_fs, vec![(".".to_string(), other)]).is_err());
    }
}
