//! Layered overlay.

use std::any::Any;
use std::collections::HashSet;
use std::io::SeekFrom;
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use crate::error::{ErrorKind, PathError};
use crate::handle::{CloseGuard, Directory, File, ReadDirIter};
use crate::types::{AccessMode, DirEntry, FileMode, Metadata, OpenFlags};

/// An overlay of N directories, declared low-to-high precedence: the
/// *last* layer shadows everything below it.
///
/// Opens are tried top-down (highest precedence first); the first
/// result that isn't [`ErrorKind::NotExist`] wins, whether that's a
/// success or some other failure — which is also how a non-directory
/// entry in a high layer masks a same-named directory in a lower one,
/// with no separate masking pass needed. When more than one layer
/// yields a directory at the same path, their listings are merged
/// (topmost wins on name collisions) instead of only the first
/// surviving.
///
/// Mutating operations (`mkdir`, `unlink`, `rename`, ...) always target
/// the topmost layer, mirroring how a real overlay filesystem has
/// exactly one upper, writable layer and treats the rest as read-only
/// history.
pub struct LayerFS {
    layers: Vec<Arc<dyn Directory>>,
}

impl LayerFS {
    /// Builds an overlay from `layers`, given low-to-high precedence
    /// (the last entry shadows everything before it). Fails with
    /// [`ErrorKind::Invalid`] if `layers` is empty.
    pub fn new(layers: Vec<Arc<dyn Directory>>) -> Result<Self, PathError> {
        if layers.is_empty() {
            return Err(PathError::new("layerfs", ".", ErrorKind::Invalid));
        }
        Ok(Self { layers })
    }

    fn top(&self) -> &Arc<dyn Directory> {
        self.layers.last().expect("LayerFS is never built with zero layers")
    }
}

/// Tries `name` against each of `layers`, already ordered highest
/// precedence first. Collects every directory hit for a merged view;
/// stops (without descending further) at the first non-directory
/// success or non-`NotExist` error, since that entry masks anything
/// beneath it in lower layers.
fn merge_open<'a>(
    layers: impl Iterator<Item = &'a dyn Directory>,
    name: &str,
    flags: OpenFlags,
    perm: FileMode,
) -> Result<Box<dyn File>, PathError> {
    let mut hits: Vec<Box<dyn File>> = Vec::new();
    let mut first_not_exist: Option<PathError> = None;

    for layer in layers {
        match layer.open_file(name, flags, perm) {
            Ok(handle) => {
                let is_dir = handle.stat().map(|m| m.is_dir()).unwrap_or(false);
                if is_dir {
                    hits.push(handle);
                    continue;
                } else if hits.is_empty() {
                    return Ok(handle);
                } else {
                    break;
                }
            }
            Err(e) if e.kind().is_not_exist() => {
                if first_not_exist.is_none() {
                    first_not_exist = Some(e);
                }
                continue;
            }
            Err(e) => {
                if hits.is_empty() {
                    return Err(e);
                }
                break;
            }
        }
    }

    if hits.is_empty() {
        return Err(first_not_exist.unwrap_or_else(|| PathError::new("open", name, ErrorKind::NotExist)));
    }
    if hits.len() == 1 {
        return Ok(hits.into_iter().next().expect("checked len == 1"));
    }
    Ok(Box::new(LayerDirHandle::new(name.to_string(), hits)?))
}

fn merge_lstat<'a>(layers: impl Iterator<Item = &'a dyn Directory>, name: &str) -> Result<Metadata, PathError> {
    let mut first_not_exist = None;
    for layer in layers {
        match layer.lstat(name) {
            Ok(meta) => return Ok(meta),
            Err(e) if e.kind().is_not_exist() => {
                if first_not_exist.is_none() {
                    first_not_exist = Some(e);
                }
            }
            Err(e) => return Err(e),
        }
    }
    Err(first_not_exist.unwrap_or_else(|| PathError::new("lstat", name, ErrorKind::NotExist)))
}

fn merge_access<'a>(layers: impl Iterator<Item = &'a dyn Directory>, name: &str, mode: AccessMode) -> Result<(), PathError> {
    let mut first_not_exist = None;
    for layer in layers {
        match layer.access(name, mode) {
            Ok(()) => return Ok(()),
            Err(e) if e.kind().is_not_exist() => {
                if first_not_exist.is_none() {
                    first_not_exist = Some(e);
                }
            }
            Err(e) => return Err(e),
        }
    }
    Err(first_not_exist.unwrap_or_else(|| PathError::new("access", name, ErrorKind::NotExist)))
}

fn merge_read_dir<'a>(layers: impl Iterator<Item = &'a dyn Directory>, n: i64) -> Result<Vec<DirEntry>, PathError> {
    let mut seen = HashSet::new();
    let mut merged = Vec::new();
    for layer in layers {
        for entry in layer.read_dir(-1)? {
            if seen.insert(entry.name.clone()) {
                merged.push(entry);
            }
        }
    }
    Ok(ReadDirIter::from_vec(merged).take_n(n))
}

impl Directory for LayerFS {
    fn open_file(&self, name: &str, flags: OpenFlags, perm: FileMode) -> Result<Box<dyn File>, PathError> {
        merge_open(self.layers.iter().rev().map(|l| l.as_ref()), name, flags, perm)
    }

    fn read_dir(&self, n: i64) -> Result<Vec<DirEntry>, PathError> {
        merge_read_dir(self.layers.iter().rev().map(|l| l.as_ref()), n)
    }

    fn access(&self, name: &str, mode: AccessMode) -> Result<(), PathError> {
        merge_access(self.layers.iter().rev().map(|l| l.as_ref()), name, mode)
    }

    fn mknod(&self, name: &str, mode: FileMode, dev: u64) -> Result<(), PathError> {
        self.top().mknod(name, mode, dev)
    }

    fn mkdir(&self, name: &str, perm: FileMode) -> Result<(), PathError> {
        self.top().mkdir(name, perm)
    }

    fn rmdir(&self, name: &str) -> Result<(), PathError> {
        self.top().rmdir(name)
    }

    fn unlink(&self, name: &str) -> Result<(), PathError> {
        self.top().unlink(name)
    }

    fn symlink(&self, old_name: &str, new_name: &str) -> Result<(), PathError> {
        self.top().symlink(old_name, new_name)
    }

    fn link(&self, old_name: &str, new_dir: &dyn Directory, new_name: &str) -> Result<(), PathError> {
        self.top().link(old_name, new_dir, new_name)
    }

    fn rename(&self, old_name: &str, new_dir: &dyn Directory, new_name: &str) -> Result<(), PathError> {
        self.top().rename(old_name, new_dir, new_name)
    }

    fn lstat(&self, name: &str) -> Result<Metadata, PathError> {
        merge_lstat(self.layers.iter().rev().map(|l| l.as_ref()), name)
    }

    fn sys(&self) -> Option<&(dyn Any + Send + Sync)> {
        None
    }
}

/// A merged directory view spanning every layer that had a directory
/// at the path it was opened from, topmost first. Its listing is built
/// once, at open time, the same way [`crate::dirfs::DirFsHandle`] reads
/// a real directory stream once and chunks it out via `n`.
struct LayerDirHandle {
    name: String,
    handles: Vec<Box<dyn File>>,
    guard: CloseGuard,
    entries: Mutex<ReadDirIter>,
}

impl LayerDirHandle {
    fn new(name: String, handles: Vec<Box<dyn File>>) -> Result<Self, PathError> {
        let mut seen = HashSet::new();
        let mut merged = Vec::new();
        for handle in &handles {
            for entry in handle.read_dir(-1)? {
                if seen.insert(entry.name.clone()) {
                    merged.push(entry);
                }
            }
        }
        Ok(Self {
            name,
            handles,
            guard: CloseGuard::new(),
            entries: Mutex::new(ReadDirIter::from_vec(merged)),
        })
    }

    fn top(&self) -> &dyn File {
        self.handles.first().expect("LayerDirHandle is never built with zero handles").as_ref()
    }
}

impl Directory for LayerDirHandle {
    fn open_file(&self, name: &str, flags: OpenFlags, perm: FileMode) -> Result<Box<dyn File>, PathError> {
        self.guard.check("open", &self.name)?;
        merge_open(self.handles.iter().map(|h| h.as_ref() as &dyn Directory), name, flags, perm)
    }

    fn read_dir(&self, n: i64) -> Result<Vec<DirEntry>, PathError> {
        self.guard.check("readdir", &self.name)?;
        Ok(self.entries.lock().expect("LayerDirHandle entries mutex poisoned").take_n(n))
    }

    fn access(&self, name: &str, mode: AccessMode) -> Result<(), PathError> {
        self.guard.check("access", &self.name)?;
        merge_access(self.handles.iter().map(|h| h.as_ref() as &dyn Directory), name, mode)
    }

    fn mknod(&self, name: &str, mode: FileMode, dev: u64) -> Result<(), PathError> {
        self.top().mknod(name, mode, dev)
    }

    fn mkdir(&self, name: &str, perm: FileMode) -> Result<(), PathError> {
        self.top().mkdir(name, perm)
    }

    fn rmdir(&self, name: &str) -> Result<(), PathError> {
        self.top().rmdir(name)
    }

    fn unlink(&self, name: &str) -> Result<(), PathError> {
        self.top().unlink(name)
    }

    fn symlink(&self, old_name: &str, new_name: &str) -> Result<(), PathError> {
        self.top().symlink(old_name, new_name)
    }

    fn link(&self, old_name: &str, new_dir: &dyn Directory, new_name: &str) -> Result<(), PathError> {
        self.top().link(old_name, new_dir, new_name)
    }

    fn rename(&self, old_name: &str, new_dir: &dyn Directory, new_name: &str) -> Result<(), PathError> {
        self.top().rename(old_name, new_dir, new_name)
    }

    fn lstat(&self, name: &str) -> Result<Metadata, PathError> {
        self.guard.check("lstat", &self.name)?;
        merge_lstat(self.handles.iter().map(|h| h.as_ref() as &dyn Directory), name)
    }

    fn sys(&self) -> Option<&(dyn Any + Send + Sync)> {
        None
    }
}

impl File for LayerDirHandle {
    fn name(&self) -> &str {
        &self.name
    }

    fn read(&self, _buf: &mut [u8]) -> Result<usize, PathError> {
        Err(PathError::new("read", &self.name, ErrorKind::NotDirectory))
    }

    fn read_at(&self, _buf: &mut [u8], _offset: u64) -> Result<usize, PathError> {
        Err(PathError::new("read", &self.name, ErrorKind::NotDirectory))
    }

    fn write(&self, _buf: &[u8]) -> Result<usize, PathError> {
        Err(PathError::new("write", &self.name, ErrorKind::NotDirectory))
    }

    fn write_at(&self, _buf: &[u8], _offset: u64) -> Result<usize, PathError> {
        Err(PathError::new("write", &self.name, ErrorKind::NotDirectory))
    }

    fn seek(&self, _pos: SeekFrom) -> Result<u64, PathError> {
        Err(PathError::new("seek", &self.name, ErrorKind::NotDirectory))
    }

    fn readlink(&self) -> Result<String, PathError> {
        Err(PathError::new("readlink", &self.name, ErrorKind::NotSupported))
    }

    fn chmod(&self, mode: FileMode) -> Result<(), PathError> {
        self.top().chmod(mode)
    }

    fn chtimes(&self, atime: SystemTime, mtime: SystemTime) -> Result<(), PathError> {
        self.top().chtimes(atime, mtime)
    }

    fn truncate(&self, _size: u64) -> Result<(), PathError> {
        Err(PathError::new("truncate", &self.name, ErrorKind::NotDirectory))
    }

    fn sync(&self) -> Result<(), PathError> {
        Ok(())
    }

    fn stat(&self) -> Result<Metadata, PathError> {
        self.top().stat()
    }

    fn close(&self) -> Result<(), PathError> {
        self.guard.close("close", &self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dirfs::DirFS;

    fn write_file(fs: &DirFS, name: &str, content: &[u8]) {
        let file = fs
            .open_file(name, OpenFlags::WRITE | OpenFlags::CREATE, FileMode::new_file(0o644))
            .unwrap();
        file.write(content).unwrap();
    }

    #[test]
    fn top_layer_shadows_bottom_layer() {
        let lower = tempfile::tempdir().unwrap();
        let upper = tempfile::tempdir().unwrap();
        write_file(&DirFS::new(lower.path()).unwrap(), "file", b"A");
        write_file(&DirFS::new(upper.path()).unwrap(), "file", b"B");

        let layers: Vec<Arc<dyn Directory>> = vec![
            Arc::new(DirFS::new(lower.path()).unwrap()),
            Arc::new(DirFS::new(upper.path()).unwrap()),
        ];
        let overlay = LayerFS::new(layers).unwrap();

        let file = overlay.open_file("file", OpenFlags::READ, FileMode::default()).unwrap();
        let mut buf = [0u8; 1];
        file.read(&mut buf).unwrap();
        assert_eq!(&buf, b"B");
    }

    #[test]
    fn missing_from_top_falls_through_to_bottom() {
        let lower = tempfile::tempdir().unwrap();
        let upper = tempfile::tempdir().unwrap();
        write_file(&DirFS::new(lower.path()).unwrap(), "only-below", b"A");

        let layers: Vec<Arc<dyn Directory>> = vec![
            Arc::new(DirFS::new(lower.path()).unwrap()),
            Arc::new(DirFS::new(upper.path()).unwrap()),
        ];
        let overlay = LayerFS::new(layers).unwrap();

        let file = overlay.open_file("only-below", OpenFlags::READ, FileMode::default()).unwrap();
        let mut buf = [0u8; 1];
        file.read(&mut buf).unwrap();
        assert_eq!(&buf, b"A");
    }

    #[test]
    fn read_dir_merges_and_dedupes_across_layers() {
        let lower = tempfile::tempdir().unwrap();
        let upper = tempfile::tempdir().unwrap();
        write_file(&DirFS::new(lower.path()).unwrap(), "shared", b"A");
        write_file(&DirFS::new(lower.path()).unwrap(), "only-lower", b"A");
        write_file(&DirFS::new(upper.path()).unwrap(), "shared", b"B");
        write_file(&DirFS::new(upper.path()).unwrap(), "only-upper", b"B");

        let layers: Vec<Arc<dyn Directory>> = vec![
            Arc::new(DirFS::new(lower.path()).unwrap()),
            Arc::new(DirFS::new(upper.path()).unwrap()),
        ];
        let overlay = LayerFS::new(layers).unwrap();

        let mut names: Vec<String> = overlay.read_dir(-1).unwrap().into_iter().map(|e| e.name).collect();
        names.sort();
        assert_eq!(names, vec!["only-lower", "only-upper", "shared"]);
    }

    #[test]
    fn mutations_land_on_the_top_layer() {
        let lower = tempfile::tempdir().unwrap();
        let upper = tempfile::tempdir().unwrap();

        let layers: Vec<Arc<dyn Directory>> = vec![
            Arc::new(DirFS::new(lower.path()).unwrap()),
            Arc::new(DirFS::new(upper.path()).unwrap()),
        ];
        let overlay = LayerFS::new(layers).unwrap();
        overlay.mkdir("created", FileMode::new_dir(0o755)).unwrap();

        assert!(DirFS::new(upper.path()).unwrap().lstat("created").unwrap().is_dir());
        assert!(DirFS::new(lower.path()).unwrap().lstat("created").is_err());
    }
}
