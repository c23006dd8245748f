//! # `DirFS` — Host-Backed Leaf Filesystem
//!
//! The one [`Directory`] implementation in this crate that actually
//! touches a real host filesystem, built on
//! [`cap_std::fs::Dir`]'s directory-relative (`openat`-family)
//! primitives rather than absolute paths — the same boundary this
//! crate's design holds everywhere else: no operation here ever resolves
//! a path against anything but a handle already held open.
//!
//! `cap_std` is this crate's external collaborator for raw host syscalls;
//! everything `DirFS` does is translate this crate's [`Directory`]/[`File`]
//! contract onto `cap_std`'s capability-safe directory handles.
//!
//! `DirFS` does **not** sandbox path traversal on its own — a name like
//! `"../../etc/passwd"` is rejected only because [`crate::path::valid_path`]
//! forbids a `..` that isn't a contiguous leading run, not because
//! `DirFS` tracks a root boundary. Wrap it in [`crate::rootfs::RootFS`]
//! for an escape-proof sandbox.

use std::io::SeekFrom;
use std::sync::Mutex;
use std::time::SystemTime;

use cap_std::fs::{Dir, OpenOptions};

use crate::error::{ErrorKind, PathError};
use crate::handle::{validate_name, validate_target, CloseGuard, Directory, File};
use crate::sys;
use crate::types::{AccessMode, DirEntry, FileMode, Metadata, OpenFlags};

/// A filesystem rooted at a real host directory, opened once at
/// construction and held as a capability for the lifetime of this value.
///
/// Every operation is relative to that directory (or to a subdirectory
/// reached by previously resolving into it) — `DirFS` never re-resolves
/// an absolute path against the host's root.
pub struct DirFS {
    dir: Dir,
    label: String,
    guard: CloseGuard,
}

impl DirFS {
    /// Opens `root` as a host directory and returns a filesystem rooted
    /// there. Fails with [`ErrorKind::NotExist`]/[`ErrorKind::Permission`]
    /// (normalized from the underlying I/O error) if `root` cannot be
    /// opened as a directory.
    pub fn new(root: impl AsRef<std::path::Path>) -> Result<Self, PathError> {
        let root = root.as_ref();
        let dir = Dir::open_ambient_dir(root, cap_std::ambient_authority()).map_err(|e| {
            tracing::debug!(root = %root.display(), error = %e, "DirFS::new failed to open root");
            PathError::from_io("open", root.display().to_string(), e)
        })?;
        Ok(Self {
            dir,
            label: root.display().to_string(),
            guard: CloseGuard::new(),
        })
    }

    /// Wraps an already-open [`cap_std::fs::Dir`], for callers that have
    /// obtained one some other way (for example, a directory handle
    /// received from [`Directory::open_file`] elsewhere in this crate).
    pub fn from_cap_std(dir: Dir, label: impl Into<String>) -> Self {
        Self {
            dir,
            label: label.into(),
            guard: CloseGuard::new(),
        }
    }

    fn open_options(flags: OpenFlags, perm: FileMode) -> OpenOptions {
        let mut opts = OpenOptions::new();
        opts.read(true);
        if flags.is_writable() {
            opts.write(true);
        }
        if flags.contains(OpenFlags::APPEND) {
            opts.append(true);
        }
        if flags.contains(OpenFlags::CREATE) {
            opts.create(true);
            sys::set_create_mode(&mut opts, perm);
        }
        if flags.contains(OpenFlags::EXCL) {
            opts.create_new(true);
        }
        if flags.contains(OpenFlags::TRUNC) {
            opts.truncate(true);
        }
        sys::apply_platform_flags(&mut opts, flags);
        opts
    }
}

impl Directory for DirFS {
    fn open_file(&self, name: &str, flags: OpenFlags, perm: FileMode) -> Result<Box<dyn File>, PathError> {
        validate_name("open", name)?;
        self.guard.check("open", &self.label)?;
        tracing::trace!(op = "open", path = name, ?flags, "DirFS::open_file");

        if flags.contains(OpenFlags::NOFOLLOW) && !flags.contains(OpenFlags::DIRECTORY) {
            if let Ok(meta) = self.dir.symlink_metadata(name) {
                if meta.is_symlink() {
                    let target = self
                        .dir
                        .read_link(name)
                        .map_err(|e| PathError::from_io("open", name, e))?
                        .to_string_lossy()
                        .into_owned();
                    return Ok(Box::new(DirFsHandle::new_symlink(target, name.to_string())));
                }
            }
        }

        if flags.contains(OpenFlags::DIRECTORY) {
            let sub = self
                .dir
                .open_dir(name)
                .map_err(|e| PathError::from_io("open", name, e))?;
            return Ok(Box::new(DirFsHandle::new_dir(sub, name.to_string())));
        }

        let opts = Self::open_options(flags, perm);
        let file = self
            .dir
            .open_with(name, &opts)
            .map_err(|e| PathError::from_io("open", name, e))?;
        Ok(Box::new(DirFsHandle::new_file(file, name.to_string(), flags)))
    }

    fn read_dir(&self, n: i64) -> Result<Vec<DirEntry>, PathError> {
        self.guard.check("readdir", &self.label)?;
        read_dir_entries(&self.dir, &self.label, n)
    }

    fn access(&self, name: &str, mode: AccessMode) -> Result<(), PathError> {
        validate_name("access", name)?;
        access_entry(&self.dir, name, mode)
    }

    fn mknod(&self, name: &str, _mode: FileMode, _dev: u64) -> Result<(), PathError> {
        validate_name("mknod", name)?;
        // Device node creation requires a raw `mknodat`, which `cap_std`
        // does not expose portably. Out of scope for a host that only
        // ever backs regular files and directories in this crate's test
        // matrix; surfaced as a clear, typed failure rather than silently
        // creating a regular file in its place.
        Err(PathError::new("mknod", name, ErrorKind::NotImplemented))
    }

    fn mkdir(&self, name: &str, perm: FileMode) -> Result<(), PathError> {
        validate_name("mkdir", name)?;
        tracing::trace!(op = "mkdir", path = name, "DirFS::mkdir");
        self.dir
            .create_dir(name)
            .map_err(|e| PathError::from_io("mkdir", name, e))?;
        sys::set_dir_mode(&self.dir, name, perm).map_err(|e| PathError::from_io("mkdir", name, e))?;
        Ok(())
    }

    fn rmdir(&self, name: &str) -> Result<(), PathError> {
        validate_name("rmdir", name)?;
        self.dir
            .remove_dir(name)
            .map_err(|e| PathError::from_io("rmdir", name, e))
    }

    fn unlink(&self, name: &str) -> Result<(), PathError> {
        validate_name("unlink", name)?;
        self.dir
            .remove_file(name)
            .map_err(|e| PathError::from_io("unlink", name, e))
    }

    fn symlink(&self, old_name: &str, new_name: &str) -> Result<(), PathError> {
        validate_target("symlink", new_name)?;
        self.dir
            .symlink(old_name, new_name)
            .map_err(|e| PathError::from_io("symlink", new_name, e))
    }

    fn link(&self, old_name: &str, new_dir: &dyn Directory, new_name: &str) -> Result<(), PathError> {
        validate_name("link", old_name)?;
        validate_target("link", new_name)?;
        if let Some(target) = new_dir.sys().and_then(|a| a.downcast_ref::<Dir>()) {
            self.dir
                .hard_link(old_name, target, new_name)
                .map_err(|e| PathError::from_io("link", new_name, e))
        } else {
            Err(PathError::new("link", new_name, ErrorKind::NotSupported))
        }
    }

    fn rename(&self, old_name: &str, new_dir: &dyn Directory, new_name: &str) -> Result<(), PathError> {
        validate_name("rename", old_name)?;
        validate_target("rename", new_name)?;
        if let Some(target) = new_dir.sys().and_then(|a| a.downcast_ref::<Dir>()) {
            self.dir
                .rename(old_name, target, new_name)
                .map_err(|e| PathError::from_io("rename", new_name, e))
        } else {
            Err(PathError::new("rename", new_name, ErrorKind::NotSupported))
        }
    }

    fn lstat(&self, name: &str) -> Result<Metadata, PathError> {
        validate_name("lstat", name)?;
        let meta = self
            .dir
            .symlink_metadata(name)
            .map_err(|e| PathError::from_io("lstat", name, e))?;
        Ok(convert_metadata(&meta))
    }

    fn sys(&self) -> Option<&(dyn std::any::Any + Send + Sync)> {
        Some(&self.dir)
    }
}

/// A handle returned by [`DirFS::open_file`]: either an open file or an
/// open subdirectory, modeled as one type so it can implement both
/// [`File`] and [`Directory`] the way the contract requires (relative
/// operations on a file handle fail with [`ErrorKind::NotDirectory`]
/// rather than being a different Rust type).
///
/// `Dir` and a symlink's target text carry no mutable per-handle state,
/// so only the `File` variant needs interior mutability (for its seek
/// position); `Dir` is stored bare, which is also what lets
/// [`DirFsHandle::sys`] hand back a `&Dir` without a lock guard's
/// lifetime getting in the way — the same fd [`link`](Directory::link)
/// and [`rename`](Directory::rename) need to confirm two endpoints share
/// a filesystem.
enum Node {
    File(Mutex<cap_std::fs::File>),
    Dir(Dir),
    /// A handle obtained by opening a symlink with `NOFOLLOW` rather than
    /// following it: the host's `openat` refuses to follow the link, so
    /// instead of surfacing that as `Loop` we read the link target
    /// ourselves and hand back a path-only handle over it.
    Symlink(String),
}

struct DirFsHandle {
    node: Node,
    name: String,
    guard: CloseGuard,
    writable: bool,
    sync_on_write: bool,
    datasync_on_write: bool,
}

impl DirFsHandle {
    fn new_file(file: cap_std::fs::File, name: String, flags: OpenFlags) -> Self {
        Self {
            node: Node::File(Mutex::new(file)),
            name,
            guard: CloseGuard::new(),
            writable: flags.is_writable(),
            sync_on_write: flags.intersects(OpenFlags::SYNC | OpenFlags::RSYNC),
            datasync_on_write: flags.contains(OpenFlags::DSYNC),
        }
    }

    fn new_dir(dir: Dir, name: String) -> Self {
        Self {
            node: Node::Dir(dir),
            name,
            guard: CloseGuard::new(),
            writable: false,
            sync_on_write: false,
            datasync_on_write: false,
        }
    }

    fn new_symlink(target: String, name: String) -> Self {
        Self {
            node: Node::Symlink(target),
            name,
            guard: CloseGuard::new(),
            writable: false,
            sync_on_write: false,
            datasync_on_write: false,
        }
    }

    fn as_dir(&self) -> Result<&Dir, PathError> {
        match &self.node {
            Node::Dir(dir) => Ok(dir),
            Node::File(_) | Node::Symlink(_) => Err(PathError::new("readdir", &self.name, ErrorKind::NotDirectory)),
        }
    }

    /// Returns [`ErrorKind::Permission`] if this handle was not opened
    /// writable, per spec §7: a write attempt on an `RDONLY`-opened file
    /// is a permission question, decided by the flags this handle was
    /// opened with rather than left to whatever errno the host happens
    /// to raise.
    fn check_writable(&self, op: &'static str) -> Result<(), PathError> {
        if self.writable {
            Ok(())
        } else {
            Err(PathError::new(op, &self.name, ErrorKind::Permission))
        }
    }

    fn sync_after_write(&self, file: &cap_std::fs::File) -> Result<(), PathError> {
        if self.sync_on_write {
            file.sync_all().map_err(|e| PathError::from_io("write", &self.name, e))?;
        } else if self.datasync_on_write {
            file.sync_data().map_err(|e| PathError::from_io("write", &self.name, e))?;
        }
        Ok(())
    }
}

impl Directory for DirFsHandle {
    fn open_file(&self, name: &str, flags: OpenFlags, perm: FileMode) -> Result<Box<dyn File>, PathError> {
        validate_name("open", name)?;
        self.guard.check("open", &self.name)?;
        let dir = self.as_dir()?;

        if flags.contains(OpenFlags::NOFOLLOW) && !flags.contains(OpenFlags::DIRECTORY) {
            if let Ok(meta) = dir.symlink_metadata(name) {
                if meta.is_symlink() {
                    let target = dir
                        .read_link(name)
                        .map_err(|e| PathError::from_io("open", name, e))?
                        .to_string_lossy()
                        .into_owned();
                    return Ok(Box::new(DirFsHandle::new_symlink(target, name.to_string())));
                }
            }
        }

        if flags.contains(OpenFlags::DIRECTORY) {
            let sub = dir
                .open_dir(name)
                .map_err(|e| PathError::from_io("open", name, e))?;
            return Ok(Box::new(DirFsHandle::new_dir(sub, name.to_string())));
        }
        let opts = DirFS::open_options(flags, perm);
        let file = dir
            .open_with(name, &opts)
            .map_err(|e| PathError::from_io("open", name, e))?;
        Ok(Box::new(DirFsHandle::new_file(file, name.to_string(), flags)))
    }

    fn read_dir(&self, n: i64) -> Result<Vec<DirEntry>, PathError> {
        self.guard.check("readdir", &self.name)?;
        let dir = self.as_dir()?;
        read_dir_entries(dir, &self.name, n)
    }

    fn access(&self, name: &str, mode: AccessMode) -> Result<(), PathError> {
        validate_name("access", name)?;
        let dir = self.as_dir()?;
        access_entry(dir, name, mode)
    }

    fn mknod(&self, name: &str, _mode: FileMode, _dev: u64) -> Result<(), PathError> {
        validate_name("mknod", name)?;
        Err(PathError::new("mknod", name, ErrorKind::NotImplemented))
    }

    fn mkdir(&self, name: &str, perm: FileMode) -> Result<(), PathError> {
        validate_name("mkdir", name)?;
        let dir = self.as_dir()?;
        dir.create_dir(name).map_err(|e| PathError::from_io("mkdir", name, e))?;
        sys::set_dir_mode(dir, name, perm).map_err(|e| PathError::from_io("mkdir", name, e))?;
        Ok(())
    }

    fn rmdir(&self, name: &str) -> Result<(), PathError> {
        validate_name("rmdir", name)?;
        let dir = self.as_dir()?;
        dir.remove_dir(name).map_err(|e| PathError::from_io("rmdir", name, e))
    }

    fn unlink(&self, name: &str) -> Result<(), PathError> {
        validate_name("unlink", name)?;
        let dir = self.as_dir()?;
        dir.remove_file(name).map_err(|e| PathError::from_io("unlink", name, e))
    }

    fn symlink(&self, old_name: &str, new_name: &str) -> Result<(), PathError> {
        validate_target("symlink", new_name)?;
        let dir = self.as_dir()?;
        dir.symlink(old_name, new_name)
            .map_err(|e| PathError::from_io("symlink", new_name, e))
    }

    fn link(&self, old_name: &str, new_dir: &dyn Directory, new_name: &str) -> Result<(), PathError> {
        validate_name("link", old_name)?;
        validate_target("link", new_name)?;
        let dir = self.as_dir()?;
        if let Some(target) = new_dir.sys().and_then(|a| a.downcast_ref::<Dir>()) {
            dir.hard_link(old_name, target, new_name)
                .map_err(|e| PathError::from_io("link", new_name, e))
        } else {
            Err(PathError::new("link", new_name, ErrorKind::NotSupported))
        }
    }

    fn rename(&self, old_name: &str, new_dir: &dyn Directory, new_name: &str) -> Result<(), PathError> {
        validate_name("rename", old_name)?;
        validate_target("rename", new_name)?;
        let dir = self.as_dir()?;
        if let Some(target) = new_dir.sys().and_then(|a| a.downcast_ref::<Dir>()) {
            dir.rename(old_name, target, new_name)
                .map_err(|e| PathError::from_io("rename", new_name, e))
        } else {
            Err(PathError::new("rename", new_name, ErrorKind::NotSupported))
        }
    }

    fn lstat(&self, name: &str) -> Result<Metadata, PathError> {
        validate_name("lstat", name)?;
        let dir = self.as_dir()?;
        let meta = dir
            .symlink_metadata(name)
            .map_err(|e| PathError::from_io("lstat", name, e))?;
        Ok(convert_metadata(&meta))
    }

    fn sys(&self) -> Option<&(dyn std::any::Any + Send + Sync)> {
        match &self.node {
            Node::Dir(dir) => Some(dir),
            Node::File(_) | Node::Symlink(_) => None,
        }
    }
}

impl File for DirFsHandle {
    fn name(&self) -> &str {
        &self.name
    }

    fn read(&self, buf: &mut [u8]) -> Result<usize, PathError> {
        use std::io::Read;
        self.guard.check("read", &self.name)?;
        match &self.node {
            Node::File(f) => {
                let mut f = f.lock().expect("DirFS handle mutex poisoned");
                f.read(buf).map_err(|e| PathError::from_io("read", &self.name, e))
            }
            _ => Err(PathError::new("read", &self.name, ErrorKind::NotDirectory)),
        }
    }

    fn read_at(&self, buf: &mut [u8], offset: u64) -> Result<usize, PathError> {
        use std::io::{Read, Seek};
        self.guard.check("read", &self.name)?;
        match &self.node {
            Node::File(f) => {
                let mut f = f.lock().expect("DirFS handle mutex poisoned");
                let saved = f.stream_position().map_err(|e| PathError::from_io("read", &self.name, e))?;
                f.seek(SeekFrom::Start(offset))
                    .map_err(|e| PathError::from_io("read", &self.name, e))?;
                let result = f.read(buf);
                let _ = f.seek(SeekFrom::Start(saved));
                result.map_err(|e| PathError::from_io("read", &self.name, e))
            }
            _ => Err(PathError::new("read", &self.name, ErrorKind::NotDirectory)),
        }
    }

    fn write(&self, buf: &[u8]) -> Result<usize, PathError> {
        use std::io::Write;
        self.guard.check("write", &self.name)?;
        self.check_writable("write")?;
        match &self.node {
            Node::File(f) => {
                let mut f = f.lock().expect("DirFS handle mutex poisoned");
                let n = f.write(buf).map_err(|e| PathError::from_io("write", &self.name, e))?;
                self.sync_after_write(&f)?;
                Ok(n)
            }
            _ => Err(PathError::new("write", &self.name, ErrorKind::NotDirectory)),
        }
    }

    fn write_at(&self, buf: &[u8], offset: u64) -> Result<usize, PathError> {
        use std::io::{Seek, Write};
        self.guard.check("write", &self.name)?;
        self.check_writable("write")?;
        match &self.node {
            Node::File(f) => {
                let mut f = f.lock().expect("DirFS handle mutex poisoned");
                let saved = f.stream_position().map_err(|e| PathError::from_io("write", &self.name, e))?;
                f.seek(SeekFrom::Start(offset))
                    .map_err(|e| PathError::from_io("write", &self.name, e))?;
                let result = f.write(buf);
                let _ = f.seek(SeekFrom::Start(saved));
                let n = result.map_err(|e| PathError::from_io("write", &self.name, e))?;
                self.sync_after_write(&f)?;
                Ok(n)
            }
            _ => Err(PathError::new("write", &self.name, ErrorKind::NotDirectory)),
        }
    }

    fn seek(&self, pos: SeekFrom) -> Result<u64, PathError> {
        use std::io::Seek;
        self.guard.check("seek", &self.name)?;
        match &self.node {
            Node::File(f) => {
                let mut f = f.lock().expect("DirFS handle mutex poisoned");
                f.seek(pos).map_err(|e| PathError::from_io("seek", &self.name, e))
            }
            _ => Err(PathError::new("seek", &self.name, ErrorKind::NotDirectory)),
        }
    }

    fn readlink(&self) -> Result<String, PathError> {
        self.guard.check("readlink", &self.name)?;
        match &self.node {
            Node::Symlink(target) => Ok(target.clone()),
            _ => Err(PathError::new("readlink", &self.name, ErrorKind::NotSupported)),
        }
    }

    fn chmod(&self, mode: FileMode) -> Result<(), PathError> {
        self.guard.check("chmod", &self.name)?;
        match &self.node {
            Node::File(f) => {
                let f = f.lock().expect("DirFS handle mutex poisoned");
                let mut perms = f
                    .metadata()
                    .map_err(|e| PathError::from_io("chmod", &self.name, e))?
                    .permissions();
                #[cfg(unix)]
                {
                    use std::os::unix::fs::PermissionsExt;
                    perms.set_mode(sys::mode_bits(mode));
                }
                f.set_permissions(perms)
                    .map_err(|e| PathError::from_io("chmod", &self.name, e))
            }
            _ => Err(PathError::new("chmod", &self.name, ErrorKind::NotDirectory)),
        }
    }

    fn chtimes(&self, atime: SystemTime, mtime: SystemTime) -> Result<(), PathError> {
        self.guard.check("chtimes", &self.name)?;
        match &self.node {
            Node::File(f) => {
                let f = f.lock().expect("DirFS handle mutex poisoned");
                let times = cap_std::fs::SystemTimeSpec::from_std(atime);
                let mtimes = cap_std::fs::SystemTimeSpec::from_std(mtime);
                f.set_times(Some(times), Some(mtimes))
                    .map_err(|e| PathError::from_io("chtimes", &self.name, e))
            }
            _ => Err(PathError::new("chtimes", &self.name, ErrorKind::NotDirectory)),
        }
    }

    fn truncate(&self, size: u64) -> Result<(), PathError> {
        self.guard.check("truncate", &self.name)?;
        self.check_writable("truncate")?;
        match &self.node {
            Node::File(f) => {
                let f = f.lock().expect("DirFS handle mutex poisoned");
                f.set_len(size).map_err(|e| PathError::from_io("truncate", &self.name, e))
            }
            _ => Err(PathError::new("truncate", &self.name, ErrorKind::NotDirectory)),
        }
    }

    fn sync(&self) -> Result<(), PathError> {
        self.guard.check("sync", &self.name)?;
        match &self.node {
            Node::File(f) => {
                let f = f.lock().expect("DirFS handle mutex poisoned");
                f.sync_all().map_err(|e| PathError::from_io("sync", &self.name, e))
            }
            _ => Ok(()),
        }
    }

    fn datasync(&self) -> Result<(), PathError> {
        self.guard.check("datasync", &self.name)?;
        match &self.node {
            Node::File(f) => {
                let f = f.lock().expect("DirFS handle mutex poisoned");
                f.sync_data().map_err(|e| PathError::from_io("datasync", &self.name, e))
            }
            _ => Ok(()),
        }
    }

    fn stat(&self) -> Result<Metadata, PathError> {
        self.guard.check("stat", &self.name)?;
        match &self.node {
            Node::File(f) => {
                let f = f.lock().expect("DirFS handle mutex poisoned");
                let meta = f.metadata().map_err(|e| PathError::from_io("stat", &self.name, e))?;
                Ok(convert_metadata(&meta))
            }
            Node::Dir(d) => {
                let meta = d.dir_metadata().map_err(|e| PathError::from_io("stat", &self.name, e))?;
                Ok(convert_metadata(&meta))
            }
            Node::Symlink(target) => Ok(Metadata {
                mode: FileMode::new_symlink(),
                size: target.len() as u64,
                modified: SystemTime::now(),
                accessed: SystemTime::now(),
                nlink: 1,
                dev: None,
            }),
        }
    }

    fn close(&self) -> Result<(), PathError> {
        self.guard.close("close", &self.name)
    }
}

fn read_dir_entries(dir: &Dir, label: &str, n: i64) -> Result<Vec<DirEntry>, PathError> {
    let mut out = Vec::new();
    for entry in dir.entries().map_err(|e| PathError::from_io("readdir", label, e))? {
        let entry = entry.map_err(|e| PathError::from_io("readdir", label, e))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name == "." || name == ".." {
            continue;
        }
        let file_type = entry
            .file_type()
            .map_err(|e| PathError::from_io("readdir", label, e))?;
        let mode = if file_type.is_dir() {
            FileMode::DIR
        } else if file_type.is_symlink() {
            FileMode::SYMLINK
        } else {
            FileMode::FILE
        };
        out.push(DirEntry { name, file_type: mode });
        if n > 0 && out.len() as i64 >= n {
            break;
        }
    }
    Ok(out)
}

fn access_entry(dir: &Dir, name: &str, mode: AccessMode) -> Result<(), PathError> {
    let meta = dir
        .symlink_metadata(name)
        .map_err(|e| PathError::from_io("access", name, e))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let bits = meta.permissions().mode();
        let other = bits & 0o007;
        if mode.contains(AccessMode::READ) && other & 0o4 == 0 {
            return Err(PathError::new("access", name, ErrorKind::Permission));
        }
        if mode.contains(AccessMode::WRITE) && other & 0o2 == 0 {
            return Err(PathError::new("access", name, ErrorKind::Permission));
        }
        if mode.contains(AccessMode::EXEC) && other & 0o1 == 0 {
            return Err(PathError::new("access", name, ErrorKind::Permission));
        }
    }
    Ok(())
}

fn convert_metadata(meta: &cap_std::fs::Metadata) -> Metadata {
    let ft = meta.file_type();
    let perm = {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            meta.permissions().mode() & FileMode::PERM_MASK
        }
        #[cfg(not(unix))]
        {
            0o644
        }
    };
    let mode = if ft.is_dir() {
        FileMode::DIR | FileMode::from_bits_truncate(perm)
    } else if ft.is_symlink() {
        FileMode::SYMLINK | FileMode::from_bits_truncate(perm)
    } else {
        FileMode::FILE | FileMode::from_bits_truncate(perm)
    };
    Metadata {
        mode,
        size: meta.len(),
        modified: meta.modified().map(Into::into).unwrap_or(SystemTime::UNIX_EPOCH),
        accessed: meta.accessed().map(Into::into).unwrap_or(SystemTime::UNIX_EPOCH),
        nlink: 1,
        dev: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::Directory;

    #[test]
    fn new_opens_existing_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let fs = DirFS::new(tmp.path()).unwrap();
        assert!(fs.sys().is_some());
    }

    #[test]
    fn new_fails_on_missing_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("does-not-exist");
        let err = DirFS::new(&missing).unwrap_err();
        assert!(err.kind().is_not_exist());
    }

    #[test]
    fn mkdir_then_open_round_trips() {
        let tmp = tempfile::tempdir().unwrap();
        let fs = DirFS::new(tmp.path()).unwrap();
        fs.mkdir("sub", FileMode::new_dir(0o755)).unwrap();
        let meta = fs.lstat("sub").unwrap();
        assert!(meta.is_dir());
    }

    #[test]
    fn write_then_read_round_trips() {
        let tmp = tempfile::tempdir().unwrap();
        let fs = DirFS::new(tmp.path()).unwrap();
        let file = fs
            .open_file("a.txt", OpenFlags::WRITE | OpenFlags::CREATE, FileMode::new_file(0o644))
            .unwrap();
        file.write(b"hello").unwrap();
        file.close().unwrap();

        let file = fs.open_file("a.txt", OpenFlags::READ, FileMode::default()).unwrap();
        let mut buf = [0u8; 5];
        let n = file.read(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"hello");
    }

    #[test]
    fn write_on_read_only_handle_returns_permission() {
        let tmp = tempfile::tempdir().unwrap();
        let fs = DirFS::new(tmp.path()).unwrap();
        fs.open_file("a.txt", OpenFlags::WRITE | OpenFlags::CREATE, FileMode::new_file(0o644))
            .unwrap()
            .close()
            .unwrap();

        let file = fs.open_file("a.txt", OpenFlags::READ, FileMode::default()).unwrap();
        let err = file.write(b"x").unwrap_err();
        assert!(err.kind().is_permission());
        let err = file.truncate(0).unwrap_err();
        assert!(err.kind().is_permission());
    }

    #[test]
    fn closed_handle_rejects_further_use() {
        let tmp = tempfile::tempdir().unwrap();
        let fs = DirFS::new(tmp.path()).unwrap();
        let file = fs
            .open_file("a.txt", OpenFlags::WRITE | OpenFlags::CREATE, FileMode::new_file(0o644))
            .unwrap();
        file.close().unwrap();
        let err = file.write(b"x").unwrap_err();
        assert!(err.kind().is_closed());
    }
}
