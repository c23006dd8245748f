//! # Top-Level Helpers
//!
//! Free functions built purely on [`Directory`]/[`File`]: the handful of
//! conveniences every caller of a raw capability contract ends up
//! reimplementing (`Open`, `Stat`, `MkdirAll`, `WriteFile`, ...). None of
//! these need a method on the trait itself — they are ordinary
//! composition of the primitives `Directory`/`File` already expose, the
//! same way a blanket `FsExt` layers convenience methods on top of a
//! minimal core trait.

use std::time::SystemTime;

use crate::error::{ErrorKind, PathError};
use crate::handle::{validate_name, Directory, File};
use crate::path::{join_path, split_path};
use crate::types::{AccessMode, FileMode, Metadata, OpenFlags};

/// Opens `p` under `fsys` for reading, following a trailing symlink.
pub fn open(fsys: &dyn Directory, p: &str) -> Result<Box<dyn File>, PathError> {
    fsys.open_file(p, OpenFlags::READ, FileMode::default())
}

/// Opens `p` under `fsys` as a directory, failing with
/// [`ErrorKind::NotDirectory`] if it isn't one.
pub fn open_dir(fsys: &dyn Directory, p: &str) -> Result<Box<dyn File>, PathError> {
    fsys.open_file(p, OpenFlags::DIRECTORY, FileMode::default())
}

/// Opens the root of `fsys` itself as a directory handle.
pub fn open_root(fsys: &dyn Directory) -> Result<Box<dyn File>, PathError> {
    open_dir(fsys, ".")
}

/// Reads the literal target text of the symlink at `p`.
pub fn readlink(fsys: &dyn Directory, p: &str) -> Result<String, PathError> {
    let handle = fsys.open_file(p, OpenFlags::READ | OpenFlags::NOFOLLOW, FileMode::default())?;
    handle.readlink()
}

/// Stats `p`, following a trailing symlink.
pub fn stat(fsys: &dyn Directory, p: &str) -> Result<Metadata, PathError> {
    let handle = open(fsys, p)?;
    handle.stat()
}

/// Stats `p` without following a trailing symlink.
pub fn lstat(fsys: &dyn Directory, p: &str) -> Result<Metadata, PathError> {
    fsys.lstat(p)
}

/// Creates a single directory at `p`. The parent must already exist; see
/// [`mkdir_all`] for the recursive variant.
pub fn mkdir(fsys: &dyn Directory, p: &str, perm: FileMode) -> Result<(), PathError> {
    fsys.mkdir(p, perm)
}

/// Changes permission bits on `p`. If `p` names a symlink, follows it and
/// modifies the target, matching standard POSIX `chmod` behavior.
pub fn chmod(fsys: &dyn Directory, p: &str, mode: FileMode) -> Result<(), PathError> {
    let handle = open(fsys, p)?;
    handle.chmod(mode)
}

/// Changes access/modification times on `p`, following a trailing
/// symlink.
pub fn chtimes(fsys: &dyn Directory, p: &str, atime: SystemTime, mtime: SystemTime) -> Result<(), PathError> {
    let handle = open(fsys, p)?;
    handle.chtimes(atime, mtime)
}

/// Opens `p` with `CREATE | TRUNC | WRITE` and writes `contents` to it in
/// full.
pub fn write_file(fsys: &dyn Directory, p: &str, contents: &[u8], perm: FileMode) -> Result<(), PathError> {
    let handle = fsys.open_file(p, OpenFlags::WRITE | OpenFlags::CREATE | OpenFlags::TRUNC, perm)?;
    let mut written = 0;
    while written < contents.len() {
        written += handle.write(&contents[written..])?;
    }
    Ok(())
}

/// Creates every missing directory component of `p` under `fsys`,
/// walking from the root. Existing components (even non-directory ones —
/// those surface later as [`ErrorKind::NotDirectory`] when actually
/// descended into) are left alone; only a true absence triggers
/// [`Directory::mkdir`], and [`ErrorKind::Exist`] racing against a
/// concurrent creator is swallowed rather than treated as failure. Any
/// other error aborts the walk immediately.
pub fn mkdir_all(fsys: &dyn Directory, p: &str, perm: FileMode) -> Result<(), PathError> {
    validate_name("mkdir_all", p)?;
    if p == "." {
        return Ok(());
    }

    let mut built = String::from(".");
    for component in p.split('/') {
        built = join_path(&built, component);
        match fsys.mkdir(&built, perm) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::Exist => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

/// Recursively mirrors the tree at `src` into `dst`, creating `dst`'s
/// entries to match: directories (create + descend), symlinks (recreate
/// the link, then apply mtime/atime to the link itself where the
/// backend supports it), regular files (stream content across), and
/// device/pipe/socket nodes ([`Directory::mknod`], with content copied
/// afterward for block devices that carry data). After each entry is
/// created its permission bits and timestamps are set to match `src`.
pub fn copy_fs(dst: &dyn Directory, src: &dyn Directory) -> Result<(), PathError> {
    crate::copy_equal::copy_tree(dst, src)
}

/// Walks `a` and `b` in lockstep and returns `Ok(())` only if every entry
/// matches: same type, same permission bits (a zero value on either side
/// is treated as "not reported" and skipped), same mtime/atime (same
/// tolerance), same size for non-directories, and byte-identical content
/// for regular files and block devices.
pub fn equal_fs(a: &dyn Directory, b: &dyn Directory) -> Result<(), PathError> {
    crate::copy_equal::equal_tree(a, b)
}

/// Splits `p` into `(parent, name)` the way [`crate::path::split_path`]
/// does, exposed here because [`mkdir_all`] and [`copy_fs`] both need it
/// and it reads more clearly imported from `ops` alongside its siblings
/// than reached for across modules.
pub fn parent_and_name(p: &str) -> (String, String) {
    split_path(p)
}

/// Convenience check used by [`crate::compose::maskfs`] and callers that
/// only want to know "can I read/write/traverse this", without the
/// `AccessMode` bitset ceremony at the call site.
pub fn can_write(fsys: &dyn Directory, p: &str) -> bool {
    fsys.access(p, AccessMode::WRITE).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dirfs::DirFS;

    #[test]
    fn write_file_then_open_round_trips() {
        let tmp = tempfile::tempdir().unwrap();
        let fs = DirFS::new(tmp.path()).unwrap();
        write_file(&fs, "greeting.txt", b"hello", FileMode::new_file(0o644)).unwrap();

        let handle = open(&fs, "greeting.txt").unwrap();
        let mut buf = [0u8; 5];
        handle.read(&mut buf).unwrap();
        assert_eq!(&buf, b"hello");
    }

    #[test]
    fn mkdir_all_creates_every_missing_component() {
        let tmp = tempfile::tempdir().unwrap();
        let fs = DirFS::new(tmp.path()).unwrap();
        mkdir_all(&fs, "a/b/c", FileMode::new_dir(0o755)).unwrap();

        assert!(lstat(&fs, "a").unwrap().is_dir());
        assert!(lstat(&fs, "a/b").unwrap().is_dir());
        assert!(lstat(&fs, "a/b/c").unwrap().is_dir());
    }

    #[test]
    fn mkdir_all_tolerates_partial_existing_prefix() {
        let tmp = tempfile::tempdir().unwrap();
        let fs = DirFS::new(tmp.path()).unwrap();
        fs.mkdir("a", FileMode::new_dir(0o755)).unwrap();

        mkdir_all(&fs, "a/b/c", FileMode::new_dir(0o755)).unwrap();
        assert!(lstat(&fs, "a/b/c").unwrap().is_dir());
    }

    #[test]
    fn mkdir_all_on_root_is_a_no_op() {
        let tmp = tempfile::tempdir().unwrap();
        let fs = DirFS::new(tmp.path()).unwrap();
        mkdir_all(&fs, ".", FileMode::new_dir(0o755)).unwrap();
    }

    #[test]
    fn open_root_yields_a_directory_handle() {
        let tmp = tempfile::tempdir().unwrap();
        let fs = DirFS::new(tmp.path()).unwrap();
        let root = open_root(&fs).unwrap();
        assert!(root.stat().unwrap().is_dir());
    }

    #[test]
    fn readlink_reads_symlink_target_text() {
        let tmp = tempfile::tempdir().unwrap();
        let fs = DirFS::new(tmp.path()).unwrap();
        fs.symlink("target.txt", "link.txt").unwrap();
        assert_eq!(readlink(&fs, "link.txt").unwrap(), "target.txt");
    }
}
