//! `mkdir_all` idempotence through a sandboxed stack: calling it twice
//! with an already-fully-built path is a no-op, and a non-directory
//! component blocking the walk surfaces as `NotDirectory` rather than
//! being silently papered over.

use std::sync::Arc;

use vfs_core::dirfs::DirFS;
use vfs_core::handle::Directory;
use vfs_core::ops;
use vfs_core::rootfs::RootFS;
use vfs_core::types::{FileMode, OpenFlags};

fn sandboxed(tmp: &tempfile::TempDir) -> RootFS {
    let backing: Arc<dyn Directory> = Arc::new(DirFS::new(tmp.path()).unwrap());
    RootFS::new(backing)
}

#[test]
fn calling_mkdir_all_twice_on_the_same_path_is_idempotent() {
    let tmp = tempfile::tempdir().unwrap();
    let root = sandboxed(&tmp);

    ops::mkdir_all(&root, "a/b/c", FileMode::new_dir(0o755)).unwrap();
    ops::mkdir_all(&root, "a/b/c", FileMode::new_dir(0o755)).unwrap();

    assert!(ops::lstat(&root, "a").unwrap().is_dir());
    assert!(ops::lstat(&root, "a/b").unwrap().is_dir());
    assert!(ops::lstat(&root, "a/b/c").unwrap().is_dir());
}

#[test]
fn mkdir_all_through_a_symlinked_prefix_still_lands_inside_the_sandbox() {
    let tmp = tempfile::tempdir().unwrap();
    let backing = DirFS::new(tmp.path()).unwrap();
    backing.mkdir("real", FileMode::new_dir(0o755)).unwrap();
    backing.symlink("real", "alias").unwrap();

    let root = sandboxed(&tmp);
    ops::mkdir_all(&root, "alias/x/y", FileMode::new_dir(0o755)).unwrap();

    assert!(ops::lstat(&root, "real/x/y").unwrap().is_dir());
}

#[test]
fn a_file_occupying_a_path_component_blocks_mkdir_all_with_not_directory() {
    let tmp = tempfile::tempdir().unwrap();
    let root = sandboxed(&tmp);
    root.open_file("blocker", OpenFlags::WRITE | OpenFlags::CREATE, FileMode::new_file(0o644)).unwrap();

    let err = ops::mkdir_all(&root, "blocker/more", FileMode::new_dir(0o755)).unwrap_err();
    assert!(err.kind().is_not_directory());
}
