//! End-to-end sandbox escape scenarios driven against a real host
//! directory via `DirFS` wrapped in `RootFS`.

use std::sync::Arc;

use tempfile::TempDir;
use vfs_core::dirfs::DirFS;
use vfs_core::handle::Directory;
use vfs_core::rootfs::RootFS;
use vfs_core::types::{FileMode, OpenFlags};

fn sandbox(tmp: &TempDir) -> RootFS {
    let root: Arc<dyn Directory> = Arc::new(DirFS::new(tmp.path()).unwrap());
    RootFS::new(root)
}

/// Scenario A: `sub/link -> /etc/passwd` must resolve to `<root>/etc/passwd`,
/// never the host's real `/etc/passwd`.
#[test]
fn absolute_symlink_target_rebases_at_sandbox_root() {
    let tmp = tempfile::tempdir().unwrap();
    let backing = DirFS::new(tmp.path()).unwrap();
    backing.mkdir("sub", FileMode::new_dir(0o755)).unwrap();
    backing.symlink("/etc/passwd", "sub/link").unwrap();
    backing.mkdir("etc", FileMode::new_dir(0o755)).unwrap();
    let canary = backing
        .open_file(
            "etc/passwd",
            OpenFlags::WRITE | OpenFlags::CREATE,
            FileMode::new_file(0o644),
        )
        .unwrap();
    canary.write(b"sandbox-local").unwrap();
    canary.close().unwrap();

    let root = sandbox(&tmp);
    let file = root.open_file("sub/link", OpenFlags::READ, FileMode::default()).unwrap();
    let mut buf = [0u8; 13];
    file.read(&mut buf).unwrap();
    assert_eq!(&buf, b"sandbox-local");

    // The real host /etc/passwd was never touched by this resolution;
    // there is no way, from `root`, to reach any path outside `tmp`.
    assert!(std::path::Path::new("/etc/passwd").exists());
}

/// Scenario B: a two-cycle symlink loop fails bounded; `NOFOLLOW` still
/// succeeds and returns the link itself.
#[test]
fn two_cycle_symlink_loop_fails_with_loop_kind() {
    let tmp = tempfile::tempdir().unwrap();
    let backing = DirFS::new(tmp.path()).unwrap();
    backing.symlink("b", "a").unwrap();
    backing.symlink("a", "b").unwrap();

    let root = sandbox(&tmp);
    let err = root.open_file("a", OpenFlags::READ, FileMode::default()).unwrap_err();
    assert!(err.kind().is_loop());

    let handle = root
        .open_file("a", OpenFlags::READ | OpenFlags::NOFOLLOW, FileMode::default())
        .unwrap();
    assert_eq!(handle.readlink().unwrap(), "b");
}

/// Scenario C: an arbitrarily long `..`-climb is clamped at the sandbox
/// root instead of escaping or erroring.
#[test]
fn deep_dotdot_climb_is_clamped_at_root() {
    let tmp = tempfile::tempdir().unwrap();
    let backing = DirFS::new(tmp.path()).unwrap();
    backing
        .open_file("only.txt", OpenFlags::WRITE | OpenFlags::CREATE, FileMode::new_file(0o644))
        .unwrap();

    let root = sandbox(&tmp);
    let handle = root
        .open_file("../../../../../only.txt", OpenFlags::READ, FileMode::default())
        .unwrap();
    assert_eq!(handle.name(), "only.txt");
}

/// A symlink chain one hop under the bound succeeds; reaching the bound
/// fails with `Loop`.
#[test]
fn long_acyclic_symlink_chain_resolves_up_to_the_bound() {
    let tmp = tempfile::tempdir().unwrap();
    let backing = DirFS::new(tmp.path()).unwrap();
    backing
        .open_file("target.txt", OpenFlags::WRITE | OpenFlags::CREATE, FileMode::new_file(0o644))
        .unwrap();

    // Chain of 38 links plus the terminal open keeps total hops under 40.
    let chain_len = 38;
    backing.symlink("target.txt", "link0").unwrap();
    for i in 1..chain_len {
        backing.symlink(format!("link{}", i - 1), format!("link{i}")).unwrap();
    }

    let root = sandbox(&tmp);
    let handle = root
        .open_file(&format!("link{}", chain_len - 1), OpenFlags::READ, FileMode::default())
        .unwrap();
    assert!(handle.stat().unwrap().is_file());
}

/// Mutating operations (mkdir, write, rename) also resolve through the
/// sandbox's symlink/`..` handling, not just `open_file`.
#[test]
fn mkdir_and_rename_resolve_through_the_sandbox() {
    let tmp = tempfile::tempdir().unwrap();
    let backing = DirFS::new(tmp.path()).unwrap();
    backing.mkdir("a", FileMode::new_dir(0o755)).unwrap();
    backing.symlink("a", "alias").unwrap();

    let root = sandbox(&tmp);
    root.mkdir("alias/b", FileMode::new_dir(0o755)).unwrap();
    assert!(root.lstat("a/b").unwrap().is_dir());

    // `rename`'s `new_dir` is the already-resolved destination *parent*
    // directory, not another filesystem root: open "a" itself (through the
    // sandbox, so `..`/symlink handling still applies to the destination
    // side) and rename the child into it by bare name.
    let dest_parent = root
        .open_file("a", OpenFlags::READ | OpenFlags::DIRECTORY, FileMode::default())
        .unwrap();
    root.rename("a/b", dest_parent.as_ref(), "renamed").unwrap();
    assert!(root.lstat("a/renamed").unwrap().is_dir());
}
