//! Read-only projection over a sandboxed stack: writes are rejected end
//! to end through `RootFS` + `ReadOnlyFS`, while reads of pre-existing
//! content keep working.

use std::sync::Arc;

use vfs_core::dirfs::DirFS;
use vfs_core::handle::Directory;
use vfs_core::readonly::{ReadOnlyFS, ReadOnlyFile};
use vfs_core::rootfs::RootFS;
use vfs_core::types::{FileMode, OpenFlags};

#[test]
fn write_through_a_readonly_sandbox_is_rejected_end_to_end() {
    let tmp = tempfile::tempdir().unwrap();
    {
        let fs = DirFS::new(tmp.path()).unwrap();
        let file = fs.open_file("notes.txt", OpenFlags::WRITE | OpenFlags::CREATE, FileMode::new_file(0o644)).unwrap();
        file.write(b"read me").unwrap();
    }

    let backing: Arc<dyn Directory> = Arc::new(DirFS::new(tmp.path()).unwrap());
    let sandbox: Arc<dyn Directory> = Arc::new(RootFS::new(backing));
    let frozen = ReadOnlyFS::new(sandbox);

    let err = frozen.mkdir("new-dir", FileMode::new_dir(0o755)).unwrap_err();
    assert!(err.kind().is_read_only());

    let err = frozen
        .open_file("notes.txt", OpenFlags::WRITE, FileMode::default())
        .unwrap_err();
    assert!(err.kind().is_read_only());

    let file = frozen.open_file("notes.txt", OpenFlags::READ, FileMode::default()).unwrap();
    let mut buf = [0u8; 7];
    let n = file.read(&mut buf).unwrap();
    assert_eq!(&buf[..n], b"read me");
}

#[test]
fn readonlyfs_rejects_a_durability_flag_even_with_rdonly() {
    let tmp = tempfile::tempdir().unwrap();
    let fs = DirFS::new(tmp.path()).unwrap();
    let file = fs.open_file("notes.txt", OpenFlags::WRITE | OpenFlags::CREATE, FileMode::new_file(0o644)).unwrap();
    file.write(b"read me").unwrap();

    let backing: Arc<dyn Directory> = Arc::new(DirFS::new(tmp.path()).unwrap());
    let frozen = ReadOnlyFS::new(backing);

    let err = frozen
        .open_file("notes.txt", OpenFlags::READ | OpenFlags::SYNC, FileMode::default())
        .unwrap_err();
    assert!(err.kind().is_read_only());
}

#[test]
fn readonlyfs_restriction_survives_descending_into_a_subdirectory() {
    let tmp = tempfile::tempdir().unwrap();
    let fs = DirFS::new(tmp.path()).unwrap();
    fs.mkdir("sub", FileMode::new_dir(0o755)).unwrap();

    let backing: Arc<dyn Directory> = Arc::new(DirFS::new(tmp.path()).unwrap());
    let frozen = ReadOnlyFS::new(backing);

    let sub = frozen.open_file("sub", OpenFlags::DIRECTORY, FileMode::default()).unwrap();
    let err = sub
        .open_file("leaf.txt", OpenFlags::WRITE | OpenFlags::CREATE, FileMode::new_file(0o644))
        .unwrap_err();
    assert!(err.kind().is_read_only());
}

#[test]
fn readonlyfile_does_not_propagate_to_children_it_opens() {
    let tmp = tempfile::tempdir().unwrap();
    let fs = DirFS::new(tmp.path()).unwrap();
    fs.mkdir("sub", FileMode::new_dir(0o755)).unwrap();
    let dir_handle = fs.open_file("sub", OpenFlags::DIRECTORY, FileMode::default()).unwrap();

    let pinned = ReadOnlyFile::new(dir_handle);
    let child = pinned
        .open_file("leaf.txt", OpenFlags::WRITE | OpenFlags::CREATE, FileMode::new_file(0o644))
        .unwrap();
    assert_eq!(child.write(b"still writable").unwrap(), 14);
}
