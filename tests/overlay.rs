//! Overlay precedence across a real two-directory stack: the top layer
//! shadows the bottom, and removing the top layer's copy of a file
//! reveals the bottom layer's copy again.

use std::sync::Arc;

use vfs_core::compose::LayerFS;
use vfs_core::dirfs::DirFS;
use vfs_core::handle::Directory;
use vfs_core::types::{FileMode, OpenFlags};

fn write(dir: &DirFS, name: &str, content: &[u8]) {
    let file = dir.open_file(name, OpenFlags::WRITE | OpenFlags::CREATE, FileMode::new_file(0o644)).unwrap();
    file.write(content).unwrap();
}

fn read_all(dir: &dyn Directory, name: &str) -> Vec<u8> {
    let file = dir.open_file(name, OpenFlags::READ, FileMode::default()).unwrap();
    let mut buf = Vec::new();
    let mut chunk = [0u8; 64];
    loop {
        let n = file.read(&mut chunk).unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    buf
}

#[test]
fn removing_the_overlay_copy_reveals_the_base_copy() {
    let base_dir = tempfile::tempdir().unwrap();
    let overlay_dir = tempfile::tempdir().unwrap();
    let base = DirFS::new(base_dir.path()).unwrap();
    let overlay = DirFS::new(overlay_dir.path()).unwrap();

    write(&base, "shared.txt", b"base content");
    write(&overlay, "shared.txt", b"overlay content");

    let layers: Vec<Arc<dyn Directory>> =
        vec![Arc::new(DirFS::new(base_dir.path()).unwrap()), Arc::new(DirFS::new(overlay_dir.path()).unwrap())];
    let stacked = LayerFS::new(layers).unwrap();

    assert_eq!(read_all(&stacked, "shared.txt"), b"overlay content");

    // The overlay is the writable top layer: mutations land there, so
    // unlinking through the stack removes the shadowing copy and not
    // the base's.
    stacked.unlink("shared.txt").unwrap();
    assert_eq!(read_all(&stacked, "shared.txt"), b"base content");
    assert!(DirFS::new(base_dir.path()).unwrap().lstat("shared.txt").unwrap().is_file());
}

#[test]
fn a_file_present_only_in_the_base_layer_reads_through() {
    let base_dir = tempfile::tempdir().unwrap();
    let overlay_dir = tempfile::tempdir().unwrap();
    write(&DirFS::new(base_dir.path()).unwrap(), "base-only.txt", b"from base");

    let layers: Vec<Arc<dyn Directory>> =
        vec![Arc::new(DirFS::new(base_dir.path()).unwrap()), Arc::new(DirFS::new(overlay_dir.path()).unwrap())];
    let stacked = LayerFS::new(layers).unwrap();

    assert_eq!(read_all(&stacked, "base-only.txt"), b"from base");
}

#[test]
fn a_non_directory_entry_in_the_top_layer_masks_a_directory_below() {
    let base_dir = tempfile::tempdir().unwrap();
    let overlay_dir = tempfile::tempdir().unwrap();
    let base = DirFS::new(base_dir.path()).unwrap();
    base.mkdir("node", FileMode::new_dir(0o755)).unwrap();
    write(&DirFS::new(overlay_dir.path()).unwrap(), "node", b"a plain file now");

    let layers: Vec<Arc<dyn Directory>> =
        vec![Arc::new(DirFS::new(base_dir.path()).unwrap()), Arc::new(DirFS::new(overlay_dir.path()).unwrap())];
    let stacked = LayerFS::new(layers).unwrap();

    let meta = stacked.lstat("node").unwrap();
    assert!(meta.is_file());
}
