//! Basic usage of vfs-core: a host directory wrapped in an escape-proof
//! sandbox.
//!
//! This walks through the operations a guest-facing caller reaches for
//! first: opening the sandbox root, creating a directory and a file
//! under it, reading the file back, and showing that a `..`-climb can't
//! escape the sandbox root.
//!
//! Run with: `cargo run --example basic_usage`

use std::sync::Arc;

use vfs_core::dirfs::DirFS;
use vfs_core::error::PathError;
use vfs_core::handle::Directory;
use vfs_core::ops;
use vfs_core::rootfs::RootFS;
use vfs_core::types::{FileMode, OpenFlags};

fn main() -> Result<(), PathError> {
    tracing_subscriber::fmt::init();

    let tmp = tempfile::tempdir().expect("create temp dir");
    let backing: Arc<dyn Directory> = Arc::new(DirFS::new(tmp.path())?);
    let sandbox = RootFS::new(backing);

    sandbox.mkdir("uploads", FileMode::new_dir(0o755))?;
    ops::write_file(&sandbox, "uploads/hello.txt", b"hi from the sandbox", FileMode::new_file(0o644))?;

    let meta = ops::stat(&sandbox, "uploads/hello.txt")?;
    println!("uploads/hello.txt: {} bytes, is_file={}", meta.size, meta.is_file());

    let handle = ops::open(&sandbox, "uploads/hello.txt")?;
    let mut buf = Vec::new();
    let mut chunk = [0u8; 64];
    loop {
        let n = handle.read(&mut chunk)?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    println!("contents: {:?}", String::from_utf8_lossy(&buf));

    // A `..`-climb past the root is clamped at the root rather than
    // rejected outright: this still resolves to uploads/hello.txt.
    let climbed = sandbox.open_file("../../../uploads/hello.txt", OpenFlags::READ, FileMode::default())?;
    println!("climb clamp: opened {:?} despite the leading ../../..", climbed.name());

    Ok(())
}
