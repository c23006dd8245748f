//! Stacking composition wrappers: a two-layer overlay, a read-only
//! projection over the whole stack, and a `SubFS` view rooted at one
//! subtree of it.
//!
//! Run with: `cargo run --example composition`

use std::sync::Arc;

use vfs_core::compose::{LayerFS, SubFS};
use vfs_core::dirfs::DirFS;
use vfs_core::error::PathError;
use vfs_core::handle::Directory;
use vfs_core::ops;
use vfs_core::readonly::ReadOnlyFS;
use vfs_core::types::FileMode;

fn main() -> Result<(), PathError> {
    tracing_subscriber::fmt::init();

    let base_dir = tempfile::tempdir().expect("create temp dir");
    let overlay_dir = tempfile::tempdir().expect("create temp dir");

    let base: Arc<dyn Directory> = Arc::new(DirFS::new(base_dir.path())?);
    ops::write_file(&*base, "config.toml", b"mode = \"base\"\n", FileMode::new_file(0o644))?;

    let overlay: Arc<dyn Directory> = Arc::new(DirFS::new(overlay_dir.path())?);
    ops::write_file(&*overlay, "config.toml", b"mode = \"overlay\"\n", FileMode::new_file(0o644))?;

    // The last layer wins: "overlay" shadows "base" at config.toml, but
    // any path only the base layer has still reads through.
    let stacked = LayerFS::new(vec![base.clone(), overlay.clone()])?;
    let handle = ops::open(&stacked, "config.toml")?;
    let mut buf = [0u8; 64];
    let n = handle.read(&mut buf)?;
    println!("layered config.toml: {:?}", String::from_utf8_lossy(&buf[..n]));

    // Pin the whole stack read-only, recursively: nothing opened through
    // `frozen`, or through any handle it hands back, can be written.
    let stacked: Arc<dyn Directory> = Arc::new(LayerFS::new(vec![base, overlay])?);
    let frozen = ReadOnlyFS::new(stacked);
    let err = ops::write_file(&frozen, "config.toml", b"mode = \"denied\"\n", FileMode::new_file(0o644)).unwrap_err();
    println!("write through frozen stack: {} (kind={:?})", err, err.kind());

    // SubFS presents one subtree of a trusted filesystem as if it were
    // the root, with no sandboxing of its own.
    let frozen: Arc<dyn Directory> = Arc::new(frozen);
    let sub = SubFS::new(frozen, ".")?;
    let meta = ops::stat(&sub, "config.toml")?;
    println!("via SubFS(\".\"): config.toml is_file={}", meta.is_file());

    Ok(())
}
