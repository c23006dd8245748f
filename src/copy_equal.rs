//! # Tree Copy and Comparison
//!
//! [`copy_tree`] and [`equal_tree`] back the `CopyFS`/`EqualFS` top-level
//! helpers, each doing its own depth-first walk of a
//! pair of [`Directory`] trees rather than building on [`crate::walk`] —
//! a two-filesystem walk needs to open matching paths on both sides at
//! each step, which a single-tree iterator doesn't carry.

use std::time::SystemTime;

use crate::error::{ErrorKind, PathError};
use crate::handle::{Directory, File};
use crate::types::{FileMode, OpenFlags};

/// Recursively mirrors every entry of `src` into `dst`. See
/// [`crate::ops::copy_fs`] for the full contract.
pub(crate) fn copy_tree(dst: &dyn Directory, src: &dyn Directory) -> Result<(), PathError> {
    for entry in src.read_dir(0)? {
        copy_entry(dst, src, &entry.name)?;
    }
    Ok(())
}

fn copy_entry(dst: &dyn Directory, src: &dyn Directory, name: &str) -> Result<(), PathError> {
    let meta = src.lstat(name)?;

    if meta.is_symlink() {
        let src_handle = src.open_file(name, OpenFlags::READ | OpenFlags::NOFOLLOW, FileMode::default())?;
        let target = src_handle.readlink()?;
        dst.symlink(&target, name)?;
        let dst_handle = dst.open_file(name, OpenFlags::READ | OpenFlags::NOFOLLOW, FileMode::default())?;
        dst_handle.chtimes(meta.accessed, meta.modified)?;
        return Ok(());
    }

    if meta.is_dir() {
        dst.mkdir(name, meta.mode)?;
        let src_sub = src.open_file(name, OpenFlags::DIRECTORY, FileMode::default())?;
        let dst_sub = dst.open_file(name, OpenFlags::DIRECTORY, FileMode::default())?;
        copy_tree(dst_sub.as_ref(), src_sub.as_ref())?;
        dst_sub.chmod(meta.mode)?;
        dst_sub.chtimes(meta.accessed, meta.modified)?;
        return Ok(());
    }

    if meta.is_file() {
        let src_handle = src.open_file(name, OpenFlags::READ, FileMode::default())?;
        let dst_handle = dst.open_file(name, OpenFlags::WRITE | OpenFlags::CREATE | OpenFlags::TRUNC, meta.mode)?;
        copy_file_contents(src_handle.as_ref(), dst_handle.as_ref())?;
        dst_handle.chmod(meta.mode)?;
        dst_handle.chtimes(meta.accessed, meta.modified)?;
        return Ok(());
    }

    // Device, FIFO, or socket node.
    let dev = meta.dev.unwrap_or(0);
    dst.mknod(name, meta.mode, dev)?;
    if meta.mode.contains(FileMode::DEVICE) {
        // Block devices may carry content worth mirroring; best-effort,
        // since most backends can't meaningfully open one.
        if let (Ok(src_handle), Ok(dst_handle)) = (
            src.open_file(name, OpenFlags::READ, FileMode::default()),
            dst.open_file(name, OpenFlags::WRITE, FileMode::default()),
        ) {
            let _ = copy_file_contents(src_handle.as_ref(), dst_handle.as_ref());
        }
    }
    let dst_handle = dst.open_file(name, OpenFlags::READ, FileMode::default())?;
    dst_handle.chmod(meta.mode)?;
    dst_handle.chtimes(meta.accessed, meta.modified)?;
    Ok(())
}

fn copy_file_contents(src: &dyn File, dst: &dyn File) -> Result<u64, PathError> {
    let mut buf = [0u8; 8192];
    let mut total = 0u64;
    loop {
        let n = src.read(&mut buf)?;
        if n == 0 {
            break;
        }
        let mut written = 0;
        while written < n {
            written += dst.write(&buf[written..n])?;
        }
        total += n as u64;
    }
    Ok(total)
}

/// Two-direction comparison of `a` against `b`. See
/// [`crate::ops::equal_fs`] for the full contract.
pub(crate) fn equal_tree(a: &dyn Directory, b: &dyn Directory) -> Result<(), PathError> {
    let mut a_entries = a.read_dir(0)?;
    let mut b_entries = b.read_dir(0)?;
    a_entries.sort_by(|x, y| x.name.cmp(&y.name));
    b_entries.sort_by(|x, y| x.name.cmp(&y.name));

    let a_names: Vec<&str> = a_entries.iter().map(|e| e.name.as_str()).collect();
    let b_names: Vec<&str> = b_entries.iter().map(|e| e.name.as_str()).collect();
    if a_names != b_names {
        return Err(mismatch("."));
    }

    for entry in &a_entries {
        equal_entry(a, b, &entry.name)?;
    }
    Ok(())
}

fn equal_entry(a: &dyn Directory, b: &dyn Directory, name: &str) -> Result<(), PathError> {
    let ma = a.lstat(name)?;
    let mb = b.lstat(name)?;

    if ma.is_dir() != mb.is_dir() || ma.is_symlink() != mb.is_symlink() || ma.is_file() != mb.is_file() {
        return Err(mismatch(name));
    }

    compare_perm(ma.mode.perm(), mb.mode.perm(), name)?;
    compare_time(ma.modified, mb.modified, name)?;
    compare_time(ma.accessed, mb.accessed, name)?;

    if !ma.is_dir() && ma.size != 0 && mb.size != 0 && ma.size != mb.size {
        return Err(mismatch(name));
    }

    if ma.is_dir() {
        let a_sub = a.open_file(name, OpenFlags::DIRECTORY, FileMode::default())?;
        let b_sub = b.open_file(name, OpenFlags::DIRECTORY, FileMode::default())?;
        equal_tree(a_sub.as_ref(), b_sub.as_ref())?;
    } else if ma.is_symlink() {
        let ah = a.open_file(name, OpenFlags::READ | OpenFlags::NOFOLLOW, FileMode::default())?;
        let bh = b.open_file(name, OpenFlags::READ | OpenFlags::NOFOLLOW, FileMode::default())?;
        if ah.readlink()? != bh.readlink()? {
            return Err(mismatch(name));
        }
    } else if ma.is_file() || ma.mode.contains(FileMode::DEVICE) {
        let ah = a.open_file(name, OpenFlags::READ, FileMode::default())?;
        let bh = b.open_file(name, OpenFlags::READ, FileMode::default())?;
        compare_contents(ah.as_ref(), bh.as_ref(), name)?;
    }
    Ok(())
}

fn compare_perm(pa: u32, pb: u32, name: &str) -> Result<(), PathError> {
    if pa == 0 || pb == 0 || pa == pb {
        Ok(())
    } else {
        Err(mismatch(name))
    }
}

fn compare_time(ta: SystemTime, tb: SystemTime, name: &str) -> Result<(), PathError> {
    if ta == SystemTime::UNIX_EPOCH || tb == SystemTime::UNIX_EPOCH || ta == tb {
        Ok(())
    } else {
        Err(mismatch(name))
    }
}

fn compare_contents(a: &dyn File, b: &dyn File, name: &str) -> Result<(), PathError> {
    let mut buf_a = [0u8; 8192];
    let mut buf_b = [0u8; 8192];
    loop {
        let na = a.read(&mut buf_a)?;
        let nb = b.read(&mut buf_b)?;
        if na != nb || buf_a[..na] != buf_b[..nb] {
            return Err(mismatch(name));
        }
        if na == 0 {
            return Ok(());
        }
    }
}

fn mismatch(name: &str) -> PathError {
    PathError::new("equal_fs", name, ErrorKind::Invalid)
}
