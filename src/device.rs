//! # Device Number Encoding
//!
//! Construction and decomposition of packed device numbers for device
//! nodes created via [`crate::handle::Directory::mknod`].
//!
//! This module only implements the *contract* — pack `(major, minor)`
//! into the host's native encoding and back — not equality, ordering, or
//! any other `stat`-bit interpretation, which stays out of scope the same
//! way the crate's external boundary keeps raw OS syscalls external.
//!
//! Two packings are in use across real hosts and both are implemented
//! here, selected at compile time by `cfg(target_os)`:
//!
//! - Linux/glibc: the 64-bit layout glibc's `makedev`/`major`/`minor`
//!   macros use, which spreads both fields across the low and high
//!   32 bits so minor numbers above 8 bits still fit.
//! - Darwin (and other BSD-style hosts): the simpler 32-bit
//!   `(major << 8) | (minor & 0xff)` layout.

/// Packs a `(major, minor)` pair into this host's native device number
/// encoding.
///
/// # Example
///
/// ```
/// use vfs_core::device::{make_dev, dev_major, dev_minor};
///
/// let dev = make_dev(8, 1);
/// assert_eq!(dev_major(dev), 8);
/// assert_eq!(dev_minor(dev), 1);
/// ```
#[cfg(target_os = "macos")]
pub fn make_dev(major: u32, minor: u32) -> u64 {
    (((major as u64) << 8) | (minor as u64 & 0xff)) & 0xffff_ffff
}

/// See the non-macOS [`make_dev`] above; this is the glibc 64-bit
/// layout used on Linux and most other non-Darwin hosts.
#[cfg(not(target_os = "macos"))]
pub fn make_dev(major: u32, minor: u32) -> u64 {
    let major = major as u64;
    let minor = minor as u64;
    (minor & 0xff)
        | ((major & 0xfff) << 8)
        | ((minor & !0xff) << 12)
        | ((major & !0xfff) << 32)
}

/// Extracts the major number from a packed device number produced by
/// [`make_dev`] (or read back from [`crate::types::Metadata::dev`]).
#[cfg(target_os = "macos")]
pub fn dev_major(dev: u64) -> u32 {
    ((dev >> 8) & 0xff) as u32
}

/// See the non-macOS [`dev_major`] above.
#[cfg(not(target_os = "macos"))]
pub fn dev_major(dev: u64) -> u32 {
    (((dev >> 8) & 0xfff) | ((dev >> 32) & !0xfff)) as u32
}

/// Extracts the minor number from a packed device number produced by
/// [`make_dev`].
#[cfg(target_os = "macos")]
pub fn dev_minor(dev: u64) -> u32 {
    (dev & 0xff) as u32
}

/// See the non-macOS [`dev_minor`] above.
#[cfg(not(target_os = "macos"))]
pub fn dev_minor(dev: u64) -> u32 {
    ((dev & 0xff) | ((dev >> 12) & !0xff)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_small_numbers() {
        let dev = make_dev(8, 1);
        assert_eq!(dev_major(dev), 8);
        assert_eq!(dev_minor(dev), 1);
    }

    #[test]
    fn round_trips_large_minor() {
        let dev = make_dev(200, 4096);
        assert_eq!(dev_major(dev), 200);
        assert_eq!(dev_minor(dev), 4096);
    }

    #[test]
    fn zero_is_zero() {
        let dev = make_dev(0, 0);
        assert_eq!(dev_major(dev), 0);
        assert_eq!(dev_minor(dev), 0);
    }
}
