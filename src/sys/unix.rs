//! Unix platform glue for [`crate::dirfs::DirFS`]: translating this
//! crate's [`OpenFlags`]/[`FileMode`] into the raw flag and mode values
//! the host's `openat`-family calls expect.
//!
//! Kept deliberately tiny and free of any filesystem logic of its own —
//! everything here is a pure translation, so `dirfs.rs` stays the one
//! place that decides *what* to do and this module only decides *how to
//! spell it* for the current host.

use std::io;
use std::os::unix::fs::PermissionsExt;

use cap_std::fs::{Dir, OpenOptions, OpenOptionsExt};

use crate::types::{FileMode, OpenFlags};

#[cfg(target_os = "linux")]
const O_NOFOLLOW: i32 = 0o400_000;

#[cfg(all(unix, not(target_os = "linux")))]
const O_NOFOLLOW: i32 = 0x0100;

/// Applies any platform-specific `custom_flags` this host needs beyond
/// what `cap_std::fs::OpenOptions`'s portable builder methods cover.
///
/// Currently this is only [`OpenFlags::NOFOLLOW`], which has no portable
/// builder method and must go through the raw `O_NOFOLLOW` bit.
pub fn apply_platform_flags(opts: &mut OpenOptions, flags: OpenFlags) {
    if flags.contains(OpenFlags::NOFOLLOW) {
        opts.custom_flags(O_NOFOLLOW);
    }
}

/// Extracts the raw permission bits `cap_std`'s creation-mode builder
/// methods expect from a [`FileMode`].
pub fn mode_bits(mode: FileMode) -> u32 {
    mode.perm()
}

/// Sets the permission bits a newly-*created* file should get, via
/// `cap_std`'s Unix `OpenOptionsExt::mode`, mirroring
/// `std::os::unix::fs::OpenOptionsExt`. Has no effect when the open
/// does not end up creating anything (an existing file keeps its mode).
pub fn set_create_mode(opts: &mut OpenOptions, perm: FileMode) {
    opts.mode(mode_bits(perm));
}

/// Applies `perm`'s permission bits to the directory just created at
/// `name` under `dir`. `cap_std::fs::Dir::create_dir` has no builder
/// for a creation mode (unlike `OpenOptions`), so the bits are applied
/// as a follow-up `chmod`, the same two-step `mkdir` + `chmod` a
/// portable `mkdir -m` implementation performs.
pub fn set_dir_mode(dir: &Dir, name: &str, perm: FileMode) -> io::Result<()> {
    let mut permissions = dir.metadata(name)?.permissions();
    permissions.set_mode(mode_bits(perm));
    dir.set_permissions(name, permissions)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_bits_masks_to_permission_range() {
        let mode = FileMode::new_file(0o100644);
        assert_eq!(mode_bits(mode), 0o644);
    }
}
