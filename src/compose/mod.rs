//! # Composition Wrappers
//!
//! Small [`Directory`](crate::handle::Directory) implementations that
//! wrap one or more inner directories to change behavior rather than
//! storage: an error-injecting stub, a path-prefixing sub-root, a
//! predicate-gated mask, and two kinds of stacking (layered overlay, and
//! mount-point routing).
//!
//! | Module | Wraps | Behavior |
//! |--------|-------|----------|
//! | [`errfs`] | nothing | every operation fails with a fixed [`crate::error::ErrorKind`] |
//! | [`subfs`] | one directory | presents a subtree as if it were the root |
//! | [`maskfs`] | one directory | hides or read-only-gates paths by predicate |
//! | [`layerfs`] | N directories | overlay stack, top-down read, top-only write |
//! | [`mountfs`] | N directories | routes by most-specific mount-point prefix |

pub mod errfs;
pub mod layerfs;
pub mod maskfs;
pub mod mountfs;
pub mod subfs;

pub use errfs::ErrFS;
pub use layerfs::LayerFS;
pub use maskfs::{MaskAction, MaskFS};
pub use mountfs::MountFS;
pub use subfs::SubFS;

use crate::types::OpenFlags;

/// Shared by every wrapper that needs to know whether an `open_file`
/// call asks for anything outside the read-only flag set (spec §4.5:
/// `RDONLY | DIRECTORY | NOFOLLOW | NONBLOCK | PATH`), independent of
/// exactly which write-or-durability-shaped flag was set.
pub(crate) fn write_flags_requested(flags: OpenFlags) -> bool {
    flags.is_writable()
        || flags.intersects(
            OpenFlags::CREATE
                | OpenFlags::TRUNC
                | OpenFlags::APPEND
                | OpenFlags::EXCL
                | OpenFlags::SYNC
                | OpenFlags::DSYNC
                | OpenFlags::RSYNC,
        )
}
