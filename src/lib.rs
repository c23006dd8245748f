//! # vfs-core
//!
//! A capability-oriented, sandboxable virtual filesystem core.
//!
//! This crate provides a single [`handle::Directory`]/[`handle::File`]
//! capability contract, a host-backed leaf implementation
//! ([`dirfs::DirFS`]), an escape-proof path-resolving sandbox
//! ([`rootfs::RootFS`]), read-only projection
//! ([`readonly::ReadOnlyFS`]/[`readonly::ReadOnlyFile`]), a family of
//! composition wrappers ([`compose`]), and the top-level convenience
//! helpers every caller of a raw capability ends up wanting
//! ([`ops`], [`walk`]).
//!
//! ---
//!
//! ## Quick Start
//!
//! ```no_run
//! use vfs_core::dirfs::DirFS;
//! use vfs_core::rootfs::RootFS;
//! use vfs_core::{ops, handle::Directory};
//! use vfs_core::types::FileMode;
//! use std::sync::Arc;
//!
//! fn main() -> Result<(), vfs_core::error::PathError> {
//!     let backing: Arc<dyn Directory> = Arc::new(DirFS::new("/srv/sandboxed")?);
//!     let sandbox = RootFS::new(backing);
//!
//!     sandbox.mkdir("uploads", FileMode::new_dir(0o755)).ok();
//!     ops::write_file(&sandbox, "uploads/hello.txt", b"hi", FileMode::new_file(0o644))?;
//!     let meta = ops::stat(&sandbox, "uploads/hello.txt")?;
//!     assert!(meta.is_file());
//!     Ok(())
//! }
//! ```
//!
//! ---
//!
//! ## Core Types
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`handle::Directory`] | The capability contract: open, list, link, rename, stat, ... |
//! | [`handle::File`] | Adds read/write/seek/truncate/sync to an open handle. |
//! | [`dirfs::DirFS`] | Host-backed leaf, directory-relative (`openat`-family) I/O. |
//! | [`rootfs::RootFS`] | Escape-proof sandbox: bounded symlink resolution, clamped `..`. |
//! | [`error::PathError`] / [`error::ErrorKind`] | `{op, path, kind, source}` envelope over a small kind taxonomy. |
//! | [`types::Metadata`] / [`types::DirEntry`] | Size, mode, timestamps; one directory listing entry. |
//!
//! ---
//!
//! ## Which Wrapper Should I Use?
//!
//! **[`dirfs::DirFS`]** — the only type that actually touches the host. Every
//! other type in this crate wraps a `DirFS` (directly or transitively)
//! or another [`handle::Directory`].
//!
//! **[`rootfs::RootFS`]** — when untrusted or attacker-influenced paths
//! (including symlinks) must never resolve outside a chosen root.
//!
//! **[`readonly::ReadOnlyFS`]** — to make an entire subtree read-only,
//! recursively: every handle opened through it, and every handle opened
//! *through those handles*, stays read-only.
//!
//! **[`readonly::ReadOnlyFile`]** — to make one already-open handle
//! read-only without affecting what opening further children through it
//! returns (non-recursive).
//!
//! **[`compose::SubFS`]** — a convenience view rooted at a prefix of a
//! trusted inner filesystem; no sandboxing.
//!
//! **[`compose::MaskFS`]** — to hide entries or make a subtree read-only
//! by predicate (dotfiles, depth, or any other rule).
//!
//! **[`compose::MountFS`]** — to graft other filesystems at fixed paths
//! within a root, routed by most-specific-prefix.
//!
//! **[`compose::LayerFS`]** — to overlay several filesystems with
//! top-down precedence and directory-listing merge (the general case
//! `MountFS` specializes).
//!
//! **[`compose::ErrFS`]** — a stub that fails every operation with a
//! fixed error, for testing error-handling paths in callers.
//!
//! ---
//!
//! ## Error Handling
//!
//! Every fallible operation returns `Result<T, PathError>`. Callers
//! branch on [`error::ErrorKind`] via its "is" predicates, never on a
//! type name:
//!
//! ```rust
//! use vfs_core::error::{ErrorKind, PathError};
//!
//! let err = PathError::new("open", "missing.txt", ErrorKind::NotExist);
//! assert!(err.kind().is_not_exist());
//! ```
//!
//! ---
//!
//! ## Thread Safety
//!
//! Every [`handle::Directory`]/[`handle::File`] implementation in this
//! crate requires `Send + Sync` and takes `&self`, so handles compose
//! safely behind an `Arc` and can be shared across threads. The core
//! does not itself serialize concurrent operations on the *same* handle
//! beyond what atomics give it for free (see [`handle::CloseGuard`]);
//! that ordering is the caller's responsibility.
//!
//! ---
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `serde` | Enable serialization for [`types::Metadata`] and [`types::DirEntry`]. |

pub mod compose;
pub mod copy_equal;
pub mod device;
pub mod dirfs;
pub mod error;
pub mod handle;
pub mod ops;
pub mod path;
pub mod readonly;
pub mod rootfs;
mod sys;
pub mod types;
pub mod walk;

pub use error::{ErrorKind, PathError};
pub use handle::{Directory, File};
pub use types::{AccessMode, DirEntry, FileMode, Metadata, OpenFlags};
