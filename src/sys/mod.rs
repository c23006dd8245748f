//! Thin per-platform glue used by [`crate::dirfs::DirFS`].
//!
//! Everything that differs across hosts (raw open flags, permission-bit
//! layout) lives behind this module so `dirfs.rs` itself stays portable.
//! This crate currently targets Unix-family hosts; a `windows` module
//! would live alongside `unix` here without touching anything above it.

#[cfg(unix)]
mod unix;

#[cfg(unix)]
pub use unix::{apply_platform_flags, mode_bits, set_create_mode, set_dir_mode};
