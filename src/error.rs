//! # Error Types
//!
//! Error handling for every operation in this crate.
//!
//! ## Overview
//!
//! Every fallible operation returns `Result<T, PathError>`. [`PathError`]
//! is a single concrete envelope — `{ op, path, kind, source }` — rather
//! than a sprawling enum of variants per failure mode: callers branch on
//! [`ErrorKind`], a small, `Copy`, `non_exhaustive` set of *kinds*, not on
//! named error types. This mirrors POSIX's own `errno` model, which is
//! what every operation in this crate ultimately bottoms out on.
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`ErrorKind`] | The small set of ways an operation can fail. |
//! | [`PathError`] | `{op, path, kind, source}` — what failed, on what, how. |
//!
//! ## Quick Example
//!
//! ```rust
//! use vfs_core::error::{ErrorKind, PathError};
//!
//! let err = PathError::new("open", "missing.txt", ErrorKind::NotExist);
//! assert!(err.kind().is_not_exist());
//! assert!(err.to_string().contains("missing.txt"));
//! ```
//!
//! ## Conversion from `std::io::Error`
//!
//! ```rust
//! use vfs_core::error::{ErrorKind, PathError};
//! use std::io;
//!
//! let io_err = io::Error::new(io::ErrorKind::NotFound, "enoent");
//! let err = PathError::from_io("stat", "missing.txt", io_err);
//! assert_eq!(err.kind(), ErrorKind::NotExist);
//! ```

use std::fmt;
use std::io;

/// The small, fixed set of ways a filesystem operation can fail.
///
/// This is intentionally a flat, payload-free, `Copy` enum: every piece
/// of context beyond "which kind of failure" lives on [`PathError`]
/// instead, so callers can match on `kind()` without fighting the borrow
/// checker or cloning large structures.
///
/// Marked `#[non_exhaustive]` so new kinds can be added without breaking
/// downstream `match` arms, matching the error-taxonomy convention this
/// crate follows throughout (composition wrappers, `DirFS`, `RootFS` all
/// only ever construct one of these).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The path does not exist.
    NotExist,
    /// The path, argument, or operation is structurally invalid (for
    /// example, a malformed path or an unsupported flag combination).
    Invalid,
    /// The path already exists where the operation required it not to.
    Exist,
    /// A path component expected to be a directory is not one.
    NotDirectory,
    /// A directory-removal operation found the directory non-empty.
    NotEmpty,
    /// The handle has already been closed.
    Closed,
    /// The target filesystem (or layer) is read-only.
    ReadOnly,
    /// The caller lacks permission for this operation.
    Permission,
    /// The backend understands the request but will never support it.
    NotSupported,
    /// The backend could support this but has not implemented it yet.
    NotImplemented,
    /// Path resolution exceeded the symlink-lookup budget.
    Loop,
    /// A device-node operation failed for a device-specific reason.
    Device,
}

impl ErrorKind {
    /// `true` for [`ErrorKind::NotExist`].
    pub fn is_not_exist(&self) -> bool {
        matches!(self, Self::NotExist)
    }

    /// `true` for [`ErrorKind::Exist`].
    pub fn is_exist(&self) -> bool {
        matches!(self, Self::Exist)
    }

    /// `true` for [`ErrorKind::Permission`].
    pub fn is_permission(&self) -> bool {
        matches!(self, Self::Permission)
    }

    /// `true` for [`ErrorKind::ReadOnly`].
    pub fn is_read_only(&self) -> bool {
        matches!(self, Self::ReadOnly)
    }

    /// `true` for [`ErrorKind::Closed`].
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }

    /// `true` for [`ErrorKind::Loop`].
    pub fn is_loop(&self) -> bool {
        matches!(self, Self::Loop)
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::NotExist => "no such file or directory",
            Self::Invalid => "invalid argument",
            Self::Exist => "already exists",
            Self::NotDirectory => "not a directory",
            Self::NotEmpty => "directory not empty",
            Self::Closed => "handle closed",
            Self::ReadOnly => "read-only filesystem",
            Self::Permission => "permission denied",
            Self::NotSupported => "not supported",
            Self::NotImplemented => "not implemented",
            Self::Loop => "too many levels of symbolic links",
            Self::Device => "device error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalizes a raw `std::io::Error` into an [`ErrorKind`], per the
/// errno table: `EACCES`/`EPERM` -> `Permission`, `EINVAL` -> `Invalid`,
/// `EEXIST` -> `Exist`, `ENOENT` -> `NotExist`, `ENOTDIR` -> `NotDirectory`,
/// `ENOTEMPTY` -> `NotEmpty`, `ELOOP` -> `Loop`, and `EISDIR` on an
/// unlink-shaped operation -> `Permission` (unlinking a directory is a
/// permission question at this crate's boundary, not a type question —
/// callers that need "it's a directory" should check via `lstat` first).
///
/// Kinds with no `std::io::ErrorKind` counterpart (`Closed`,
/// `NotSupported`, `NotImplemented`, `Device`) are never produced by this
/// conversion; this crate's own code constructs those directly.
impl From<&io::Error> for ErrorKind {
    fn from(err: &io::Error) -> Self {
        #[cfg(unix)]
        if let Some(errno) = err.raw_os_error() {
            match errno {
                libc::EACCES | libc::EPERM => return Self::Permission,
                libc::EINVAL => return Self::Invalid,
                libc::EEXIST => return Self::Exist,
                libc::ENOENT => return Self::NotExist,
                libc::ENOTDIR => return Self::NotDirectory,
                libc::ENOTEMPTY => return Self::NotEmpty,
                libc::ELOOP => return Self::Loop,
                libc::EISDIR => return Self::Permission,
                _ => {}
            }
        }
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotExist,
            io::ErrorKind::PermissionDenied => Self::Permission,
            io::ErrorKind::AlreadyExists => Self::Exist,
            io::ErrorKind::InvalidInput | io::ErrorKind::InvalidData => Self::Invalid,
            io::ErrorKind::Unsupported => Self::NotSupported,
            _ => Self::Invalid,
        }
    }
}

/// The error envelope every fallible operation in this crate returns:
/// which operation, on which path, failed how — plus, when the failure
/// originated from a real host I/O error, the original `io::Error` as
/// the source for diagnostics.
#[derive(Debug, thiserror::Error)]
#[error("{op} {path}: {kind}")]
pub struct PathError {
    /// The operation that failed (`"open"`, `"mkdir"`, `"rename"`, ...).
    /// A `&'static str` rather than an enum: this is free-text for
    /// diagnostics, not something callers are expected to branch on.
    pub op: &'static str,
    /// The path the operation was performed against.
    pub path: String,
    /// The kind of failure.
    pub kind: ErrorKind,
    /// The original I/O error, when this envelope wraps one.
    #[source]
    pub source: Option<io::Error>,
}

impl PathError {
    /// Builds an envelope with no underlying I/O source, for failures
    /// this crate detects itself (invalid paths, closed handles,
    /// read-only layers, symlink-loop budgets).
    pub fn new(op: &'static str, path: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            op,
            path: path.into(),
            kind,
            source: None,
        }
    }

    /// Builds an envelope from a raw `std::io::Error`, normalizing it to
    /// an [`ErrorKind`] via [`ErrorKind::from`].
    pub fn from_io(op: &'static str, path: impl Into<String>, err: io::Error) -> Self {
        let kind = ErrorKind::from(&err);
        Self {
            op,
            path: path.into(),
            kind,
            source: Some(err),
        }
    }

    /// The kind of failure this envelope carries.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_has_no_source() {
        let err = PathError::new("mkdir", "a/b", ErrorKind::Exist);
        assert!(err.source.is_none());
        assert_eq!(err.kind(), ErrorKind::Exist);
    }

    #[test]
    fn display_includes_op_and_path() {
        let err = PathError::new("open", "a/b.txt", ErrorKind::NotExist);
        let rendered = err.to_string();
        assert!(rendered.contains("open"));
        assert!(rendered.contains("a/b.txt"));
    }

    #[test]
    fn from_io_not_found_maps_to_not_exist() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "enoent");
        let err = PathError::from_io("stat", "x", io_err);
        assert_eq!(err.kind(), ErrorKind::NotExist);
        assert!(err.source.is_some());
    }

    #[test]
    fn from_io_permission_denied_maps_to_permission() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "eacces");
        assert_eq!(ErrorKind::from(&io_err), ErrorKind::Permission);
    }

    #[test]
    fn kind_predicates() {
        assert!(ErrorKind::NotExist.is_not_exist());
        assert!(ErrorKind::Permission.is_permission());
        assert!(ErrorKind::ReadOnly.is_read_only());
        assert!(ErrorKind::Closed.is_closed());
        assert!(ErrorKind::Loop.is_loop());
        assert!(!ErrorKind::Invalid.is_not_exist());
    }
}
