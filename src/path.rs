//! # Path Utilities
//!
//! Pure, host-independent helpers for the relative, slash-separated path
//! dialect this crate operates on.
//!
//! ## Overview
//!
//! Every operation in this crate accepts paths in one restricted shape:
//! either the literal string `"."`, or a non-empty sequence of non-empty
//! `/`-separated components with no leading or trailing slash, where any
//! leading `".."` components form a contiguous prefix and nothing after
//! that prefix is `"."` or `".."`. [`valid_path`] is the authority on this
//! shape; every other function in this module assumes its input already
//! satisfies it (or tolerates a superset for the sake of producing a
//! clean result, as noted per function).
//!
//! | Function | Purpose |
//! |----------|---------|
//! | [`valid_path`] | Is this string a legal path in this dialect? |
//! | [`clean_path`] | Lexically simplify `.`/`..`/repeated slashes. |
//! | [`join_path`] | Join a base and a name, collapsing `..` lexically. |
//! | [`split_path`] | Split into `(dir, file)`. |
//! | [`path_contains`] | Is `p` at or under `base`? |
//! | [`walk_path`] | Drive a resolver one path component at a time. |

use std::fmt;

/// Returns `true` iff `p` is `"."`, or a non-empty sequence of non-empty
/// slash-separated components where any leading components equal to
/// `".."` form a contiguous prefix and no other component is `""`, `"."`,
/// or `".."`.
///
/// # Examples
///
/// ```
/// use vfs_core::path::valid_path;
///
/// assert!(valid_path("."));
/// assert!(valid_path("a/b"));
/// assert!(valid_path("../a/b"));
/// assert!(valid_path("../../x"));
///
/// assert!(!valid_path("/a"));
/// assert!(!valid_path("a/"));
/// assert!(!valid_path("a//b"));
/// assert!(!valid_path("a/./b"));
/// assert!(!valid_path("a/../b"));
/// assert!(!valid_path(""));
/// ```
pub fn valid_path(p: &str) -> bool {
    if p == "." {
        return true;
    }
    if p.is_empty() || p.starts_with('/') || p.ends_with('/') {
        return false;
    }
    let mut past_dotdot_prefix = false;
    for component in p.split('/') {
        match component {
            "" | "." => return false,
            ".." => {
                if past_dotdot_prefix {
                    return false;
                }
            }
            _ => past_dotdot_prefix = true,
        }
    }
    true
}

/// Lexically simplifies a slash-separated path: drops `.` components,
/// collapses repeated slashes, and resolves `..` against whatever
/// preceded it in the string (leading `..` that have nothing to cancel
/// are kept). An empty input returns `"."`.
///
/// This is a purely lexical operation; it never touches the filesystem
/// and does not know about symlinks (that is [`crate::rootfs`]'s job).
///
/// # Examples
///
/// ```
/// use vfs_core::path::clean_path;
///
/// assert_eq!(clean_path(""), ".");
/// assert_eq!(clean_path("a/./b"), "a/b");
/// assert_eq!(clean_path("a/b/../c"), "a/c");
/// assert_eq!(clean_path("../a/../../b"), "../../b");
/// ```
pub fn clean_path(p: &str) -> String {
    if p.is_empty() {
        return ".".to_string();
    }
    let mut out: Vec<&str> = Vec::new();
    for component in p.split('/') {
        match component {
            "" | "." => continue,
            ".." => match out.last() {
                Some(&last) if last != ".." => {
                    out.pop();
                }
                _ => out.push(".."),
            },
            other => out.push(other),
        }
    }
    if out.is_empty() {
        ".".to_string()
    } else {
        out.join("/")
    }
}

/// Joins `base` and `name`, collapsing any leading `..` in `name` against
/// `base`. Returns `"."` if the result is the root.
///
/// # Examples
///
/// ```
/// use vfs_core::path::join_path;
///
/// assert_eq!(join_path(".", "a"), "a");
/// assert_eq!(join_path("a/b", "../c"), "a/c");
/// assert_eq!(join_path("a", ".."), ".");
/// ```
pub fn join_path(base: &str, name: &str) -> String {
    if name.is_empty() || name == "." {
        return if base.is_empty() { ".".to_string() } else { base.to_string() };
    }
    if base.is_empty() || base == "." {
        clean_path(name)
    } else {
        clean_path(&format!("{base}/{name}"))
    }
}

/// Splits `p` into `(dir, file)`. For a single-component path, `dir` is
/// `"."`.
///
/// # Examples
///
/// ```
/// use vfs_core::path::split_path;
///
/// assert_eq!(split_path("a/b/c"), ("a/b".to_string(), "c".to_string()));
/// assert_eq!(split_path("only.txt"), (".".to_string(), "only.txt".to_string()));
/// ```
pub fn split_path(p: &str) -> (String, String) {
    match p.rfind('/') {
        Some(idx) => (p[..idx].to_string(), p[idx + 1..].to_string()),
        None => (".".to_string(), p.to_string()),
    }
}

/// Returns `true` iff `base` is `"."`, or `p` equals `base`, or `p` is
/// rooted at `base` followed by a `/`.
///
/// Used by mount-point stacking ([`crate::compose::mountfs`]) to find the
/// most-specific mount covering a path.
///
/// # Examples
///
/// ```
/// use vfs_core::path::path_contains;
///
/// assert!(path_contains(".", "anything"));
/// assert!(path_contains("a/b", "a/b"));
/// assert!(path_contains("a/b", "a/b/c"));
/// assert!(!path_contains("a/b", "a/bc"));
/// ```
pub fn path_contains(base: &str, p: &str) -> bool {
    if base == "." {
        return true;
    }
    p == base || p.starts_with(base) && p[base.len()..].starts_with('/')
}

/// Drives a directory-resolution callback one path component at a time.
///
/// Given a logical starting location `base` and a path to resolve further,
/// `walk_path` first consumes any leading `".."` components of `path`,
/// popping one segment off `base` per component (clamped: popping past an
/// empty `base` is a no-op, not an error) and invoking `step("..")` for
/// each one regardless of whether anything was actually popped — it is
/// the caller's `step` closure that knows whether "popping" should
/// translate into a real directory change (see [`crate::rootfs`], which
/// is the only caller that cares).
///
/// It then invokes `step(name)` once for every *intermediate* component of
/// `path` (every component except the last), extending `base` by that
/// component first. The final component of `path` is never passed to
/// `step`; it is returned as `remaining`, for the caller to open directly.
///
/// If `step` returns `Err(e)`, iteration stops immediately and `e` is
/// returned as the third element of the tuple — including the reserved
/// sentinel callers use to signal "a symlink was found, please restart
/// resolution" rather than a genuine failure (see
/// [`crate::rootfs::RootFs`]).
///
/// # Returns
///
/// `(new_base, remaining_last_component, error)`. `error` is `None` on
/// normal completion.
pub fn walk_path<E>(
    base: &str,
    path: &str,
    mut step: impl FnMut(&str) -> Result<(), E>,
) -> (String, String, Option<E>) {
    let mut base_segments: Vec<&str> = if base == "." || base.is_empty() {
        Vec::new()
    } else {
        base.split('/').collect()
    };

    let mut components = path.split('/').peekable();

    while components.peek() == Some(&"..") {
        components.next();
        base_segments.pop();
        if let Err(e) = step("..") {
            return (join_segments(&base_segments), String::new(), Some(e));
        }
    }

    let rest: Vec<&str> = components.collect();
    if rest.is_empty() || (rest.len() == 1 && rest[0].is_empty()) {
        // `path` was purely leading `..` components (or was exactly ".").
        return (join_segments(&base_segments), ".".to_string(), None);
    }

    let (intermediate, last) = rest.split_at(rest.len() - 1);
    for name in intermediate {
        base_segments.push(name);
        if let Err(e) = step(name) {
            return (join_segments(&base_segments), String::new(), Some(e));
        }
    }

    (join_segments(&base_segments), last[0].to_string(), None)
}

fn join_segments(segments: &[&str]) -> String {
    if segments.is_empty() {
        ".".to_string()
    } else {
        segments.join("/")
    }
}

/// Lightweight error shape used only by doctests/examples that want to
/// show `walk_path` without wiring up the full resolver error type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkError(pub String);

impl fmt::Display for WalkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_path_accepts_dot() {
        assert!(valid_path("."));
    }

    #[test]
    fn valid_path_rejects_absolute() {
        assert!(!valid_path("/a"));
    }

    #[test]
    fn valid_path_rejects_trailing_slash() {
        assert!(!valid_path("a/"));
    }

    #[test]
    fn valid_path_rejects_double_slash() {
        assert!(!valid_path("a//b"));
    }

    #[test]
    fn valid_path_rejects_dot_component() {
        assert!(!valid_path("a/./b"));
    }

    #[test]
    fn valid_path_allows_leading_dotdot_run() {
        assert!(valid_path("../../a/b"));
    }

    #[test]
    fn valid_path_rejects_dotdot_after_normal_component() {
        assert!(!valid_path("a/../b"));
    }

    #[test]
    fn clean_path_empty_is_dot() {
        assert_eq!(clean_path(""), ".");
    }

    #[test]
    fn clean_path_collapses_dot_components() {
        assert_eq!(clean_path("a/./b/./c"), "a/b/c");
    }

    #[test]
    fn clean_path_resolves_dotdot() {
        assert_eq!(clean_path("a/b/../c"), "a/c");
    }

    #[test]
    fn clean_path_keeps_unresolvable_leading_dotdot() {
        assert_eq!(clean_path("../a/../../b"), "../../b");
    }

    #[test]
    fn join_path_root_case() {
        assert_eq!(join_path("a", ".."), ".");
    }

    #[test]
    fn join_path_collapses_against_base() {
        assert_eq!(join_path("a/b", "../c"), "a/c");
    }

    #[test]
    fn split_path_single_component() {
        let (dir, file) = split_path("only.txt");
        assert_eq!(dir, ".");
        assert_eq!(file, "only.txt");
    }

    #[test]
    fn split_path_nested() {
        let (dir, file) = split_path("a/b/c");
        assert_eq!(dir, "a/b");
        assert_eq!(file, "c");
    }

    #[test]
    fn path_contains_root_matches_everything() {
        assert!(path_contains(".", "whatever/nested"));
    }

    #[test]
    fn path_contains_exact_match() {
        assert!(path_contains("a/b", "a/b"));
    }

    #[test]
    fn path_contains_rejects_sibling_prefix() {
        assert!(!path_contains("a/b", "a/bc"));
    }

    #[test]
    fn walk_path_single_component_has_no_intermediate_steps() {
        let mut calls = Vec::new();
        let (base, last, err): (_, _, Option<WalkError>) =
            walk_path(".", "only.txt", |c| {
                calls.push(c.to_string());
                Ok(())
            });
        assert!(calls.is_empty());
        assert_eq!(base, ".");
        assert_eq!(last, "only.txt");
        assert!(err.is_none());
    }

    #[test]
    fn walk_path_visits_intermediate_components() {
        let mut calls = Vec::new();
        let (base, last, err): (_, _, Option<WalkError>) = walk_path(".", "a/b/c", |c| {
            calls.push(c.to_string());
            Ok(())
        });
        assert_eq!(calls, vec!["a", "b"]);
        assert_eq!(base, "a/b");
        assert_eq!(last, "c");
        assert!(err.is_none());
    }

    #[test]
    fn walk_path_leading_dotdot_pops_base_and_calls_step() {
        let mut calls = Vec::new();
        let (base, last, err): (_, _, Option<WalkError>) =
            walk_path("x/y", "../z", |c| {
                calls.push(c.to_string());
                Ok(())
            });
        assert_eq!(calls, vec![".."]);
        assert_eq!(base, "x");
        assert_eq!(last, "z");
        assert!(err.is_none());
    }

    #[test]
    fn walk_path_dotdot_at_root_is_absorbed_but_step_still_runs() {
        let mut calls = Vec::new();
        let (base, last, err): (_, _, Option<WalkError>) = walk_path(".", "../only.txt", |c| {
            calls.push(c.to_string());
            Ok(())
        });
        assert_eq!(calls, vec![".."]);
        assert_eq!(base, ".");
        assert_eq!(last, "only.txt");
        assert!(err.is_none());
    }

    #[test]
    fn walk_path_propagates_step_error() {
        let (_, _, err) = walk_path(".", "a/b/c", |c| {
            if c == "b" {
                Err(WalkError("boom".to_string()))
            } else {
                Ok(())
            }
        });
        assert_eq!(err, Some(WalkError("boom".to_string())));
    }
}
