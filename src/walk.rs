//! # Directory Tree Walking
//!
//! A recursive, lazy walk over any [`Directory`], yielding `(path,
//! Metadata)` pairs depth-first. Named in the top-level helper list but
//! not detailed further; this crate's version mirrors the conventions of
//! `std::fs::read_dir` recursion and the `walkdir` crate visible
//! elsewhere in the pack: symlinks are reported but not followed by
//! default, and a failure reading one subtree does not abort the whole
//! walk — it is yielded as an `Err` entry and the walk continues with
//! whatever siblings remain.

use std::collections::VecDeque;

use crate::error::PathError;
use crate::handle::Directory;
use crate::path::join_path;
use crate::types::{FileMode, Metadata, OpenFlags};

/// One entry produced by [`walk_dir`]: the path relative to the walk's
/// starting point, and its metadata (via `lstat`, so a symlink is
/// reported as a symlink rather than as whatever it points to).
pub struct WalkEntry {
    /// Path of this entry, relative to the directory passed to
    /// [`walk_dir`].
    pub path: String,
    /// `lstat`-style metadata for this entry.
    pub metadata: Metadata,
}

/// Walks `root` depth-first, yielding every entry under it (but not
/// `root` itself). Directories are descended into; symlinks are yielded
/// but never followed, matching the "don't walk into a symlinked
/// subtree by default" convention every `std::fs`-adjacent walker in the
/// pack uses. A directory that fails to list (permission, handle churn
/// mid-walk) yields one `Err` entry for that directory and the walk
/// continues with whatever else is queued.
pub fn walk_dir(root: &dyn Directory) -> impl Iterator<Item = Result<WalkEntry, PathError>> + '_ {
    WalkDir {
        root,
        queue: VecDeque::from([".".to_string()]),
        pending: VecDeque::new(),
    }
}

struct WalkDir<'a> {
    root: &'a dyn Directory,
    /// Directories (relative to `root`) still to be listed.
    queue: VecDeque<String>,
    /// Entries already listed, waiting to be yielded.
    pending: VecDeque<Result<WalkEntry, PathError>>,
}

impl Iterator for WalkDir<'_> {
    type Item = Result<WalkEntry, PathError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(entry) = self.pending.pop_front() {
                return Some(entry);
            }

            let dir_path = self.queue.pop_front()?;
            let handle = match self.root.open_file(&dir_path, OpenFlags::DIRECTORY, FileMode::default()) {
                Ok(h) => h,
                Err(e) => return Some(Err(e)),
            };

            let entries = match handle.read_dir(0) {
                Ok(entries) => entries,
                Err(e) => return Some(Err(e)),
            };

            for entry in entries {
                let path = join_path(&dir_path, &entry.name);
                let metadata = match self.root.lstat(&path) {
                    Ok(m) => m,
                    Err(e) => {
                        self.pending.push_back(Err(e));
                        continue;
                    }
                };
                if metadata.is_dir() {
                    self.queue.push_back(path.clone());
                }
                self.pending.push_back(Ok(WalkEntry { path, metadata }));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dirfs::DirFS;

    #[test]
    fn walk_visits_every_nested_entry() {
        let tmp = tempfile::tempdir().unwrap();
        let fs = DirFS::new(tmp.path()).unwrap();
        fs.mkdir("a", FileMode::new_dir(0o755)).unwrap();
        fs.open_file("a/x.txt", OpenFlags::WRITE | OpenFlags::CREATE, FileMode::new_file(0o644))
            .unwrap();
        fs.open_file("y.txt", OpenFlags::WRITE | OpenFlags::CREATE, FileMode::new_file(0o644))
            .unwrap();

        let mut paths: Vec<String> = walk_dir(&fs).map(|e| e.unwrap().path).collect();
        paths.sort();
        assert_eq!(paths, vec!["a".to_string(), "a/x.txt".to_string(), "y.txt".to_string()]);
    }

    #[test]
    fn walk_does_not_follow_symlinked_subtrees() {
        let tmp = tempfile::tempdir().unwrap();
        let fs = DirFS::new(tmp.path()).unwrap();
        fs.mkdir("real", FileMode::new_dir(0o755)).unwrap();
        fs.open_file("real/inside.txt", OpenFlags::WRITE | OpenFlags::CREATE, FileMode::new_file(0o644))
            .unwrap();
        fs.symlink("real", "alias").unwrap();

        let entries: Vec<WalkEntry> = walk_dir(&fs).filter_map(Result::ok).collect();
        let alias = entries.iter().find(|e| e.path == "alias").unwrap();
        assert!(alias.metadata.is_symlink());
        assert!(!entries.iter().any(|e| e.path == "alias/inside.txt"));
    }
}
