//! Filesystem helpers for tablespace file discovery.
//!
//! [`find_tablespace_files`] collects files by extension and
//! [`find_files_with_prefix`] by file-name prefix. Both descend the whole
//! directory tree and return paths sorted, so runs are reproducible.
//!
//! Symlinked directories are not followed. Only the root directory must be
//! readable: a nested directory that cannot be listed is recorded in
//! [`Discovery::unreadable`] and its subtree is skipped.

use std::path::{Path, PathBuf};

use crate::SalvageError;

/// Files found under a directory tree.
#[derive(Debug, Default)]
pub struct Discovery {
    /// Matching files, sorted.
    pub files: Vec<PathBuf>,
    /// Nested directories or entries that could not be read.
    pub unreadable: Vec<(PathBuf, SalvageError)>,
}

/// Recursively find files under `dir` whose extension is one of `extensions`
/// (without the dot, e.g. `["ibd"]`).
pub fn find_tablespace_files(dir: &Path, extensions: &[&str]) -> Result<Discovery, SalvageError> {
    find_matching(dir, &|path| has_matching_extension(path, extensions))
}

/// Recursively find files under `dir` whose file name starts with `prefix`.
pub fn find_files_with_prefix(dir: &Path, prefix: &str) -> Result<Discovery, SalvageError> {
    find_matching(dir, &|path| {
        path.file_name()
            .is_some_and(|name| name.to_string_lossy().starts_with(prefix))
    })
}

fn find_matching(
    dir: &Path,
    matches: &dyn Fn(&Path) -> bool,
) -> Result<Discovery, SalvageError> {
    if !dir.is_dir() {
        return Err(SalvageError::Argument(format!(
            "Data directory does not exist: {}",
            dir.display()
        )));
    }

    let mut found = Discovery::default();
    let mut pending = vec![dir.to_path_buf()];

    while let Some(current) = pending.pop() {
        let entries = match std::fs::read_dir(&current) {
            Ok(entries) => entries,
            Err(e) => {
                let err = SalvageError::Io(format!(
                    "Cannot read directory {}: {}",
                    current.display(),
                    e
                ));
                if current == dir {
                    return Err(err);
                }
                found.unreadable.push((current, err));
                continue;
            }
        };

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let err = SalvageError::Io(format!(
                        "Cannot read directory entry in {}: {}",
                        current.display(),
                        e
                    ));
                    found.unreadable.push((current.clone(), err));
                    continue;
                }
            };
            let path = entry.path();
            let file_type = match entry.file_type() {
                Ok(ft) => ft,
                Err(e) => {
                    let err =
                        SalvageError::Io(format!("Cannot stat {}: {}", path.display(), e));
                    found.unreadable.push((path, err));
                    continue;
                }
            };

            if file_type.is_dir() {
                pending.push(path);
            } else if file_type.is_symlink() && path.is_dir() {
                continue;
            } else if matches(&path) {
                found.files.push(path);
            }
        }
    }

    found.files.sort();
    found.unreadable.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(found)
}

fn has_matching_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .is_some_and(|ext| extensions.iter().any(|e| ext == *e))
}
