//! File enumeration under a project root, honoring an ignore-pattern tree
//! fixed as `.gitignore`-style globs.
//!
//! Path classification is O(1) for common directories via a fast-path set,
//! falling back to pattern matching only for non-obvious paths.

use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};

/// Directories skipped without ever consulting the glob set.
const FAST_PATH_IGNORED_DIRS: &[&str] = &[
    ".git",
    "node_modules",
    "target",
    "dist",
    "build",
    ".venv",
    "__pycache__",
    ".mypy_cache",
    ".pytest_cache",
];

#[derive(Debug, Clone)]
pub struct IgnoreTree {
    fast_path: std::collections::HashSet<&'static str>,
    excludes: GlobSet,
}

impl Default for IgnoreTree {
    fn default() -> Self {
        Self::new(&[])
    }
}

impl IgnoreTree {
    pub fn new(extra_patterns: &[String]) -> Self {
        let mut builder = GlobSetBuilder::new();
        for pattern in extra_patterns {
            if let Ok(glob) = Glob::new(pattern) {
                builder.add(glob);
            }
        }
        let excludes = builder.build().unwrap_or_else(|_| GlobSet::empty());
        Self {
            fast_path: FAST_PATH_IGNORED_DIRS.iter().copied().collect(),
            excludes,
        }
    }

    fn is_fast_path_ignored(&self, entry: &Path) -> bool {
        entry
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| self.fast_path.contains(n))
            .unwrap_or(false)
    }

    pub fn is_ignored(&self, relative_path: &Path) -> bool {
        if relative_path
            .components()
            .any(|c| self.is_fast_path_ignored(Path::new(c.as_os_str())))
        {
            return true;
        }
        self.excludes.is_match(relative_path)
    }
}

/// Recursively enumerates files under `root`, skipping whatever the
/// [`IgnoreTree`] excludes. Returned paths are relative to `root`, with
/// forward-slash separators so they are stable across platforms (matching
/// how `file_path` is stored and queried elsewhere in the system).
pub fn enumerate_files(root: &Path, ignore: &IgnoreTree) -> std::io::Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    walk(root, root, ignore, &mut out)?;
    Ok(out)
}

fn walk(root: &Path, dir: &Path, ignore: &IgnoreTree, out: &mut Vec<PathBuf>) -> std::io::Result<()> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(err) => return Err(err),
    };
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(&path).to_path_buf();
        if ignore.is_ignored(&relative) {
            continue;
        }
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            walk(root, &path, ignore, out)?;
        } else if file_type.is_file() {
            out.push(relative);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn fast_path_skips_common_noise_directories() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("node_modules/pkg")).unwrap();
        fs::write(dir.path().join("node_modules/pkg/index.js"), "").unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/a.py"), "").unwrap();

        let ignore = IgnoreTree::default();
        let files = enumerate_files(dir.path(), &ignore).unwrap();
        assert_eq!(files, vec![PathBuf::from("src/a.py")]);
    }

    #[test]
    fn extra_exclude_pattern_is_honored() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/a.py"), "").unwrap();
        fs::write(dir.path().join("src/a_test.py"), "").unwrap();

        let ignore = IgnoreTree::new(&["**/*_test.py".to_string()]);
        let mut files = enumerate_files(dir.path(), &ignore).unwrap();
        files.sort();
        assert_eq!(files, vec![PathBuf::from("src/a.py")]);
    }
}
