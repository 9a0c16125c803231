//! Configuration utility functions.

use std::path::{Path, PathBuf};

/// Find config file by searching upward from `start`.
///
/// An absolute `config_name` that exists is returned as is.
///
/// ```text
/// /home/user/cv/letters/   ← start
/// /home/user/vitae.toml    ← found
/// ```
pub fn find_config_file(config_name: &Path, start: &Path) -> Option<PathBuf> {
    if config_name.is_absolute() {
        return config_name.exists().then(|| config_name.to_path_buf());
    }

    let mut current = start;
    loop {
        let candidate = current.join(config_name);
        if candidate.is_file() {
            return Some(candidate);
        }
        current = current.parent()?;
    }
}

/// Expand `~` and anchor relative paths at `root`.
pub fn resolve_path(path: &Path, root: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    let expanded = PathBuf::from(shellexpand::tilde(&raw).into_owned());
    if expanded.is_relative() {
        root.join(expanded)
    } else {
        expanded
    }
}

// ============================================================================
// tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_find_config_walks_upward() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a/b/c");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join("vitae.toml"), "").unwrap();

        let found = find_config_file(Path::new("vitae.toml"), &nested).unwrap();
        assert_eq!(found, dir.path().join("vitae.toml"));
    }

    #[test]
    fn test_find_config_absent() {
        let dir = TempDir::new().unwrap();
        assert_eq!(
            find_config_file(Path::new("vitae-missing.toml"), dir.path()),
            None
        );
    }

    #[test]
    fn test_resolve_path() {
        let root = Path::new("/srv/vitae");
        assert_eq!(
            resolve_path(Path::new("data"), root),
            PathBuf::from("/srv/vitae/data")
        );
        assert_eq!(
            resolve_path(Path::new("/var/lib/vitae"), root),
            PathBuf::from("/var/lib/vitae")
        );
        assert!(!resolve_path(Path::new("~/docs"), root).starts_with("~"));
    }
}
