//! Recursive storage enumeration.
//!
//! Walks a storage root depth-first, yielding forward-slash logical paths
//! for every file that does not match the ignore patterns. A matching
//! directory prunes its entire subtree.

use anyhow::Result;

use crate::ignore::matches_patterns;
use crate::storage::FileSystemStorage;
use crate::utils::path::logical_join;

/// List every collectable file under a storage root.
///
/// Each call is independent; no state is shared between walks.
pub fn walk(storage: &FileSystemStorage, ignore_patterns: &[String]) -> Result<Vec<String>> {
    let mut files = Vec::new();
    walk_location(storage, ignore_patterns, "", &mut files)?;
    Ok(files)
}

fn walk_location(
    storage: &FileSystemStorage,
    ignore_patterns: &[String],
    location: &str,
    out: &mut Vec<String>,
) -> Result<()> {
    let (directories, files) = storage.listdir(location)?;
    for name in files {
        let path = logical_join(location, &name);
        if !matches_patterns(&path, ignore_patterns) {
            out.push(path);
        }
    }
    for dir in directories {
        let path = logical_join(location, &dir);
        if matches_patterns(&path, ignore_patterns) {
            continue;
        }
        walk_location(storage, ignore_patterns, &path, out)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ignore::effective_patterns;
    use std::fs;
    use tempfile::TempDir;

    fn storage_with_tree(dir: &TempDir) -> FileSystemStorage {
        fs::create_dir_all(dir.path().join("css/vendor")).unwrap();
        fs::create_dir_all(dir.path().join("CVS")).unwrap();
        fs::write(dir.path().join("robots.txt"), "").unwrap();
        fs::write(dir.path().join("css/app.css"), "").unwrap();
        fs::write(dir.path().join("css/app.css~"), "").unwrap();
        fs::write(dir.path().join("css/vendor/grid.css"), "").unwrap();
        fs::write(dir.path().join("CVS/entries"), "").unwrap();
        fs::write(dir.path().join(".hidden"), "").unwrap();
        FileSystemStorage::new(dir.path(), "/static/")
    }

    #[test]
    fn test_walk_yields_logical_paths() {
        let dir = TempDir::new().unwrap();
        let storage = storage_with_tree(&dir);

        let files = walk(&storage, &[]).unwrap();
        assert!(files.contains(&"css/app.css".to_string()));
        assert!(files.contains(&"css/vendor/grid.css".to_string()));
        assert!(files.contains(&"CVS/entries".to_string()));
    }

    #[test]
    fn test_walk_honors_default_ignores() {
        let dir = TempDir::new().unwrap();
        let storage = storage_with_tree(&dir);
        let patterns = effective_patterns(true, &[], &[]);

        let files = walk(&storage, &patterns).unwrap();
        assert!(files.contains(&"robots.txt".to_string()));
        assert!(files.contains(&"css/app.css".to_string()));
        // Ignored file, ignored directory subtree, hidden file
        assert!(!files.iter().any(|f| f.ends_with('~')));
        assert!(!files.iter().any(|f| f.starts_with("CVS")));
        assert!(!files.contains(&".hidden".to_string()));
    }

    #[test]
    fn test_walk_prunes_matching_subtree() {
        let dir = TempDir::new().unwrap();
        let storage = storage_with_tree(&dir);

        let files = walk(&storage, &["vendor".to_string()]).unwrap();
        assert!(files.contains(&"css/app.css".to_string()));
        assert!(!files.iter().any(|f| f.contains("vendor")));
    }

    #[test]
    fn test_walk_restartable() {
        let dir = TempDir::new().unwrap();
        let storage = storage_with_tree(&dir);

        let first = walk(&storage, &[]).unwrap();
        let second = walk(&storage, &[]).unwrap();
        assert_eq!(first, second);
    }
}
