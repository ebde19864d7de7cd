//! Finder over configured extra static directories.

use std::path::{Path, PathBuf};

use crate::config::StaticConfig;
use crate::storage::FileSystemStorage;

/// Searches an ordered list of `(prefix, root)` locations.
///
/// A location with a prefix only answers logical paths under that prefix;
/// the prefix is stripped before joining onto the root.
pub struct DirectoryFinder {
    locations: Vec<(String, PathBuf)>,
}

impl DirectoryFinder {
    pub fn new(locations: Vec<(String, PathBuf)>) -> Self {
        Self { locations }
    }

    pub fn from_config(config: &StaticConfig) -> Self {
        let locations = config
            .sources
            .dirs
            .iter()
            .map(|dir| (dir.prefix.clone(), dir.path.clone()))
            .collect();
        Self::new(locations)
    }

    /// The configured locations, in precedence order.
    pub fn locations(&self) -> &[(String, PathBuf)] {
        &self.locations
    }

    pub fn find(&self, path: &str, all: bool) -> Vec<PathBuf> {
        let mut matches = Vec::new();
        for (prefix, root) in &self.locations {
            if let Some(found) = find_in_location(prefix, root, path) {
                matches.push(found);
                if !all {
                    break;
                }
            }
        }
        matches
    }
}

fn find_in_location(prefix: &str, root: &Path, path: &str) -> Option<PathBuf> {
    let rel = if prefix.is_empty() {
        path
    } else {
        let qualified = format!("{}/", prefix.trim_end_matches('/'));
        path.strip_prefix(&qualified)?
    };
    let storage = FileSystemStorage::new(root, "");
    storage.exists(rel).then(|| storage.path(rel))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_precedence_between_locations() {
        let dir = TempDir::new().unwrap();
        for (loc, content) in [("first", "1"), ("second", "2")] {
            fs::create_dir_all(dir.path().join(loc)).unwrap();
            fs::write(dir.path().join(loc).join("app.css"), content).unwrap();
        }

        let finder = DirectoryFinder::new(vec![
            (String::new(), dir.path().join("first")),
            (String::new(), dir.path().join("second")),
        ]);

        let first_only = finder.find("app.css", false);
        assert_eq!(first_only.len(), 1);
        assert_eq!(fs::read_to_string(&first_only[0]).unwrap(), "1");

        let all = finder.find("app.css", true);
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_prefixed_location() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("docs")).unwrap();
        fs::write(dir.path().join("docs/index.html"), "").unwrap();

        let finder = DirectoryFinder::new(vec![(
            "docs".to_string(),
            dir.path().join("docs"),
        )]);

        // Only the prefixed logical path resolves
        assert_eq!(finder.find("docs/index.html", false).len(), 1);
        assert!(finder.find("index.html", false).is_empty());
    }
}
