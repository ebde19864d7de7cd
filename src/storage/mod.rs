//! Storage abstractions for static file sources and destinations.
//!
//! `FileSystemStorage` is the single concrete storage: a local directory
//! with an optional public URL prefix. The destination of a collection run
//! is selected by configuration as either a plain storage or the
//! cache-busting [`HashedStorage`] decorator.

mod cache;
mod hashed;

pub use cache::HashCache;
pub use hashed::{HashedStorage, PostProcessed};

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::config::{StaticConfig, StorageKind};

// ============================================================================
// FileSystemStorage
// ============================================================================

/// A local directory exposed through logical paths.
///
/// Owns path joining, existence checks, read/write/delete and URL building
/// for one storage root. One instance per source or destination location.
#[derive(Debug, Clone)]
pub struct FileSystemStorage {
    location: PathBuf,
    base_url: String,
}

impl FileSystemStorage {
    pub fn new(location: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            base_url: base_url.into(),
        }
    }

    /// Storage root on disk.
    pub fn location(&self) -> &Path {
        &self.location
    }

    /// Absolute filesystem path for a logical path.
    pub fn path(&self, name: &str) -> PathBuf {
        let mut path = self.location.clone();
        for seg in name.split('/').filter(|s| !s.is_empty()) {
            path.push(seg);
        }
        path
    }

    pub fn exists(&self, name: &str) -> bool {
        self.path(name).exists()
    }

    /// Read the full contents of a stored file.
    pub fn open(&self, name: &str) -> Result<Vec<u8>> {
        let path = self.path(name);
        fs::read(&path).with_context(|| format!("failed to read `{}`", path.display()))
    }

    /// Write contents under a logical path, creating parent directories.
    pub fn save(&self, name: &str, content: &[u8]) -> Result<()> {
        let path = self.path(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content).with_context(|| format!("failed to write `{}`", path.display()))
    }

    /// Copy a source file under a logical path, preserving its mtime.
    pub fn copy_from(&self, name: &str, source: &Path) -> Result<()> {
        let dest = self.path(name);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(source, &dest)
            .with_context(|| format!("failed to copy `{}`", source.display()))?;
        if let Ok(modified) = fs::metadata(source).and_then(|m| m.modified()) {
            let times = fs::FileTimes::new().set_modified(modified);
            if let Ok(file) = fs::File::options().write(true).open(&dest) {
                file.set_times(times).ok();
            }
        }
        Ok(())
    }

    pub fn delete(&self, name: &str) -> Result<()> {
        let path = self.path(name);
        fs::remove_file(&path).with_context(|| format!("failed to delete `{}`", path.display()))
    }

    /// List one directory level, returning (directories, files) by name.
    pub fn listdir(&self, location: &str) -> Result<(Vec<String>, Vec<String>)> {
        let dir = if location.is_empty() {
            self.location.clone()
        } else {
            self.path(location)
        };
        let mut directories = Vec::new();
        let mut files = Vec::new();
        for entry in fs::read_dir(&dir)
            .with_context(|| format!("failed to list `{}`", dir.display()))?
        {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if entry.file_type()?.is_dir() {
                directories.push(name);
            } else {
                files.push(name);
            }
        }
        // Deterministic traversal order regardless of filesystem
        directories.sort();
        files.sort();
        Ok((directories, files))
    }

    /// Public URL for a logical path.
    pub fn url(&self, name: &str) -> String {
        let prefix = self.base_url.trim_end_matches('/');
        format!("{prefix}/{name}")
    }
}

// ============================================================================
// DestinationStorage
// ============================================================================

/// The write target of a collection run.
///
/// Closed set of storage variants selected by `collect.storage`.
pub enum DestinationStorage {
    Plain(FileSystemStorage),
    Hashed(HashedStorage),
}

impl DestinationStorage {
    /// Build the configured destination storage.
    ///
    /// `debug` controls whether the hashed variant's `url` returns plain
    /// URLs (development serving) or hashed ones.
    pub fn from_config(config: &StaticConfig, debug: bool) -> Result<Self> {
        let base = FileSystemStorage::new(&config.collect.root, &config.collect.url);
        match config.collect.storage {
            StorageKind::Plain => Ok(Self::Plain(base)),
            StorageKind::Hashed => Ok(Self::Hashed(HashedStorage::new(base, debug)?)),
        }
    }

    /// The underlying filesystem storage.
    pub fn base(&self) -> &FileSystemStorage {
        match self {
            Self::Plain(base) => base,
            Self::Hashed(hashed) => hashed.base(),
        }
    }

    /// Run the post-processing pass over collected paths.
    ///
    /// A plain destination has nothing to do.
    pub fn post_process(&self, paths: &[String], dry_run: bool) -> Result<Vec<PostProcessed>> {
        match self {
            Self::Plain(_) => Ok(Vec::new()),
            Self::Hashed(hashed) => hashed.post_process(paths, dry_run),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_path_joins_logical_segments() {
        let storage = FileSystemStorage::new("/srv/static", "/static/");
        assert_eq!(
            storage.path("css/app.css"),
            PathBuf::from("/srv/static/css/app.css")
        );
    }

    #[test]
    fn test_save_open_delete_roundtrip() {
        let dir = TempDir::new().unwrap();
        let storage = FileSystemStorage::new(dir.path(), "/static/");

        storage.save("css/app.css", b"body {}").unwrap();
        assert!(storage.exists("css/app.css"));
        assert_eq!(storage.open("css/app.css").unwrap(), b"body {}");

        storage.delete("css/app.css").unwrap();
        assert!(!storage.exists("css/app.css"));
    }

    #[test]
    fn test_copy_from_preserves_mtime() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("src.txt");
        std::fs::write(&source, "data").unwrap();
        let src_mtime = std::fs::metadata(&source).unwrap().modified().unwrap();

        let storage = FileSystemStorage::new(dir.path().join("out"), "/static/");
        storage.copy_from("sub/src.txt", &source).unwrap();

        let dest_mtime = std::fs::metadata(storage.path("sub/src.txt"))
            .unwrap()
            .modified()
            .unwrap();
        assert_eq!(src_mtime, dest_mtime);
    }

    #[test]
    fn test_listdir_split() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("css")).unwrap();
        std::fs::write(dir.path().join("robots.txt"), "").unwrap();

        let storage = FileSystemStorage::new(dir.path(), "/static/");
        let (dirs, files) = storage.listdir("").unwrap();
        assert_eq!(dirs, vec!["css"]);
        assert_eq!(files, vec!["robots.txt"]);
    }

    #[test]
    fn test_url_prefix() {
        let storage = FileSystemStorage::new("/srv/static", "/static/");
        assert_eq!(storage.url("css/app.css"), "/static/css/app.css");
    }
}
