//! Persistent mapping from original to hashed logical paths.
//!
//! The cache is an opaque key→string store keyed by
//! `statica:hash:<logical path>`. It is the only state that outlives a
//! collection run and is persisted as JSON inside the destination root.
//! There is no eviction: entries live until the next run invalidates them.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

/// Cache file name inside the destination root.
pub const CACHE_FILE: &str = ".statica-hashes.json";

const KEY_PREFIX: &str = "statica:hash:";

/// File-backed hash cache.
///
/// Not protected against concurrent collection runs; last writer wins.
pub struct HashCache {
    path: PathBuf,
    entries: Mutex<FxHashMap<String, String>>,
}

impl HashCache {
    /// Load the cache from the destination root.
    ///
    /// A missing or unreadable cache file yields an empty cache.
    pub fn load(destination_root: &Path) -> Self {
        let path = destination_root.join(CACHE_FILE);
        let entries = std::fs::read(&path)
            .ok()
            .and_then(|bytes| serde_json::from_slice(&bytes).ok())
            .unwrap_or_default();
        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    fn key(name: &str) -> String {
        format!("{KEY_PREFIX}{name}")
    }

    /// Look up the hashed path for an original logical path.
    pub fn get(&self, name: &str) -> Option<String> {
        self.entries.lock().get(&Self::key(name)).cloned()
    }

    /// Record the hashed path for an original logical path (in memory).
    pub fn set(&self, name: &str, hashed: &str) {
        self.entries
            .lock()
            .insert(Self::key(name), hashed.to_string());
    }

    /// Drop entries for every path about to be reprocessed.
    ///
    /// Persisted immediately so a concurrent reader observes a miss rather
    /// than a stale hashed URL.
    pub fn delete_many(&self, names: &[String]) -> Result<()> {
        {
            let mut entries = self.entries.lock();
            for name in names {
                entries.remove(&Self::key(name));
            }
        }
        self.persist()
    }

    /// Write the cache file.
    pub fn persist(&self) -> Result<()> {
        let entries = self.entries.lock();
        let json = serde_json::to_vec_pretty(&*entries)?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, json)
            .with_context(|| format!("failed to write `{}`", self.path.display()))
    }
}
