//! Finder over the optional fallback storage.

use std::path::PathBuf;

use crate::config::{ConfigError, StaticConfig};
use crate::storage::FileSystemStorage;

/// Answers lookups from a single extra storage location, typically one that
/// holds files produced at runtime rather than checked-in assets.
pub struct FallbackFinder {
    storage: FileSystemStorage,
}

impl FallbackFinder {
    pub fn new(storage: FileSystemStorage) -> Self {
        Self { storage }
    }

    pub fn from_config(config: &StaticConfig) -> Result<Self, ConfigError> {
        let path = config.fallback.path.as_ref().ok_or_else(|| {
            ConfigError::Validation(
                "`fallback` is listed in `collect.finders` but `fallback.path` is not set"
                    .to_string(),
            )
        })?;
        Ok(Self::new(FileSystemStorage::new(
            path,
            &config.fallback.url,
        )))
    }

    pub fn find(&self, path: &str) -> Option<PathBuf> {
        self.storage
            .exists(path)
            .then(|| self.storage.path(path))
    }
}
