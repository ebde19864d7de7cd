//! Finder over registered app bundles.

use std::path::{Path, PathBuf};

use crate::config::StaticConfig;
use crate::storage::FileSystemStorage;

/// One registered bundle: a named root with candidate static sub-directories.
///
/// With `prepend_label` set, the bundle's assets live under its own name in
/// the logical namespace (`polls/poll.css` instead of `poll.css`).
pub struct Bundle {
    name: String,
    root: PathBuf,
    source_dirs: Vec<String>,
    prepend_label: bool,
}

impl Bundle {
    pub fn new(
        name: impl Into<String>,
        root: impl Into<PathBuf>,
        source_dirs: Vec<String>,
        prepend_label: bool,
    ) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
            source_dirs,
            prepend_label,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn prepend_label(&self) -> bool {
        self.prepend_label
    }

    /// Storages for the candidate source directories that exist on disk,
    /// in candidate order.
    pub fn storages(&self) -> Vec<FileSystemStorage> {
        self.source_dirs
            .iter()
            .map(|dir| self.root.join(dir))
            .filter(|path| path.is_dir())
            .map(|path| FileSystemStorage::new(path, ""))
            .collect()
    }

    /// Locate a logical path inside this bundle.
    ///
    /// With `all` set, every candidate source directory holding the file
    /// contributes a match, in candidate order; otherwise the first
    /// candidate wins.
    pub fn find(&self, path: &str, all: bool) -> Vec<PathBuf> {
        let rel = if self.prepend_label {
            match path.strip_prefix(&format!("{}/", self.name)) {
                Some(rel) => rel,
                None => return Vec::new(),
            }
        } else {
            path
        };
        let mut matches = Vec::new();
        for storage in self.storages() {
            if storage.exists(rel) {
                matches.push(storage.path(rel));
                if !all {
                    break;
                }
            }
        }
        matches
    }
}

/// Build `(included, excluded)` bundle lists from configuration.
///
/// A bundle's name is the basename of its configured path. Excluded bundles
/// are kept separately so collection can report their files; they are never
/// handed to the finder.
pub fn bundles_from_config(config: &StaticConfig) -> (Vec<Bundle>, Vec<Bundle>) {
    let mut included = Vec::new();
    let mut excluded = Vec::new();
    for path in &config.bundles.paths {
        let name = bundle_name(path);
        let bundle = Bundle::new(
            name.clone(),
            path,
            config.bundles.source_dirs.clone(),
            config.bundles.prepend_label.contains(&name),
        );
        if config.bundles.exclude.contains(&name) {
            excluded.push(bundle);
        } else {
            included.push(bundle);
        }
    }
    (included, excluded)
}

fn bundle_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Searches registered bundles in registration order.
///
/// Excluded bundles are invisible here by construction.
pub struct BundleFinder {
    bundles: Vec<Bundle>,
}

impl BundleFinder {
    pub fn new(bundles: Vec<Bundle>) -> Self {
        Self { bundles }
    }

    pub fn from_config(config: &StaticConfig) -> Self {
        let (included, _) = bundles_from_config(config);
        Self::new(included)
    }

    pub fn find(&self, path: &str, all: bool) -> Vec<PathBuf> {
        let mut matches = Vec::new();
        for bundle in &self.bundles {
            matches.extend(bundle.find(path, all));
            if !all && !matches.is_empty() {
                break;
            }
        }
        matches
    }
}
