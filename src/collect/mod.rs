//! Collection of static files into the destination storage.
//!
//! The collector drives enumeration across every configured source in
//! precedence order: extra directories first, then app bundles, while
//! excluded bundles are enumerated without copying so that collisions
//! against them can be flagged. The first writer of a logical path wins;
//! later providers are recorded as duplicates.

use std::fs;
use std::path::Path;

use anyhow::{Result, bail};
use rustc_hash::FxHashSet;

use crate::config::StaticConfig;
use crate::finder::{Bundle, DirectoryFinder, bundles_from_config};
use crate::storage::{DestinationStorage, FileSystemStorage, PostProcessed};
use crate::walk::walk;
use crate::{debug, log};

/// What happened to one logical path during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Copied,
    Linked,
    SkippedDuplicate,
    SkippedExcluded,
}

/// Collection run options, resolved from config and CLI flags.
#[derive(Debug, Default, Clone)]
pub struct CollectOptions {
    /// Report everything but mutate nothing.
    pub dry_run: bool,
    /// Symlink sources instead of copying them.
    pub link: bool,
    /// Leave the extra-directory sources out of this run.
    pub skip_dirs: bool,
    /// Effective ignore patterns (defaults plus config plus CLI).
    pub ignore_patterns: Vec<String>,
}

/// Outcome of a collection run.
#[derive(Debug, Default)]
pub struct CollectReport {
    /// Per-path actions, in processing order.
    pub files: Vec<(String, Action)>,
    pub copied: usize,
    pub linked: usize,
    /// Post-processing results from a hashed destination.
    pub post_processed: Vec<PostProcessed>,
}

impl CollectReport {
    /// Number of files that landed in the destination.
    pub fn collected(&self) -> usize {
        self.copied + self.linked
    }

    /// Number of hashed objects written this run.
    pub fn rewritten(&self) -> usize {
        self.post_processed.iter().filter(|p| p.processed).count()
    }
}

/// Drives one collection run against a destination.
pub struct Collector<'a> {
    config: &'a StaticConfig,
    destination: &'a DestinationStorage,
    options: CollectOptions,
}

impl<'a> Collector<'a> {
    pub fn new(
        config: &'a StaticConfig,
        destination: &'a DestinationStorage,
        options: CollectOptions,
    ) -> Self {
        Self {
            config,
            destination,
            options,
        }
    }

    /// Run the full collection pass.
    ///
    /// Capability errors (link mode on an unsupported platform) fail
    /// before any file is touched. Collisions are warnings; the run
    /// continues.
    pub fn collect(&self) -> Result<CollectReport> {
        if self.options.link && !cfg!(unix) {
            bail!("symlinking is not supported on this platform");
        }

        let dest = self.destination.base();
        // The destination may not exist yet; treat that as empty
        let existing: FxHashSet<String> = walk(dest, &[]).unwrap_or_default().into_iter().collect();

        let patterns = &self.options.ignore_patterns;
        let (included, excluded) = bundles_from_config(self.config);

        // Excluded bundles are enumerated first so later writes can be
        // flagged as collisions against them
        let mut excluded_files = FxHashSet::default();
        let mut excluded_records = Vec::new();
        for bundle in &excluded {
            for storage in bundle.storages() {
                for rel in walk(&storage, patterns)? {
                    let logical = bundle_logical(bundle, &rel);
                    if excluded_files.insert(logical.clone()) {
                        excluded_records.push(logical);
                    }
                }
            }
        }

        let mut report = CollectReport::default();
        let mut written = FxHashSet::default();
        let mut collected_paths = Vec::new();

        if !self.options.skip_dirs {
            for (prefix, root) in DirectoryFinder::from_config(self.config).locations() {
                let storage = FileSystemStorage::new(root, "");
                for rel in walk(&storage, patterns)? {
                    let logical = if prefix.is_empty() {
                        rel.clone()
                    } else {
                        format!("{}/{rel}", prefix.trim_end_matches('/'))
                    };
                    self.stage(
                        &logical,
                        &storage.path(&rel),
                        &existing,
                        &excluded_files,
                        &mut written,
                        &mut collected_paths,
                        &mut report,
                    )?;
                }
            }
        }

        for bundle in &included {
            for storage in bundle.storages() {
                for rel in walk(&storage, patterns)? {
                    let logical = bundle_logical(bundle, &rel);
                    self.stage(
                        &logical,
                        &storage.path(&rel),
                        &existing,
                        &excluded_files,
                        &mut written,
                        &mut collected_paths,
                        &mut report,
                    )?;
                }
            }
        }

        for logical in excluded_records {
            report.files.push((logical, Action::SkippedExcluded));
        }

        report.post_processed = self
            .destination
            .post_process(&collected_paths, self.options.dry_run)?;

        Ok(report)
    }

    /// Write one staged file into the destination.
    #[allow(clippy::too_many_arguments)]
    fn stage(
        &self,
        logical: &str,
        source: &Path,
        existing: &FxHashSet<String>,
        excluded_files: &FxHashSet<String>,
        written: &mut FxHashSet<String>,
        collected_paths: &mut Vec<String>,
        report: &mut CollectReport,
    ) -> Result<()> {
        if !written.insert(logical.to_string()) {
            log!("warning"; "skipping duplicate file: {logical}");
            report.files.push((logical.to_string(), Action::SkippedDuplicate));
            return Ok(());
        }
        if excluded_files.contains(logical) {
            log!(
                "warning";
                "copying file that an excluded bundle would normally provide: {logical}"
            );
        }

        let dest = self.destination.base();
        if existing.contains(logical) {
            if self.options.dry_run {
                debug!("collect"; "pretending to delete {logical}");
            } else {
                debug!("collect"; "deleting {logical}");
                dest.delete(logical)?;
            }
        }

        let action = if self.options.link {
            if self.options.dry_run {
                debug!("collect"; "pretending to symlink {} to {logical}", source.display());
            } else {
                debug!("collect"; "symlinking {} to {logical}", source.display());
                let dest_path = dest.path(logical);
                if let Some(parent) = dest_path.parent() {
                    fs::create_dir_all(parent)?;
                }
                symlink_file(source, &dest_path)?;
            }
            report.linked += 1;
            Action::Linked
        } else {
            if self.options.dry_run {
                debug!("collect"; "pretending to copy {} to {logical}", source.display());
            } else {
                debug!("collect"; "copying {} to {logical}", source.display());
                dest.copy_from(logical, source)?;
            }
            report.copied += 1;
            Action::Copied
        };

        report.files.push((logical.to_string(), action));
        collected_paths.push(logical.to_string());
        Ok(())
    }
}

fn bundle_logical(bundle: &Bundle, rel: &str) -> String {
    if bundle.prepend_label() {
        format!("{}/{rel}", bundle.name())
    } else {
        rel.to_string()
    }
}

#[cfg(unix)]
fn symlink_file(source: &Path, dest: &Path) -> Result<()> {
    std::os::unix::fs::symlink(source, dest)
        .map_err(|err| anyhow::anyhow!("failed to symlink `{}`: {err}", dest.display()))
}

#[cfg(not(unix))]
fn symlink_file(_source: &Path, _dest: &Path) -> Result<()> {
    bail!("symlinking is not supported on this platform")
}
