//! Project configuration management for `statica.toml`.
//!
//! # Sections
//!
//! | Section      | Purpose                                          |
//! |--------------|--------------------------------------------------|
//! | `[collect]`  | Destination root, URL prefix, storage, finders   |
//! | `[sources]`  | Extra static directories (ordered, prefixable)   |
//! | `[bundles]`  | App bundles (paths, exclusion, labels)           |
//! | `[fallback]` | Optional fallback storage                        |
//! | `[ignore]`   | Ignore patterns                                  |
//! | `[serve]`    | Development server (interface, port, insecure)   |

pub mod error;
pub mod section;

pub use error::{ConfigDiagnostics, ConfigError};
pub use section::{
    BundlesConfig, CollectConfig, FallbackConfig, IgnoreConfig, KNOWN_FINDERS, ServeConfig,
    SourceDir, SourcesConfig, StorageKind,
};

use crate::cli::{Cli, Commands};
use crate::log;
use anyhow::Result;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing statica.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticConfig {
    /// CLI arguments reference (internal use only)
    #[serde(skip)]
    pub cli: Option<&'static Cli>,

    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root directory - parent of config file (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    /// Collection destination settings
    #[serde(default)]
    pub collect: CollectConfig,

    /// Extra static directories
    #[serde(default)]
    pub sources: SourcesConfig,

    /// App bundle settings
    #[serde(default)]
    pub bundles: BundlesConfig,

    /// Fallback storage settings
    #[serde(default)]
    pub fallback: FallbackConfig,

    /// Ignore pattern settings
    #[serde(default)]
    pub ignore: IgnoreConfig,

    /// Development server settings
    #[serde(default)]
    pub serve: ServeConfig,
}

impl Default for StaticConfig {
    fn default() -> Self {
        Self {
            cli: None,
            config_path: PathBuf::new(),
            root: PathBuf::new(),
            collect: CollectConfig::default(),
            sources: SourcesConfig::default(),
            bundles: BundlesConfig::default(),
            fallback: FallbackConfig::default(),
            ignore: IgnoreConfig::default(),
            serve: ServeConfig::default(),
        }
    }
}

impl StaticConfig {
    /// Load configuration from CLI arguments.
    ///
    /// Searches upward from cwd to find the config file; the project root
    /// is the config file's parent directory.
    pub fn load(cli: &'static Cli) -> Result<Self> {
        let config_path = match find_config_file(&cli.config) {
            Some(path) => path,
            None => {
                log!(
                    "error";
                    "Config file '{}' not found in the current directory or any parent.",
                    cli.config.display()
                );
                std::process::exit(1);
            }
        };

        let mut config = Self::from_path(&config_path)?;

        // Validate raw paths before normalization makes everything absolute
        config.validate_paths()?;

        config.config_path = config_path;
        config.cli = Some(cli);
        config.finalize(cli);

        config.validate()?;

        Ok(config)
    }

    /// Finalize configuration after loading.
    fn finalize(&mut self, cli: &Cli) {
        let root = self
            .config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        self.root = crate::utils::path::normalize_path(&root);
        self.normalize_paths();
        self.apply_command_options(cli);
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }
        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>)> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })
        .map_err(ConfigError::Toml)?;
        Ok((config, ignored))
    }

    /// Print warning about unknown fields.
    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring:", display_path);
        for field in fields {
            eprintln!("- {field}");
        }
    }

    // ========================================================================
    // cli configuration updates
    // ========================================================================

    /// Apply command-specific configuration options.
    fn apply_command_options(&mut self, cli: &Cli) {
        if let Commands::Serve {
            interface,
            port,
            insecure,
        } = &cli.command
        {
            Self::update_option(&mut self.serve.interface, interface.as_ref());
            Self::update_option(&mut self.serve.port, port.as_ref());
            if *insecure {
                self.serve.insecure = true;
            }
        }
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    // ========================================================================
    // path normalization
    // ========================================================================

    /// Normalize all configured paths to absolute paths under the root.
    fn normalize_paths(&mut self) {
        let root = self.root.clone();
        self.config_path = crate::utils::path::normalize_path(&self.config_path);

        if !self.collect.root.as_os_str().is_empty() {
            self.collect.root =
                crate::utils::path::normalize_path(&root.join(&self.collect.root));
        }
        for dir in &mut self.sources.dirs {
            dir.path = crate::utils::path::normalize_path(&root.join(&dir.path));
        }
        for path in &mut self.bundles.paths {
            *path = crate::utils::path::normalize_path(&root.join(&*path));
        }
        if let Some(path) = self.fallback.path.take() {
            self.fallback.path = Some(crate::utils::path::normalize_path(&root.join(path)));
        }
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Pre-validate paths before normalization.
    ///
    /// Must run before `finalize()`: normalization converts relative paths
    /// to absolute ones, hiding whether the user wrote an absolute path.
    fn validate_paths(&self) -> Result<()> {
        let mut diag = ConfigDiagnostics::new();
        for (i, dir) in self.sources.dirs.iter().enumerate() {
            if dir.path.is_absolute() {
                diag.error_with_hint(
                    format!("sources.dirs[{i}].path"),
                    "path must be relative to the project root",
                    "write the path relative to the directory holding statica.toml",
                );
            }
        }
        diag.into_result()
            .map_err(|e| ConfigError::Diagnostics(e).into())
    }

    /// Validate configuration for the current command.
    ///
    /// Collects all validation errors and returns them at once.
    pub fn validate(&self) -> Result<()> {
        let mut diag = ConfigDiagnostics::new();

        let needs_destination = matches!(
            self.cli.map(|cli| &cli.command),
            Some(Commands::Collect { .. } | Commands::Serve { .. })
        );
        if needs_destination {
            if self.collect.root.as_os_str().is_empty() {
                diag.error_with_hint(
                    "collect.root",
                    "destination directory is required",
                    "set `root = \"public\"` under `[collect]`",
                );
            }
            if self.collect.url.trim().is_empty() {
                diag.error("collect.url", "public URL prefix is required");
            }
        }

        for selector in &self.collect.finders {
            if !KNOWN_FINDERS.contains(&selector.as_str()) {
                diag.error_with_hint(
                    "collect.finders",
                    format!("unknown finder `{selector}`"),
                    format!("expected one of: {}", KNOWN_FINDERS.join(", ")),
                );
            }
        }
        if self.collect.finders.iter().any(|s| s == "fallback") && self.fallback.path.is_none() {
            diag.error(
                "fallback.path",
                "`fallback` is listed in `collect.finders` but no path is set",
            );
        }

        if !self.collect.root.as_os_str().is_empty() {
            for (i, dir) in self.sources.dirs.iter().enumerate() {
                if dir.path == self.collect.root {
                    diag.error(
                        format!("sources.dirs[{i}].path"),
                        "must not be the same directory as `collect.root`",
                    );
                }
            }
            if self.fallback.path.as_deref() == Some(self.collect.root.as_path()) {
                diag.error(
                    "fallback.path",
                    "must not be the same directory as `collect.root`",
                );
            }
        }

        let mut seen = FxHashSet::default();
        for path in &self.bundles.paths {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            if !seen.insert(name.clone()) {
                diag.error("bundles.paths", format!("duplicate bundle name `{name}`"));
            }
        }

        diag.into_result()
            .map_err(|e| ConfigError::Diagnostics(e).into())
    }
}

/// Find config file by searching upward from the current directory.
fn find_config_file(config_name: &Path) -> Option<PathBuf> {
    if config_name.is_absolute() && config_name.exists() {
        return Some(config_name.to_path_buf());
    }

    let cwd = std::env::current_dir().ok()?;
    let mut current = cwd.as_path();
    loop {
        let candidate = current.join(config_name);
        if candidate.exists() {
            return Some(candidate);
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => return None,
        }
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse a config snippet.
/// Panics if there are unknown fields (to catch config typos in tests).
#[cfg(test)]
pub fn test_parse_config(extra: &str) -> StaticConfig {
    let (parsed, ignored) = StaticConfig::parse_with_ignored(extra).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================
