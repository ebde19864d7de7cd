//! Configuration section definitions for `statica.toml`.
//!
//! # Example
//!
//! ```toml
//! [collect]
//! root = "public"
//! url = "/static/"
//! storage = "hashed"
//! finders = ["directories", "bundles"]
//!
//! [[sources.dirs]]
//! path = "docs"
//!
//! [bundles]
//! paths = ["apps/polls"]
//!
//! [serve]
//! interface = "127.0.0.1"
//! port = 8077
//! ```

use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Known finder selector strings, in documentation order.
pub const KNOWN_FINDERS: &[&str] = &["directories", "bundles", "fallback"];

// ============================================================================
// [collect]
// ============================================================================

/// Destination storage kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    /// Files are copied as-is.
    #[default]
    Plain,
    /// Files additionally get content-hashed names with rewritten
    /// stylesheet references.
    Hashed,
}

/// Collection destination settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectConfig {
    /// Destination directory. Required for collect and serve.
    pub root: PathBuf,

    /// Public URL prefix served from the destination.
    pub url: String,

    /// Destination storage kind.
    pub storage: StorageKind,

    /// Ordered finder selectors.
    pub finders: Vec<String>,
}

impl Default for CollectConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::new(),
            url: "/static/".to_string(),
            storage: StorageKind::default(),
            finders: vec!["directories".to_string(), "bundles".to_string()],
        }
    }
}

// ============================================================================
// [sources]
// ============================================================================

/// One extra static directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceDir {
    /// Directory path, relative to the project root.
    pub path: PathBuf,

    /// Destination prefix. Empty means the directory's files land at the
    /// top of the logical namespace.
    #[serde(default)]
    pub prefix: String,
}

/// Extra static directory settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// Ordered list of extra locations; order is lookup precedence.
    pub dirs: Vec<SourceDir>,
}

// ============================================================================
// [bundles]
// ============================================================================

/// App bundle settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BundlesConfig {
    /// Ordered bundle roots; a bundle's name is its basename.
    pub paths: Vec<PathBuf>,

    /// Bundle names excluded from lookups and collection.
    pub exclude: Vec<String>,

    /// Candidate static sub-directory names inside each bundle.
    pub source_dirs: Vec<String>,

    /// Bundles whose own name prefixes their logical paths.
    pub prepend_label: Vec<String>,
}

impl Default for BundlesConfig {
    fn default() -> Self {
        Self {
            paths: Vec::new(),
            exclude: Vec::new(),
            source_dirs: vec!["static".to_string()],
            prepend_label: Vec::new(),
        }
    }
}

// ============================================================================
// [fallback]
// ============================================================================

/// Optional fallback storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackConfig {
    /// Fallback storage location. Unset disables the fallback finder.
    pub path: Option<PathBuf>,

    /// Public URL prefix of the fallback storage.
    pub url: String,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            path: None,
            url: "/media/".to_string(),
        }
    }
}

// ============================================================================
// [ignore]
// ============================================================================

/// Ignore pattern settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IgnoreConfig {
    /// Apply the built-in defaults (`CVS`, `.*`, `*~`).
    pub defaults: bool,

    /// Additional patterns, appended after the defaults.
    pub patterns: Vec<String>,
}

impl Default for IgnoreConfig {
    fn default() -> Self {
        Self {
            defaults: true,
            patterns: Vec::new(),
        }
    }
}

// ============================================================================
// [serve]
// ============================================================================

/// Development server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    /// Network interface to bind.
    /// - `127.0.0.1` (default): localhost only
    /// - `0.0.0.0`: all interfaces (LAN accessible)
    pub interface: IpAddr,

    /// HTTP port number.
    pub port: u16,

    /// Allow serving from a release build. The server refuses to start
    /// outside debug builds unless this is set.
    pub insecure: bool,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            interface: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
            port: 8077,
            insecure: false,
        }
    }
}
