//! Static file finders.
//!
//! A finder locates the source file behind a logical path. The chain is a
//! closed set of variants selected by the ordered `collect.finders` config
//! list; an unknown selector is a configuration error at construction time,
//! never a lookup-time surprise.

mod bundle;
mod directory;
mod fallback;

pub use bundle::{Bundle, BundleFinder, bundles_from_config};
pub use directory::DirectoryFinder;
pub use fallback::FallbackFinder;

use std::path::PathBuf;

use crate::config::{ConfigError, StaticConfig};

/// One finder in the chain.
pub enum Finder {
    Directories(DirectoryFinder),
    Bundles(BundleFinder),
    Fallback(FallbackFinder),
}

impl Finder {
    /// All source paths this finder has for a logical path, in precedence
    /// order. With `all` unset the search stops at the first match.
    pub fn find(&self, path: &str, all: bool) -> Vec<PathBuf> {
        match self {
            Self::Directories(finder) => finder.find(path, all),
            Self::Bundles(finder) => finder.find(path, all),
            Self::Fallback(finder) => finder.find(path).into_iter().collect(),
        }
    }
}

/// The ordered finder chain behind resolution, collection and serving.
pub struct FinderChain {
    finders: Vec<Finder>,
}

impl FinderChain {
    /// Build the chain from the `collect.finders` selector list.
    pub fn from_config(config: &StaticConfig) -> Result<Self, ConfigError> {
        let mut finders = Vec::with_capacity(config.collect.finders.len());
        for selector in &config.collect.finders {
            let finder = match selector.as_str() {
                "directories" => Finder::Directories(DirectoryFinder::from_config(config)),
                "bundles" => Finder::Bundles(BundleFinder::from_config(config)),
                "fallback" => Finder::Fallback(FallbackFinder::from_config(config)?),
                other => {
                    return Err(ConfigError::Validation(format!(
                        "unknown finder `{other}` in `collect.finders` \
                         (expected `directories`, `bundles` or `fallback`)"
                    )));
                }
            };
            finders.push(finder);
        }
        Ok(Self { finders })
    }

    /// Resolve a logical path through the chain.
    ///
    /// With `all` unset the first finder that matches wins and later
    /// finders are never consulted; with `all` set every match across the
    /// whole chain is returned in chain order.
    pub fn resolve(&self, path: &str, all: bool) -> Vec<PathBuf> {
        let mut matches = Vec::new();
        for finder in &self.finders {
            let found = finder.find(path, all);
            if !all && !found.is_empty() {
                return found;
            }
            matches.extend(found);
        }
        matches
    }
}
