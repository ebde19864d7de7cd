//! Cache-busting storage decorator.
//!
//! Wraps a destination storage so that every file is also saved under a
//! content-hashed name (`style.css` → `style.1b2c3d4e5f60.css`) and
//! stylesheet `url(...)`/`@import` references are rewritten to point at the
//! hashed names of the files they reference. The original→hashed mapping is
//! kept in a persistent [`HashCache`] so `url()` can answer without
//! re-hashing.

use anyhow::{Result, bail};
use regex::{Captures, Regex};

use crate::log;
use crate::storage::{FileSystemStorage, HashCache};
use crate::utils::hash;
use crate::utils::path::collapse_dots;

/// Outcome of post-processing one collected path.
#[derive(Debug, Clone)]
pub struct PostProcessed {
    /// Logical path the file was collected under.
    pub original: String,
    /// Logical path of the hashed object.
    pub hashed: String,
    /// Whether a new hashed object was written this run.
    pub processed: bool,
}

/// How a matched reference is written back into the stylesheet.
#[derive(Debug, Clone, Copy)]
enum ReferenceKind {
    Url,
    Import,
}

impl ReferenceKind {
    fn render(self, url: &str) -> String {
        match self {
            Self::Url => format!("url(\"{url}\")"),
            Self::Import => format!("@import \"{url}\""),
        }
    }
}

struct RewritePattern {
    regex: Regex,
    kind: ReferenceKind,
}

/// Storage decorator that hashes contents into filenames.
pub struct HashedStorage {
    base: FileSystemStorage,
    cache: HashCache,
    /// In debug mode `url()` returns plain URLs unless forced.
    debug: bool,
    /// Basename globs of files whose references get rewritten.
    adjustable: Vec<String>,
    patterns: Vec<RewritePattern>,
}

impl HashedStorage {
    pub fn new(base: FileSystemStorage, debug: bool) -> Result<Self> {
        let cache = HashCache::load(base.location());
        let patterns = vec![
            RewritePattern {
                regex: Regex::new(r#"url\(['"]?\s*(.*?)["']?\)"#)?,
                kind: ReferenceKind::Url,
            },
            RewritePattern {
                regex: Regex::new(r#"@import\s*["']\s*(.*?)["']"#)?,
                kind: ReferenceKind::Import,
            },
        ];
        Ok(Self {
            base,
            cache,
            debug,
            adjustable: vec!["*.css".to_string()],
            patterns,
        })
    }

    /// The wrapped filesystem storage.
    pub fn base(&self) -> &FileSystemStorage {
        &self.base
    }

    /// Whether a file's references get rewritten during post-processing.
    fn is_adjustable(&self, name: &str) -> bool {
        crate::ignore::matches_patterns(name, &self.adjustable)
    }

    // ========================================================================
    // hashing
    // ========================================================================

    /// Return the logical path with a content hash token inserted before
    /// the extension.
    ///
    /// A `?query` or `#fragment` suffix on the requested path is left out
    /// of the hashed component and re-attached verbatim. Without explicit
    /// `content`, the existing file is read; a missing file is an error.
    pub fn hashed_name(&self, name: &str, content: Option<&[u8]>) -> Result<String> {
        let (clean, suffix) = split_suffix(name);
        let owned;
        let bytes = match content {
            Some(bytes) => bytes,
            None => {
                if !self.base.exists(clean) {
                    bail!(
                        "the file `{clean}` could not be found in `{}`",
                        self.base.location().display()
                    );
                }
                owned = self.base.open(clean)?;
                &owned
            }
        };
        let token = hash::fingerprint(bytes);

        let (dir, filename) = match clean.rsplit_once('/') {
            Some((dir, filename)) => (dir, filename),
            None => ("", clean),
        };
        let hashed_filename = match filename.rsplit_once('.') {
            Some((stem, ext)) => format!("{stem}.{token}.{ext}"),
            None => format!("{filename}.{token}"),
        };
        let hashed = if dir.is_empty() {
            hashed_filename
        } else {
            format!("{dir}/{hashed_filename}")
        };
        Ok(format!("{hashed}{suffix}"))
    }

    /// Public URL for a logical path.
    ///
    /// In debug mode (and without `force`) the plain URL is returned.
    /// Otherwise the hash cache is consulted, computing and caching the
    /// hashed name on a miss. A `#fragment` survives the round trip even
    /// though it is never part of the hashed filename.
    pub fn url(&self, name: &str, force: bool) -> Result<String> {
        if self.debug && !force {
            return Ok(self.base.url(name));
        }
        let (clean, fragment) = match name.split_once('#') {
            Some((clean, fragment)) => (clean, Some(fragment)),
            None => (name, None),
        };
        let hashed = match self.cache.get(name) {
            Some(hashed) => hashed,
            None => {
                let hashed = self.hashed_name(clean, None)?;
                self.cache.set(name, &hashed);
                hashed
            }
        };
        let mut url = self.base.url(&hashed);
        if let Some(fragment) = fragment {
            url.push('#');
            url.push_str(fragment);
        }
        Ok(url)
    }

    // ========================================================================
    // post-processing
    // ========================================================================

    /// Hash every collected path and rewrite stylesheet references.
    ///
    /// Runs deepest-first so that nested referenced assets are hashed and
    /// cached before the shallower files that reference them. Adjustable
    /// files are rewritten first and hashed over the rewritten bytes, so
    /// the hash always reflects the bytes persisted under the hashed name.
    /// Dry-run performs no writes and yields nothing.
    pub fn post_process(&self, paths: &[String], dry_run: bool) -> Result<Vec<PostProcessed>> {
        if dry_run {
            return Ok(Vec::new());
        }

        // Invalidate before repopulating so no stale mapping is served
        self.cache.delete_many(paths)?;

        let mut ordered: Vec<&String> = paths.iter().collect();
        ordered.sort_by_key(|name| std::cmp::Reverse(name.split('/').count()));

        let mut results = Vec::with_capacity(ordered.len());
        for name in ordered {
            let content = match self.base.open(name) {
                Ok(content) => content,
                Err(err) => {
                    log!("warning"; "skipping `{name}`: {err}");
                    continue;
                }
            };

            // A rewritable file that is not valid UTF-8 is persisted as-is;
            // lossy decoding would corrupt its bytes under the hashed name
            let rewritten = if self.is_adjustable(name) {
                match std::str::from_utf8(&content) {
                    Ok(text) => Some(self.rewrite_references(name, text)),
                    Err(_) => {
                        log!("warning"; "`{name}` is not valid UTF-8, copying it unrewritten");
                        None
                    }
                }
            } else {
                None
            };
            let bytes: &[u8] = match &rewritten {
                Some(text) => text.as_bytes(),
                None => &content,
            };

            let hashed = self.hashed_name(name, Some(bytes))?;
            let processed = if self.base.exists(&hashed) {
                false
            } else {
                self.base.save(&hashed, bytes)?;
                true
            };

            self.cache.set(name, &hashed);
            results.push(PostProcessed {
                original: name.clone(),
                hashed,
                processed,
            });
        }

        self.cache.persist()?;
        Ok(results)
    }

    /// Apply every rewrite pattern to a stylesheet's content.
    fn rewrite_references(&self, name: &str, content: &str) -> String {
        let mut result = content.to_string();
        for pattern in &self.patterns {
            result = pattern
                .regex
                .replace_all(&result, |caps: &Captures| {
                    let target = &caps[1];
                    match self.convert_reference(name, target) {
                        Some(url) => pattern.kind.render(&url),
                        None => caps[0].to_string(),
                    }
                })
                .into_owned();
        }
        result
    }

    /// Resolve one matched reference to its hashed URL.
    ///
    /// Returns `None` to leave the reference untouched: absolute URLs,
    /// data URIs, bare fragments, and references that cannot be resolved
    /// (logged, the run continues).
    fn convert_reference(&self, name: &str, target: &str) -> Option<String> {
        if target.starts_with('#')
            || target.starts_with("http:")
            || target.starts_with("https:")
            || target.starts_with("data:")
        {
            return None;
        }
        let resolved = resolve_reference(name, target);
        match self.url(&resolved, true) {
            Ok(url) => Some(url),
            Err(err) => {
                log!("warning"; "leaving `{target}` in `{name}` unrewritten: {err}");
                None
            }
        }
    }
}

/// Split a requested path at the first `?` or `#`, keeping the suffix
/// verbatim.
fn split_suffix(name: &str) -> (&str, &str) {
    match name.find(['?', '#']) {
        Some(pos) => name.split_at(pos),
        None => (name, ""),
    }
}

/// Resolve a reference found in `name` against `name`'s own directory.
///
/// A leading `/` makes the reference relative to the storage root;
/// otherwise leading `../` segments ascend from the referencing file's
/// location, with dot segments collapsed.
fn resolve_reference(name: &str, reference: &str) -> String {
    if let Some(rest) = reference.strip_prefix('/') {
        return collapse_dots(rest);
    }
    let dir = name.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("");
    if dir.is_empty() {
        collapse_dots(reference)
    } else {
        collapse_dots(&format!("{dir}/{reference}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn hashed_storage(dir: &TempDir, debug: bool) -> HashedStorage {
        let base = FileSystemStorage::new(dir.path(), "/static/");
        HashedStorage::new(base, debug).unwrap()
    }

    #[test]
    fn test_hashed_name_format() {
        let dir = TempDir::new().unwrap();
        let storage = hashed_storage(&dir, false);

        let name = storage
            .hashed_name("css/app.css", Some(b"body {}"))
            .unwrap();
        let token = hash::fingerprint(b"body {}");
        assert_eq!(name, format!("css/app.{token}.css"));
    }

    #[test]
    fn test_hashed_name_no_extension() {
        let dir = TempDir::new().unwrap();
        let storage = hashed_storage(&dir, false);

        let token = hash::fingerprint(b"example.com");
        let name = storage.hashed_name("CNAME", Some(b"example.com")).unwrap();
        assert_eq!(name, format!("CNAME.{token}"));
    }

    #[test]
    fn test_hashed_name_determinism() {
        let dir = TempDir::new().unwrap();
        let storage = hashed_storage(&dir, false);

        let a = storage.hashed_name("a/x.css", Some(b"same")).unwrap();
        let b = storage.hashed_name("b/x.css", Some(b"same")).unwrap();
        // Same content yields the same token under different directories
        assert_eq!(
            a.rsplit('/').next().unwrap(),
            b.rsplit('/').next().unwrap()
        );

        let changed = storage.hashed_name("a/x.css", Some(b"Same")).unwrap();
        assert_ne!(a, changed);
    }

    #[test]
    fn test_hashed_name_preserves_suffix() {
        let dir = TempDir::new().unwrap();
        let storage = hashed_storage(&dir, false);

        let token = hash::fingerprint(b"font");
        let name = storage
            .hashed_name("fonts/a.eot?#iefix", Some(b"font"))
            .unwrap();
        assert_eq!(name, format!("fonts/a.{token}.eot?#iefix"));
    }

    #[test]
    fn test_hashed_name_missing_file() {
        let dir = TempDir::new().unwrap();
        let storage = hashed_storage(&dir, false);
        assert!(storage.hashed_name("missing.css", None).is_err());
    }

    #[test]
    fn test_url_debug_returns_plain() {
        let dir = TempDir::new().unwrap();
        let storage = hashed_storage(&dir, true);
        assert_eq!(
            storage.url("css/app.css", false).unwrap(),
            "/static/css/app.css"
        );
    }

    #[test]
    fn test_url_hashes_and_caches() {
        let dir = TempDir::new().unwrap();
        let storage = hashed_storage(&dir, false);
        storage.base.save("css/app.css", b"body {}").unwrap();

        let token = hash::fingerprint(b"body {}");
        let expected = format!("/static/css/app.{token}.css");
        assert_eq!(storage.url("css/app.css", false).unwrap(), expected);
        // Cached now
        assert!(storage.cache.get("css/app.css").is_some());
    }

    #[test]
    fn test_url_preserves_fragment() {
        let dir = TempDir::new().unwrap();
        let storage = hashed_storage(&dir, false);
        storage.base.save("img/sprite.svg", b"<svg/>").unwrap();

        let url = storage.url("img/sprite.svg#icon", false).unwrap();
        assert!(url.ends_with("#icon"));
        assert!(url.contains(&hash::fingerprint(b"<svg/>")));
    }

    #[test]
    fn test_resolve_reference() {
        assert_eq!(resolve_reference("css/style.css", "other.css"), "css/other.css");
        assert_eq!(
            resolve_reference("a/b/style.css", "../img/x.png"),
            "a/img/x.png"
        );
        assert_eq!(resolve_reference("style.css", "img/x.png"), "img/x.png");
        assert_eq!(resolve_reference("css/style.css", "/img/x.png"), "img/x.png");
        assert_eq!(resolve_reference("css/style.css", "./other.css"), "css/other.css");
    }

    #[test]
    fn test_post_process_rewrites_same_dir_reference() {
        let dir = TempDir::new().unwrap();
        let storage = hashed_storage(&dir, false);
        storage.base.save("css/other.css", b"p { margin: 0 }").unwrap();
        storage
            .base
            .save("css/style.css", b"div { background: url(other.css) }")
            .unwrap();

        let paths = vec!["css/other.css".to_string(), "css/style.css".to_string()];
        let results = storage.post_process(&paths, false).unwrap();
        assert_eq!(results.len(), 2);

        let style = results
            .iter()
            .find(|r| r.original == "css/style.css")
            .unwrap();
        let rewritten = String::from_utf8(storage.base.open(&style.hashed).unwrap()).unwrap();

        let other_token = hash::fingerprint(b"p { margin: 0 }");
        assert!(rewritten.contains(&format!("url(\"/static/css/other.{other_token}.css\")")));
        assert!(!rewritten.contains("url(other.css)"));
    }

    #[test]
    fn test_post_process_resolves_parent_reference() {
        let dir = TempDir::new().unwrap();
        let storage = hashed_storage(&dir, false);
        storage.base.save("a/img/x.png", b"png-bytes").unwrap();
        storage
            .base
            .save("a/b/style.css", b"div { background: url(../img/x.png) }")
            .unwrap();

        let paths = vec!["a/img/x.png".to_string(), "a/b/style.css".to_string()];
        let results = storage.post_process(&paths, false).unwrap();

        let style = results
            .iter()
            .find(|r| r.original == "a/b/style.css")
            .unwrap();
        let rewritten = String::from_utf8(storage.base.open(&style.hashed).unwrap()).unwrap();
        let png_token = hash::fingerprint(b"png-bytes");
        assert!(rewritten.contains(&format!("url(\"/static/a/img/x.{png_token}.png\")")));
    }

    #[test]
    fn test_post_process_rewrites_import() {
        let dir = TempDir::new().unwrap();
        let storage = hashed_storage(&dir, false);
        storage.base.save("css/base.css", b"p {}").unwrap();
        storage
            .base
            .save("css/main.css", b"@import \"base.css\";")
            .unwrap();

        let paths = vec!["css/base.css".to_string(), "css/main.css".to_string()];
        let results = storage.post_process(&paths, false).unwrap();

        let main = results.iter().find(|r| r.original == "css/main.css").unwrap();
        let rewritten = String::from_utf8(storage.base.open(&main.hashed).unwrap()).unwrap();
        let base_token = hash::fingerprint(b"p {}");
        assert!(rewritten.contains(&format!("@import \"/static/css/base.{base_token}.css\"")));
    }

    #[test]
    fn test_post_process_skips_absolute_and_data_urls() {
        let dir = TempDir::new().unwrap();
        let storage = hashed_storage(&dir, false);
        let css = b"a { background: url(https://cdn.example.com/x.png) }\n\
                    b { background: url(data:image/png;base64,AAAA) }\n\
                    c { mask: url(#frag) }";
        storage.base.save("css/ext.css", css).unwrap();

        let paths = vec!["css/ext.css".to_string()];
        let results = storage.post_process(&paths, false).unwrap();
        let rewritten =
            String::from_utf8(storage.base.open(&results[0].hashed).unwrap()).unwrap();
        assert!(rewritten.contains("url(https://cdn.example.com/x.png)"));
        assert!(rewritten.contains("url(data:image/png;base64,AAAA)"));
        assert!(rewritten.contains("url(#frag)"));
    }

    #[test]
    fn test_post_process_deepest_first() {
        let dir = TempDir::new().unwrap();
        let storage = hashed_storage(&dir, false);
        storage.base.save("css/deep/base.css", b"p {}").unwrap();
        storage
            .base
            .save("css/top.css", b"@import \"deep/base.css\";")
            .unwrap();

        // Shallower file listed first; ordering must still process the
        // deeper referenced file before the referencing one
        let paths = vec!["css/top.css".to_string(), "css/deep/base.css".to_string()];
        let results = storage.post_process(&paths, false).unwrap();
        assert_eq!(results[0].original, "css/deep/base.css");

        let top = results.iter().find(|r| r.original == "css/top.css").unwrap();
        let rewritten = String::from_utf8(storage.base.open(&top.hashed).unwrap()).unwrap();
        assert!(rewritten.contains(&hash::fingerprint(b"p {}")));
    }

    #[test]
    fn test_post_process_idempotent() {
        let dir = TempDir::new().unwrap();
        let storage = hashed_storage(&dir, false);
        storage.base.save("css/other.css", b"p {}").unwrap();
        storage
            .base
            .save("css/style.css", b"div { background: url(other.css) }")
            .unwrap();

        let paths = vec!["css/other.css".to_string(), "css/style.css".to_string()];
        let first = storage.post_process(&paths, false).unwrap();
        assert!(first.iter().all(|r| r.processed));

        let second = storage.post_process(&paths, false).unwrap();
        assert!(second.iter().all(|r| !r.processed));
        // Same hashed names both runs
        for result in &second {
            assert!(first.iter().any(|r| r.hashed == result.hashed));
        }
    }

    #[test]
    fn test_post_process_dry_run_yields_nothing() {
        let dir = TempDir::new().unwrap();
        let storage = hashed_storage(&dir, false);
        storage.base.save("css/app.css", b"body {}").unwrap();

        let paths = vec!["css/app.css".to_string()];
        let results = storage.post_process(&paths, true).unwrap();
        assert!(results.is_empty());

        // No hashed sibling was written
        let (_, files) = storage.base.listdir("css").unwrap();
        assert_eq!(files, vec!["app.css"]);
    }

    #[test]
    fn test_unresolvable_reference_left_untouched() {
        let dir = TempDir::new().unwrap();
        let storage = hashed_storage(&dir, false);
        storage
            .base
            .save("css/style.css", b"div { background: url(missing.png) }")
            .unwrap();

        let paths = vec!["css/style.css".to_string()];
        let results = storage.post_process(&paths, false).unwrap();
        let rewritten =
            String::from_utf8(storage.base.open(&results[0].hashed).unwrap()).unwrap();
        assert!(rewritten.contains("url(missing.png)"));
    }

    #[test]
    fn test_non_utf8_stylesheet_copied_byte_for_byte() {
        let dir = TempDir::new().unwrap();
        let storage = hashed_storage(&dir, false);
        storage.base.save("img/icon.png", b"png bytes").unwrap();
        let content = b"div { background: url(../img/icon.png) }\xff\xfe";
        storage.base.save("css/broken.css", content).unwrap();

        let paths = vec![
            "css/broken.css".to_string(),
            "img/icon.png".to_string(),
        ];
        let results = storage.post_process(&paths, false).unwrap();
        let broken = results
            .iter()
            .find(|r| r.original == "css/broken.css")
            .unwrap();
        // No rewriting and no lossy re-encoding took place
        assert_eq!(storage.base.open(&broken.hashed).unwrap(), content);
    }
}
