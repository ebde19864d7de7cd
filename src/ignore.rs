//! Shell-style ignore pattern matching.
//!
//! Patterns use `glob` syntax (`*`, `?`, `[...]`) and are matched
//! case-sensitively against the basename of each entry. A pattern that
//! contains a path separator instead constrains the entry's full
//! location-relative logical path.

/// Default ignore patterns: version control and editor backup files.
pub const DEFAULT_IGNORE_PATTERNS: &[&str] = &["CVS", ".*", "*~"];

/// Check whether a logical path matches any of the given patterns.
///
/// Short-circuits on the first matching pattern.
pub fn matches_patterns(path: &str, patterns: &[String]) -> bool {
    patterns.iter().any(|pattern| matches(path, pattern))
}

/// Check a single pattern against a logical path.
///
/// Patterns without a separator match the basename; qualified patterns
/// match the whole relative path.
fn matches(path: &str, pattern: &str) -> bool {
    let candidate = if pattern.contains('/') {
        path
    } else {
        path.rsplit('/').next().unwrap_or(path)
    };
    match glob::Pattern::new(pattern) {
        Ok(glob) => glob.matches(candidate),
        Err(_) => {
            // Invalid patterns never match; config validation reports them
            false
        }
    }
}

/// Build the effective pattern list for a run.
///
/// Defaults come first, then config-supplied patterns, then CLI-supplied
/// ones. Defaults can only be dropped by explicit request.
pub fn effective_patterns(
    use_defaults: bool,
    configured: &[String],
    extra: &[String],
) -> Vec<String> {
    let mut patterns = Vec::new();
    if use_defaults {
        patterns.extend(DEFAULT_IGNORE_PATTERNS.iter().map(|p| (*p).to_string()));
    }
    patterns.extend(configured.iter().cloned());
    patterns.extend(extra.iter().cloned());
    patterns
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pats(list: &[&str]) -> Vec<String> {
        list.iter().map(|p| (*p).to_string()).collect()
    }

    #[test]
    fn test_default_patterns() {
        let patterns = pats(DEFAULT_IGNORE_PATTERNS);
        assert!(matches_patterns("CVS", &patterns));
        assert!(matches_patterns(".hidden", &patterns));
        assert!(matches_patterns("backup.css~", &patterns));
        assert!(!matches_patterns("app.css", &patterns));
    }

    #[test]
    fn test_basename_matching() {
        // Unqualified patterns apply to the basename, not the full path
        let patterns = pats(&["*.tmp"]);
        assert!(matches_patterns("css/scratch.tmp", &patterns));
        assert!(!matches_patterns("tmp/app.css", &patterns));
    }

    #[test]
    fn test_qualified_pattern_matches_full_path() {
        let patterns = pats(&["vendor/*.js"]);
        assert!(matches_patterns("vendor/jquery.js", &patterns));
        assert!(!matches_patterns("js/vendor.js", &patterns));
    }

    #[test]
    fn test_case_sensitive() {
        let patterns = pats(&["CVS"]);
        assert!(!matches_patterns("cvs", &patterns));
    }

    #[test]
    fn test_character_class() {
        let patterns = pats(&["file[0-9].txt"]);
        assert!(matches_patterns("file3.txt", &patterns));
        assert!(!matches_patterns("fileX.txt", &patterns));
    }

    #[test]
    fn test_effective_patterns_order() {
        let configured = pats(&["*.log"]);
        let extra = pats(&["*.bak"]);
        let all = effective_patterns(true, &configured, &extra);
        assert_eq!(all.first().map(String::as_str), Some("CVS"));
        assert!(all.contains(&"*.log".to_string()));
        assert!(all.contains(&"*.bak".to_string()));

        let no_defaults = effective_patterns(false, &configured, &extra);
        assert_eq!(no_defaults, pats(&["*.log", "*.bak"]));
    }
}
