//! Include/exclude path filtering for reviewable files.
//!
//! Wildcard semantics follow `glob::Pattern`: `**` matches across path
//! separators, `*` stays within one segment, `?` matches a single
//! character. A path is reviewable iff it matches at least one include
//! pattern and no exclude pattern.

use glob::Pattern;
use tracing::warn;

use crate::policy::{FilePatterns, ReviewPolicy};

/// Compiled include/exclude filter.
///
/// # Examples
///
/// ```
/// use heimdall_policy::{FilePatterns, FileFilter};
///
/// let patterns = FilePatterns {
///     include: vec!["**/*.ts".into()],
///     exclude: vec!["**/*.test.ts".into()],
/// };
/// let filter = FileFilter::from_patterns(&patterns);
/// assert!(filter.is_included("src/a.ts"));
/// assert!(!filter.is_included("src/a.test.ts"));
/// ```
pub struct FileFilter {
    include: Vec<Pattern>,
    exclude: Vec<Pattern>,
}

impl FileFilter {
    /// Compile a filter from policy patterns.
    ///
    /// Invalid glob patterns are skipped with a warning: a bad include
    /// pattern matches nothing, a bad exclude pattern excludes nothing.
    pub fn from_patterns(files: &FilePatterns) -> Self {
        Self {
            include: compile(&files.include, "include"),
            exclude: compile(&files.exclude, "exclude"),
        }
    }

    /// Whether a path passes the include set and dodges the exclude set.
    pub fn is_included(&self, path: &str) -> bool {
        self.include.iter().any(|p| p.matches(path))
            && !self.exclude.iter().any(|p| p.matches(path))
    }
}

fn compile(patterns: &[String], side: &str) -> Vec<Pattern> {
    patterns
        .iter()
        .filter_map(|raw| match Pattern::new(raw) {
            Ok(pattern) => Some(pattern),
            Err(e) => {
                warn!(pattern = %raw, side, error = %e, "invalid file pattern, skipping");
                None
            }
        })
        .collect()
}

/// Convenience form of [`FileFilter::is_included`] taking a whole policy.
///
/// # Examples
///
/// ```
/// use heimdall_policy::{path_included, ReviewPolicy};
///
/// let policy = ReviewPolicy::default();
/// assert!(path_included("src/main.rs", &policy));
/// assert!(!path_included("Cargo.lock", &policy));
/// ```
pub fn path_included(path: &str, policy: &ReviewPolicy) -> bool {
    FileFilter::from_patterns(&policy.files).is_included(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patterns(include: &[&str], exclude: &[&str]) -> FilePatterns {
        FilePatterns {
            include: include.iter().map(|s| s.to_string()).collect(),
            exclude: exclude.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn include_and_exclude_combine() {
        let filter = FileFilter::from_patterns(&patterns(&["**/*.ts"], &["**/*.test.ts"]));
        assert!(filter.is_included("src/a.ts"));
        assert!(filter.is_included("a.ts"));
        assert!(!filter.is_included("src/a.test.ts"));
        assert!(!filter.is_included("src/b.rs"));
    }

    #[test]
    fn star_stays_within_a_segment() {
        let filter = FileFilter::from_patterns(&patterns(&["src/*.rs"], &[]));
        assert!(filter.is_included("src/main.rs"));
        assert!(!filter.is_included("src/nested/main.rs"));
    }

    #[test]
    fn double_star_crosses_separators() {
        let filter = FileFilter::from_patterns(&patterns(&["src/**/*.rs"], &[]));
        assert!(filter.is_included("src/a/b/c.rs"));
        assert!(filter.is_included("src/main.rs"));
    }

    #[test]
    fn question_mark_matches_one_character() {
        let filter = FileFilter::from_patterns(&patterns(&["file?.txt"], &[]));
        assert!(filter.is_included("file1.txt"));
        assert!(!filter.is_included("file12.txt"));
    }

    #[test]
    fn literal_dots_do_not_act_as_wildcards() {
        let filter = FileFilter::from_patterns(&patterns(&["*.rs"], &[]));
        assert!(filter.is_included("main.rs"));
        assert!(!filter.is_included("mainxrs"));
    }

    #[test]
    fn empty_include_matches_nothing() {
        let filter = FileFilter::from_patterns(&patterns(&[], &[]));
        assert!(!filter.is_included("src/main.rs"));
    }

    #[test]
    fn invalid_pattern_is_skipped() {
        let filter = FileFilter::from_patterns(&patterns(&["[invalid", "**/*.rs"], &["[also-bad"]));
        // The valid include still works; the broken exclude excludes nothing.
        assert!(filter.is_included("src/lib.rs"));
        assert!(!filter.is_included("src/lib.ts"));
    }

    #[test]
    fn default_policy_excludes_lockfiles_and_vendored() {
        let policy = ReviewPolicy::default();
        assert!(path_included("src/auth.rs", &policy));
        assert!(path_included("deep/nested/module.py", &policy));
        assert!(!path_included("package-lock.json", &policy));
        assert!(!path_included("frontend/node_modules/lib/index.js", &policy));
        assert!(!path_included("assets/app.min.js", &policy));
    }
}
