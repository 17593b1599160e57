use serde::{Deserialize, Serialize};

/// Immutable snapshot of a pull request at review time.
///
/// Built fresh from the source-control API for each review invocation and
/// discarded once the review completes.
///
/// # Examples
///
/// ```
/// use heimdall_core::{PullRequestSnapshot, SnapshotFile};
///
/// let snapshot = PullRequestSnapshot {
///     number: 42,
///     title: "Add login flow".into(),
///     body: String::new(),
///     files: vec![SnapshotFile {
///         filename: "src/auth.rs".into(),
///         is_binary: false,
///         patch: Some("+fn login() {}".into()),
///     }],
/// };
/// assert_eq!(snapshot.total_changed_lines(), 1);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestSnapshot {
    /// Pull request number.
    pub number: u64,
    /// Pull request title; may be empty.
    pub title: String,
    /// Pull request description; may be empty.
    pub body: String,
    /// Changed files with their diffs.
    pub files: Vec<SnapshotFile>,
}

impl PullRequestSnapshot {
    /// Count added and removed lines across all file patches.
    ///
    /// Diff headers (`+++` / `---`) are not counted. Binary files contribute
    /// nothing.
    pub fn total_changed_lines(&self) -> usize {
        self.files
            .iter()
            .filter_map(|f| f.patch.as_deref())
            .flat_map(|patch| patch.lines())
            .filter(|line| {
                (line.starts_with('+') && !line.starts_with("+++"))
                    || (line.starts_with('-') && !line.starts_with("---"))
            })
            .count()
    }
}

/// A single changed file within a [`PullRequestSnapshot`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotFile {
    /// Path of the file relative to the repository root.
    pub filename: String,
    /// Whether the file is binary (no textual diff available).
    pub is_binary: bool,
    /// Unified diff for the file; `None` for binary or oversized files.
    pub patch: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(patch: Option<&str>) -> SnapshotFile {
        SnapshotFile {
            filename: "src/lib.rs".into(),
            is_binary: patch.is_none(),
            patch: patch.map(String::from),
        }
    }

    #[test]
    fn changed_lines_counts_additions_and_deletions() {
        let snapshot = PullRequestSnapshot {
            number: 1,
            title: String::new(),
            body: String::new(),
            files: vec![file(Some(
                "@@ -1,2 +1,3 @@\n context\n-old line\n+new line\n+another",
            ))],
        };
        assert_eq!(snapshot.total_changed_lines(), 3);
    }

    #[test]
    fn changed_lines_skips_headers_and_binaries() {
        let snapshot = PullRequestSnapshot {
            number: 1,
            title: String::new(),
            body: String::new(),
            files: vec![
                file(Some("--- a/f\n+++ b/f\n+real change")),
                file(None),
            ],
        };
        assert_eq!(snapshot.total_changed_lines(), 1);
    }

    #[test]
    fn snapshot_serializes_camel_case() {
        let snapshot = PullRequestSnapshot {
            number: 7,
            title: "t".into(),
            body: "b".into(),
            files: vec![file(None)],
        };
        let json = serde_json::to_value(&snapshot).unwrap();
        assert!(json["files"][0].get("isBinary").is_some());
        assert!(json["files"][0].get("is_binary").is_none());
    }
}
