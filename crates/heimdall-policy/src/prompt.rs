//! Review prompt rendering.
//!
//! The prompt is assembled from a fixed template so that identical inputs
//! always produce identical prompts. The overall length is never truncated;
//! only individual file diffs above [`MAX_PATCH_CHARS`] are replaced with a
//! placeholder.

use std::fmt::Write;

use heimdall_core::PullRequestSnapshot;

use crate::filter::FileFilter;
use crate::policy::ReviewPolicy;
use crate::rules::scan_custom_rules;

/// Largest per-file diff included verbatim in the prompt.
pub const MAX_PATCH_CHARS: usize = 10_000;

/// Render the full review prompt for a pull request under a policy.
///
/// Template order: optional custom instructions, the review instruction
/// sentence (style, focus areas, severity levels), PR title/description,
/// the diff of every included file (excluded files are skipped entirely),
/// the repository's custom rules, and a fixed closing section describing
/// the expected output structure.
///
/// # Examples
///
/// ```
/// use heimdall_core::{PullRequestSnapshot, SnapshotFile};
/// use heimdall_policy::{render_prompt, ReviewPolicy};
///
/// let snapshot = PullRequestSnapshot {
///     number: 1,
///     title: "Fix login".into(),
///     body: String::new(),
///     files: vec![SnapshotFile {
///         filename: "src/auth.rs".into(),
///         is_binary: false,
///         patch: Some("+fn login() {}".into()),
///     }],
/// };
/// let prompt = render_prompt(&snapshot, &ReviewPolicy::default());
/// assert!(prompt.contains("Fix login"));
/// assert!(prompt.contains("```diff"));
/// ```
pub fn render_prompt(snapshot: &PullRequestSnapshot, policy: &ReviewPolicy) -> String {
    let mut prompt = String::new();

    if let Some(instructions) = &policy.ai.custom_instructions {
        let _ = writeln!(prompt, "{instructions}\n");
    }

    let focus = policy.focus.enabled_labels().join(", ");
    let severity = policy.severity.enabled_labels().join(", ");
    let _ = writeln!(
        prompt,
        "You are an expert code reviewer. Provide a {} review of the following \
         pull request, focusing on: {focus}. Report only findings at these severity \
         levels: {severity}.\n",
        policy.general.style,
    );

    let title = if snapshot.title.is_empty() {
        "(no title)"
    } else {
        snapshot.title.as_str()
    };
    let body = if snapshot.body.is_empty() {
        "(no description provided)"
    } else {
        snapshot.body.as_str()
    };
    let _ = writeln!(prompt, "## Pull Request #{}\n", snapshot.number);
    let _ = writeln!(prompt, "**Title:** {title}\n");
    let _ = writeln!(prompt, "**Description:**\n{body}\n");

    let _ = writeln!(prompt, "## Changed Files\n");
    let filter = FileFilter::from_patterns(&policy.files);
    for file in &snapshot.files {
        if !filter.is_included(&file.filename) {
            continue;
        }
        let _ = writeln!(prompt, "### `{}`\n", file.filename);

        match &file.patch {
            None => {
                let _ = writeln!(prompt, "_Binary file, diff omitted._\n");
            }
            Some(_) if file.is_binary => {
                let _ = writeln!(prompt, "_Binary file, diff omitted._\n");
            }
            Some(patch) if patch.len() > MAX_PATCH_CHARS => {
                let _ = writeln!(
                    prompt,
                    "_Diff omitted: {} characters exceeds the inline limit._\n",
                    patch.len()
                );
            }
            Some(patch) => {
                let _ = writeln!(prompt, "```diff\n{patch}\n```\n");
                let violations =
                    scan_custom_rules(&file.filename, patch, &policy.custom_rules);
                if !violations.is_empty() {
                    let _ = writeln!(prompt, "Rule matches in this file:");
                    for v in &violations {
                        let _ = writeln!(
                            prompt,
                            "- `{}` ({}) at line {}: {}",
                            v.rule, v.severity, v.line, v.description
                        );
                    }
                    let _ = writeln!(prompt);
                }
            }
        }
    }

    if !policy.custom_rules.is_empty() {
        let _ = writeln!(prompt, "## Repository Rules\n");
        for rule in &policy.custom_rules {
            let _ = writeln!(
                prompt,
                "- **{}**: {} (severity: {})",
                rule.name, rule.description, rule.severity
            );
        }
        let _ = writeln!(prompt);
    }

    let _ = writeln!(
        prompt,
        "## Output Format\n\n\
         Structure your review as three sections:\n\
         1. **Summary** — a short overview of the change and its risk.\n\
         2. **Key Findings** — concrete issues, grouped by focus area.\n\
         3. **Recommendations** — actionable next steps for the author."
    );

    prompt
}
