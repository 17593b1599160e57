//! Custom-rule scanning over file content.

use regex::Regex;
use tracing::warn;

use crate::policy::CustomRule;

/// A custom-rule match found in a file.
///
/// Produced transiently during prompt assembly and surfaced to the reviewer
/// model as context; violations are informational, not a merge gate.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleViolation {
    /// Name of the matching rule.
    pub rule: String,
    /// The rule's description.
    pub description: String,
    /// The rule's severity label.
    pub severity: String,
    /// 1-based line of the match start.
    pub line: usize,
    /// The matched text.
    pub matched_text: String,
}

/// Scan `content` with every rule, collecting all matches.
///
/// Each match's `line` is one plus the number of newlines before the match
/// start. A rule whose pattern fails to compile is skipped with a warning
/// and contributes no violations.
///
/// # Examples
///
/// ```
/// use heimdall_policy::{scan_custom_rules, CustomRule};
///
/// let rules = vec![CustomRule {
///     name: "no-unwrap".into(),
///     pattern: r"\.unwrap\(\)".into(),
///     description: "Avoid unwrap in library code".into(),
///     severity: "high".into(),
/// }];
/// let violations = scan_custom_rules("src/lib.rs", "let x = y.unwrap();", &rules);
/// assert_eq!(violations.len(), 1);
/// assert_eq!(violations[0].line, 1);
/// ```
pub fn scan_custom_rules(path: &str, content: &str, rules: &[CustomRule]) -> Vec<RuleViolation> {
    let mut violations = Vec::new();

    for rule in rules {
        let regex = match Regex::new(&rule.pattern) {
            Ok(regex) => regex,
            Err(e) => {
                warn!(rule = %rule.name, path, error = %e, "invalid custom rule pattern, skipping");
                continue;
            }
        };

        for m in regex.find_iter(content) {
            let line = 1 + content[..m.start()].bytes().filter(|b| *b == b'\n').count();
            violations.push(RuleViolation {
                rule: rule.name.clone(),
                description: rule.description.clone(),
                severity: rule.severity.clone(),
                line,
                matched_text: m.as_str().to_string(),
            });
        }
    }

    violations
}
