//! Review-policy resolution and prompt construction for Heimdall.
//!
//! A repository opts into customized reviews by committing a partial YAML
//! policy document; this crate merges it over the defaults, filters the
//! changed files through include/exclude globs, scans custom regex rules,
//! and renders the deterministic review prompt.

mod filter;
mod policy;
mod prompt;
mod resolver;
mod rules;

pub use filter::{path_included, FileFilter};
pub use policy::{
    AiDocument, AiPolicy, CustomRule, FilePatterns, FilesDocument, FocusAreas, FocusDocument,
    GeneralDocument, GeneralPolicy, PolicyDocument, ReviewPolicy, SeverityDocument, SeverityLevels,
};
pub use prompt::{render_prompt, MAX_PATCH_CHARS};
pub use resolver::{PolicyResolver, POLICY_PATH};
pub use rules::{scan_custom_rules, RuleViolation};
