use serde::{Deserialize, Serialize};

/// Per-repository review policy with every field defaulted.
///
/// A repository customizes its reviews by committing a partial
/// [`PolicyDocument`] (YAML); the document is deep-merged over these
/// defaults field by field. Arrays replace wholesale, nested sections merge
/// recursively, scalars overwrite.
///
/// # Examples
///
/// ```
/// use heimdall_policy::ReviewPolicy;
///
/// let policy = ReviewPolicy::default();
/// assert!(policy.general.enabled);
/// assert!(policy.focus.security);
/// assert!(!policy.severity.info);
/// assert_eq!(policy.files.include, vec!["**/*".to_string()]);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReviewPolicy {
    /// Review enablement and sizing.
    #[serde(default)]
    pub general: GeneralPolicy,
    /// Topics the review should concentrate on.
    #[serde(default)]
    pub focus: FocusAreas,
    /// Severity levels worth reporting.
    #[serde(default)]
    pub severity: SeverityLevels,
    /// Include/exclude globs selecting reviewable files.
    #[serde(default)]
    pub files: FilePatterns,
    /// Repository-specific regex rules.
    #[serde(default)]
    pub custom_rules: Vec<CustomRule>,
    /// Model selection and generation parameters.
    #[serde(default)]
    pub ai: AiPolicy,
}

impl ReviewPolicy {
    /// Merge a partial document over this policy, right-biased.
    ///
    /// Idempotent: merging the result with the same document again yields
    /// the same policy.
    ///
    /// # Examples
    ///
    /// ```
    /// use heimdall_policy::{PolicyDocument, ReviewPolicy};
    ///
    /// let doc: PolicyDocument = serde_yaml::from_str("general:\n  max_size: 100\n").unwrap();
    /// let policy = ReviewPolicy::default().merged_with(&doc);
    /// assert_eq!(policy.general.max_size, 100);
    /// // Everything else keeps its default.
    /// assert!(policy.general.enabled);
    /// ```
    pub fn merged_with(mut self, doc: &PolicyDocument) -> Self {
        if let Some(general) = &doc.general {
            merge_general(&mut self.general, general);
        }
        if let Some(focus) = &doc.focus {
            merge_focus(&mut self.focus, focus);
        }
        if let Some(severity) = &doc.severity {
            merge_severity(&mut self.severity, severity);
        }
        if let Some(files) = &doc.files {
            merge_files(&mut self.files, files);
        }
        if let Some(rules) = &doc.custom_rules {
            self.custom_rules = rules.clone();
        }
        if let Some(ai) = &doc.ai {
            merge_ai(&mut self.ai, ai);
        }
        self
    }
}

/// Review enablement and sizing bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralPolicy {
    /// Whether automated reviews run at all for this repository.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Minimum total changed lines for a PR to be reviewed.
    #[serde(default)]
    pub min_size: usize,
    /// Maximum total changed lines for a PR to be reviewed.
    #[serde(default = "default_max_size")]
    pub max_size: usize,
    /// Tone of the generated review.
    #[serde(default = "default_style")]
    pub style: String,
}

fn default_true() -> bool {
    true
}

fn default_max_size() -> usize {
    5000
}

fn default_style() -> String {
    "constructive".into()
}

impl Default for GeneralPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            min_size: 0,
            max_size: default_max_size(),
            style: default_style(),
        }
    }
}

/// Focus topics for the review, one flag per topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FocusAreas {
    /// General code quality issues.
    #[serde(default = "default_true")]
    pub code_quality: bool,
    /// Security vulnerabilities.
    #[serde(default = "default_true")]
    pub security: bool,
    /// Performance problems.
    #[serde(default = "default_true")]
    pub performance: bool,
    /// Long-term maintainability.
    #[serde(default = "default_true")]
    pub maintainability: bool,
    /// Error handling and edge cases.
    #[serde(default = "default_true")]
    pub error_handling: bool,
    /// Documentation gaps.
    #[serde(default)]
    pub documentation: bool,
    /// Test coverage of the change.
    #[serde(default)]
    pub testing: bool,
}

impl Default for FocusAreas {
    fn default() -> Self {
        Self {
            code_quality: true,
            security: true,
            performance: true,
            maintainability: true,
            error_handling: true,
            documentation: false,
            testing: false,
        }
    }
}

impl FocusAreas {
    /// Human-readable labels of the enabled topics, underscores spelled as
    /// spaces, in declaration order.
    ///
    /// # Examples
    ///
    /// ```
    /// use heimdall_policy::FocusAreas;
    ///
    /// let labels = FocusAreas::default().enabled_labels();
    /// assert!(labels.contains(&"code quality"));
    /// assert!(labels.contains(&"error handling"));
    /// assert!(!labels.contains(&"documentation"));
    /// ```
    pub fn enabled_labels(&self) -> Vec<&'static str> {
        let flags = [
            (self.code_quality, "code quality"),
            (self.security, "security"),
            (self.performance, "performance"),
            (self.maintainability, "maintainability"),
            (self.error_handling, "error handling"),
            (self.documentation, "documentation"),
            (self.testing, "testing"),
        ];
        flags
            .into_iter()
            .filter_map(|(on, label)| on.then_some(label))
            .collect()
    }
}

/// Severity levels worth reporting, one flag per level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeverityLevels {
    /// Must-fix defects.
    #[serde(default = "default_true")]
    pub critical: bool,
    /// Serious problems.
    #[serde(default = "default_true")]
    pub high: bool,
    /// Moderate issues.
    #[serde(default = "default_true")]
    pub medium: bool,
    /// Minor nits.
    #[serde(default)]
    pub low: bool,
    /// Informational observations.
    #[serde(default)]
    pub info: bool,
}

impl Default for SeverityLevels {
    fn default() -> Self {
        Self {
            critical: true,
            high: true,
            medium: true,
            low: false,
            info: false,
        }
    }
}

impl SeverityLevels {
    /// Human-readable labels of the enabled levels (`info` reads as
    /// "informational").
    pub fn enabled_labels(&self) -> Vec<&'static str> {
        let flags = [
            (self.critical, "critical"),
            (self.high, "high"),
            (self.medium, "medium"),
            (self.low, "low"),
            (self.info, "informational"),
        ];
        flags
            .into_iter()
            .filter_map(|(on, label)| on.then_some(label))
            .collect()
    }
}

/// Include/exclude glob sets selecting which changed files are reviewed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilePatterns {
    /// A path must match at least one of these.
    #[serde(default = "default_include")]
    pub include: Vec<String>,
    /// A path must match none of these.
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,
}

fn default_include() -> Vec<String> {
    vec!["**/*".into()]
}

fn default_exclude() -> Vec<String> {
    [
        "**/package-lock.json",
        "**/yarn.lock",
        "**/Cargo.lock",
        "**/pnpm-lock.yaml",
        "**/node_modules/**",
        "**/vendor/**",
        "**/dist/**",
        "**/*.min.js",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl Default for FilePatterns {
    fn default() -> Self {
        Self {
            include: default_include(),
            exclude: default_exclude(),
        }
    }
}

/// A repository-specific rule scanned against file diffs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomRule {
    /// Short identifier for the rule.
    pub name: String,
    /// Regex applied to file content.
    pub pattern: String,
    /// What the rule is about, shown to the reviewer model.
    pub description: String,
    /// Severity label for matches.
    #[serde(default = "default_rule_severity")]
    pub severity: String,
}

fn default_rule_severity() -> String {
    "medium".into()
}

/// Model selection and generation parameters for this repository.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AiPolicy {
    /// Provider name; unset means the service default.
    pub provider: Option<String>,
    /// Model identifier override.
    pub model_id: Option<String>,
    /// Sampling temperature override.
    pub temperature: Option<f32>,
    /// Token limit override.
    pub max_tokens: Option<u32>,
    /// Extra instructions prepended to the review prompt.
    pub custom_instructions: Option<String>,
    /// Whether to attempt a fallback provider after a failure.
    #[serde(default)]
    pub enable_fallback: bool,
    /// The fallback provider's name.
    pub fallback_provider: Option<String>,
}

/// Partially specified policy as committed to a repository (`.heimdall.yml`).
///
/// Every field is optional; see [`ReviewPolicy::merged_with`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PolicyDocument {
    pub general: Option<GeneralDocument>,
    pub focus: Option<FocusDocument>,
    pub severity: Option<SeverityDocument>,
    pub files: Option<FilesDocument>,
    pub custom_rules: Option<Vec<CustomRule>>,
    pub ai: Option<AiDocument>,
}

impl PolicyDocument {
    /// Parse a policy document from YAML.
    ///
    /// # Errors
    ///
    /// Returns [`HeimdallError::Policy`](heimdall_core::HeimdallError::Policy)
    /// when the content is not a valid policy document.
    pub fn from_yaml(content: &str) -> heimdall_core::Result<Self> {
        serde_yaml::from_str(content).map_err(|e| {
            heimdall_core::HeimdallError::Policy(format!("invalid policy document: {e}"))
        })
    }
}

/// Partial `general` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GeneralDocument {
    pub enabled: Option<bool>,
    pub min_size: Option<usize>,
    pub max_size: Option<usize>,
    pub style: Option<String>,
}

/// Partial `focus` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FocusDocument {
    pub code_quality: Option<bool>,
    pub security: Option<bool>,
    pub performance: Option<bool>,
    pub maintainability: Option<bool>,
    pub error_handling: Option<bool>,
    pub documentation: Option<bool>,
    pub testing: Option<bool>,
}

/// Partial `severity` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeverityDocument {
    pub critical: Option<bool>,
    pub high: Option<bool>,
    pub medium: Option<bool>,
    pub low: Option<bool>,
    pub info: Option<bool>,
}

/// Partial `files` section. Arrays replace the defaults wholesale.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilesDocument {
    pub include: Option<Vec<String>>,
    pub exclude: Option<Vec<String>>,
}

/// Partial `ai` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AiDocument {
    pub provider: Option<String>,
    pub model_id: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub custom_instructions: Option<String>,
    pub enable_fallback: Option<bool>,
    pub fallback_provider: Option<String>,
}

fn merge_general(base: &mut GeneralPolicy, doc: &GeneralDocument) {
    if let Some(v) = doc.enabled {
        base.enabled = v;
    }
    if let Some(v) = doc.min_size {
        base.min_size = v;
    }
    if let Some(v) = doc.max_size {
        base.max_size = v;
    }
    if let Some(v) = &doc.style {
        base.style = v.clone();
    }
}

fn merge_focus(base: &mut FocusAreas, doc: &FocusDocument) {
    if let Some(v) = doc.code_quality {
        base.code_quality = v;
    }
    if let Some(v) = doc.security {
        base.security = v;
    }
    if let Some(v) = doc.performance {
        base.performance = v;
    }
    if let Some(v) = doc.maintainability {
        base.maintainability = v;
    }
    if let Some(v) = doc.error_handling {
        base.error_handling = v;
    }
    if let Some(v) = doc.documentation {
        base.documentation = v;
    }
    if let Some(v) = doc.testing {
        base.testing = v;
    }
}

fn merge_severity(base: &mut SeverityLevels, doc: &SeverityDocument) {
    if let Some(v) = doc.critical {
        base.critical = v;
    }
    if let Some(v) = doc.high {
        base.high = v;
    }
    if let Some(v) = doc.medium {
        base.medium = v;
    }
    if let Some(v) = doc.low {
        base.low = v;
    }
    if let Some(v) = doc.info {
        base.info = v;
    }
}

fn merge_files(base: &mut FilePatterns, doc: &FilesDocument) {
    if let Some(v) = &doc.include {
        base.include = v.clone();
    }
    if let Some(v) = &doc.exclude {
        base.exclude = v.clone();
    }
}

fn merge_ai(base: &mut AiPolicy, doc: &AiDocument) {
    if let Some(v) = &doc.provider {
        base.provider = Some(v.clone());
    }
    if let Some(v) = &doc.model_id {
        base.model_id = Some(v.clone());
    }
    if let Some(v) = doc.temperature {
        base.temperature = Some(v);
    }
    if let Some(v) = doc.max_tokens {
        base.max_tokens = Some(v);
    }
    if let Some(v) = &doc.custom_instructions {
        base.custom_instructions = Some(v.clone());
    }
    if let Some(v) = doc.enable_fallback {
        base.enable_fallback = v;
    }
    if let Some(v) = &doc.fallback_provider {
        base.fallback_provider = Some(v.clone());
    }
}
