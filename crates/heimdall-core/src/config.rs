use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::HeimdallError;

/// Top-level process configuration loaded from `heimdall.toml`.
///
/// Secrets (webhook secret, GitHub token, provider API keys) may be left out
/// of the file and supplied via environment variables instead — see
/// [`HeimdallConfig::apply_env`].
///
/// # Examples
///
/// ```
/// use heimdall_core::HeimdallConfig;
///
/// let config = HeimdallConfig::default();
/// assert_eq!(config.server.bind_addr, "0.0.0.0:8080");
/// assert_eq!(config.ai.default_provider, "anthropic");
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HeimdallConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// GitHub API settings.
    #[serde(default)]
    pub github: GithubConfig,
    /// Model backend settings.
    #[serde(default)]
    pub ai: AiConfig,
}

impl HeimdallConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`HeimdallError::Io`] if the file cannot be read, or
    /// [`HeimdallError::Toml`] if the content is not valid TOML.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use heimdall_core::HeimdallConfig;
    /// use std::path::Path;
    ///
    /// let config = HeimdallConfig::from_file(Path::new("heimdall.toml")).unwrap();
    /// ```
    pub fn from_file(path: &Path) -> Result<Self, HeimdallError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`HeimdallError::Toml`] if parsing fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use heimdall_core::HeimdallConfig;
    ///
    /// let toml = r#"
    /// [server]
    /// bind_addr = "127.0.0.1:9000"
    /// "#;
    /// let config = HeimdallConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.server.bind_addr, "127.0.0.1:9000");
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, HeimdallError> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// Fill unset secret fields from the process environment.
    ///
    /// Reads `HEIMDALL_WEBHOOK_SECRET`, `GITHUB_TOKEN`, `ANTHROPIC_API_KEY`,
    /// and `OPENAI_API_KEY`. Values already present in the file win.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|name| std::env::var(name).ok());
    }

    /// Like [`apply_env`](Self::apply_env) but with an injectable lookup,
    /// so tests do not have to mutate the process environment.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.server.webhook_secret.is_none() {
            self.server.webhook_secret = lookup("HEIMDALL_WEBHOOK_SECRET");
        }
        if self.github.token.is_none() {
            self.github.token = lookup("GITHUB_TOKEN");
        }
        if self.ai.anthropic.api_key.is_none() {
            self.ai.anthropic.api_key = lookup("ANTHROPIC_API_KEY");
        }
        if self.ai.openai.api_key.is_none() {
            self.ai.openai.api_key = lookup("OPENAI_API_KEY");
        }
    }
}

/// HTTP server configuration.
///
/// # Examples
///
/// ```
/// use heimdall_core::ServerConfig;
///
/// let config = ServerConfig::default();
/// assert!(config.webhook_secret.is_none());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the webhook server binds to.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// Shared secret for webhook signature verification.
    pub webhook_secret: Option<String>,
}

fn default_bind_addr() -> String {
    "0.0.0.0:8080".into()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            webhook_secret: None,
        }
    }
}

/// GitHub API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubConfig {
    /// Personal access token or installation token.
    pub token: Option<String>,
    /// API base URL; override for GitHub Enterprise.
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

fn default_api_base() -> String {
    "https://api.github.com".into()
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            token: None,
            api_base: default_api_base(),
        }
    }
}

/// Model backend configuration.
///
/// # Examples
///
/// ```
/// use heimdall_core::AiConfig;
///
/// let config = AiConfig::default();
/// assert_eq!(config.default_provider, "anthropic");
/// assert!(config.anthropic.model.is_none());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    /// Name of the provider used when a review policy does not pick one.
    #[serde(default = "default_provider")]
    pub default_provider: String,
    /// Anthropic backend settings.
    #[serde(default)]
    pub anthropic: ProviderSettings,
    /// OpenAI-compatible backend settings.
    #[serde(default)]
    pub openai: ProviderSettings,
}

fn default_provider() -> String {
    "anthropic".into()
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            default_provider: default_provider(),
            anthropic: ProviderSettings::default(),
            openai: ProviderSettings::default(),
        }
    }
}

/// Per-backend provider settings.
///
/// Every field is optional: a missing model falls through to the backend's
/// built-in default at invocation time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// API key for the backend.
    pub api_key: Option<String>,
    /// Default model identifier for this backend.
    pub model: Option<String>,
    /// Custom base URL for API requests.
    pub base_url: Option<String>,
}
