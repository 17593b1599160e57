/// Errors that can occur across the Heimdall platform.
///
/// Each variant wraps a specific error domain. Library crates use this type
/// directly; the binary crate converts to `miette::Report` at the boundary.
///
/// # Examples
///
/// ```
/// use heimdall_core::HeimdallError;
///
/// let err = HeimdallError::Config("missing webhook secret".into());
/// assert!(err.to_string().contains("missing webhook secret"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum HeimdallError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// GitHub API or network failure.
    #[error("GitHub API error: {0}")]
    Github(String),

    /// Review-policy fetch or parse failure.
    ///
    /// Recovered locally wherever it occurs: the resolver falls back to
    /// the default policy instead of aborting the review.
    #[error("policy error: {0}")]
    Policy(String),

    /// A model backend rejected or failed an invocation.
    #[error("provider '{provider}' error: {message}")]
    Provider {
        /// Name of the provider that failed.
        provider: String,
        /// Backend error message.
        message: String,
    },

    /// No model provider is registered or selectable for a request.
    #[error("no model provider available")]
    NoProviderAvailable,

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: HeimdallError = io_err.into();
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn provider_error_names_provider() {
        let err = HeimdallError::Provider {
            provider: "anthropic".into(),
            message: "rate limited".into(),
        };
        let text = err.to_string();
        assert!(text.contains("anthropic"));
        assert!(text.contains("rate limited"));
    }

    #[test]
    fn no_provider_available_message() {
        assert_eq!(
            HeimdallError::NoProviderAvailable.to_string(),
            "no model provider available"
        );
    }
}
