use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use heimdall_core::{HeimdallError, Metrics, Result};

use crate::provider::{InvokeOptions, ModelProvider};

/// Outcome of a completed model invocation.
///
/// # Examples
///
/// ```
/// use heimdall_model::ModelInvocationResult;
///
/// let result = ModelInvocationResult {
///     content: "LGTM".into(),
///     provider_name: "anthropic".into(),
///     model_id: None,
///     used_fallback: false,
/// };
/// assert!(!result.used_fallback);
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInvocationResult {
    /// The generated review text.
    pub content: String,
    /// Name of the provider that produced the content.
    pub provider_name: String,
    /// The model identifier requested by the caller, if any.
    pub model_id: Option<String>,
    /// Whether the fallback provider produced the content.
    pub used_fallback: bool,
}

/// Registry of model providers with default selection and fallback.
///
/// Registration policy: the first registered provider becomes the default;
/// a later registration whose name matches the configured default name takes
/// over the default slot. Two providers may not share a name — the last
/// registration wins silently.
pub struct ModelManager {
    providers: HashMap<String, Arc<dyn ModelProvider>>,
    default_provider: Option<String>,
    configured_default: Option<String>,
    metrics: Metrics,
}

impl ModelManager {
    /// Create an empty manager.
    ///
    /// `configured_default` is the provider name the operator prefers; it
    /// takes effect when (or if) a provider of that name is registered.
    pub fn new(configured_default: Option<String>, metrics: Metrics) -> Self {
        Self {
            providers: HashMap::new(),
            default_provider: None,
            configured_default,
            metrics,
        }
    }

    /// Register a provider under its own name.
    pub fn register_provider(&mut self, provider: Arc<dyn ModelProvider>) {
        let name = provider.name().to_string();
        if self.default_provider.is_none() {
            self.default_provider = Some(name.clone());
        }
        if self.configured_default.as_deref() == Some(name.as_str()) {
            self.default_provider = Some(name.clone());
        }
        self.providers.insert(name, provider);
    }

    /// Names of registered providers whose configuration is usable.
    pub fn list_available_providers(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .providers
            .values()
            .filter(|p| p.is_available())
            .map(|p| p.name().to_string())
            .collect();
        names.sort();
        names
    }

    /// Name of the provider that will serve requests with no explicit choice.
    pub fn default_provider(&self) -> Option<&str> {
        self.default_provider.as_deref()
    }

    /// Invoke a model with optional single-attempt fallback.
    ///
    /// The primary provider is `options.provider` when that name is
    /// registered, otherwise the default. After a primary failure, the
    /// fallback provider is attempted once iff `options.enable_fallback` is
    /// set and `options.fallback_provider` names a distinct registered
    /// provider; if the fallback also fails, its error (not the primary's)
    /// propagates. There is no retry beyond that single fallback attempt.
    ///
    /// # Errors
    ///
    /// Returns [`HeimdallError::NoProviderAvailable`] when nothing is
    /// registered, or the failing provider's
    /// [`HeimdallError::Provider`](heimdall_core::HeimdallError::Provider).
    pub async fn invoke(
        &self,
        prompt: &str,
        options: &InvokeOptions,
    ) -> Result<ModelInvocationResult> {
        let primary_name = options
            .provider
            .as_deref()
            .filter(|name| self.providers.contains_key(*name))
            .map(str::to_string)
            .or_else(|| self.default_provider.clone())
            .ok_or(HeimdallError::NoProviderAvailable)?;

        let primary = self
            .providers
            .get(&primary_name)
            .ok_or(HeimdallError::NoProviderAvailable)?;

        let primary_err = match self.attempt(primary.as_ref(), prompt, options).await {
            Ok(content) => {
                return Ok(ModelInvocationResult {
                    content,
                    provider_name: primary_name,
                    model_id: options.model_id.clone(),
                    used_fallback: false,
                })
            }
            Err(e) => e,
        };

        let fallback = if options.enable_fallback {
            options
                .fallback_provider
                .as_deref()
                .filter(|name| *name != primary_name)
                .and_then(|name| self.providers.get(name))
        } else {
            None
        };

        let Some(fallback) = fallback else {
            return Err(primary_err);
        };

        warn!(
            primary = %primary_name,
            fallback = %fallback.name(),
            error = %primary_err,
            "primary provider failed, attempting fallback"
        );

        match self.attempt(fallback.as_ref(), prompt, options).await {
            Ok(content) => Ok(ModelInvocationResult {
                content,
                provider_name: fallback.name().to_string(),
                model_id: options.model_id.clone(),
                used_fallback: true,
            }),
            // The fallback's error wins over the primary's.
            Err(fallback_err) => Err(fallback_err),
        }
    }

    async fn attempt(
        &self,
        provider: &dyn ModelProvider,
        prompt: &str,
        options: &InvokeOptions,
    ) -> Result<String> {
        self.metrics.incr_model_calls();
        info!(provider = provider.name(), "invoking model provider");

        match provider.invoke(prompt, options).await {
            Ok(content) => {
                self.metrics.incr_model_successes();
                Ok(content)
            }
            Err(e) => {
                self.metrics.incr_model_failures();
                warn!(provider = provider.name(), error = %e, "model invocation failed");
                Err(e)
            }
        }
    }
}
