use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use heimdall_core::Result;

/// Backend-agnostic fallback when neither the call nor the provider
/// configuration specifies a token limit.
pub const DEFAULT_MAX_TOKENS: u32 = 1000;

/// Backend-agnostic fallback sampling temperature.
pub const DEFAULT_TEMPERATURE: f32 = 0.3;

/// A message in a chat conversation with the model.
///
/// # Examples
///
/// ```
/// use heimdall_model::{ChatMessage, Role};
///
/// let msg = ChatMessage {
///     role: Role::User,
///     content: "Review this code".into(),
/// };
/// assert!(matches!(msg.role, Role::User));
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    /// Role of the message sender.
    pub role: Role,
    /// Text content of the message.
    pub content: String,
}

/// Role in the chat conversation.
///
/// # Examples
///
/// ```
/// use heimdall_model::Role;
///
/// let role = Role::System;
/// assert_eq!(serde_json::to_string(&role).unwrap(), "\"system\"");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System-level instructions.
    System,
    /// User input.
    User,
    /// Assistant response.
    Assistant,
}

/// Options for a single model invocation.
///
/// Provider selection and fallback control are consumed by the
/// [`ModelManager`](crate::ModelManager); the generation parameters are
/// consumed by the selected provider, with precedence
/// per-call option > provider configured default > backend constant.
///
/// # Examples
///
/// ```
/// use heimdall_model::InvokeOptions;
///
/// let options = InvokeOptions {
///     max_tokens: Some(2000),
///     ..InvokeOptions::default()
/// };
/// assert!(!options.enable_fallback);
/// ```
#[derive(Debug, Clone, Default)]
pub struct InvokeOptions {
    /// Provider to use instead of the manager's default.
    pub provider: Option<String>,
    /// Model identifier override.
    pub model_id: Option<String>,
    /// Maximum tokens to generate.
    pub max_tokens: Option<u32>,
    /// Sampling temperature.
    pub temperature: Option<f32>,
    /// Whether to attempt the fallback provider after a primary failure.
    pub enable_fallback: bool,
    /// Name of the fallback provider.
    pub fallback_provider: Option<String>,
}

/// A named model backend capable of turning a prompt into review text.
///
/// Backends are functionally interchangeable at this boundary; the manager
/// never special-cases a provider name.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Registry name of this backend (e.g. `"anthropic"`).
    fn name(&self) -> &str;

    /// Whether the backend is configured for use.
    ///
    /// This is a pure configuration check (credentials present); it never
    /// performs a network probe.
    fn is_available(&self) -> bool;

    /// Convert chat messages into the backend-native message list.
    fn format_messages(&self, messages: &[ChatMessage]) -> serde_json::Value;

    /// Send `prompt` to the backend and return the generated text.
    ///
    /// An empty or missing content block in the response yields an empty
    /// string rather than an error; transport and API failures surface as
    /// [`HeimdallError::Provider`](heimdall_core::HeimdallError::Provider).
    async fn invoke(&self, prompt: &str, options: &InvokeOptions) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_message_serializes() {
        let msg = ChatMessage {
            role: Role::System,
            content: "hello".into(),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "system");
        assert_eq!(json["content"], "hello");
    }

    #[test]
    fn invoke_options_default_disables_fallback() {
        let options = InvokeOptions::default();
        assert!(!options.enable_fallback);
        assert!(options.provider.is_none());
        assert!(options.fallback_provider.is_none());
    }
}
