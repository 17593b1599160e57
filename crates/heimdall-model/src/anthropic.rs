use std::time::Duration;

use async_trait::async_trait;

use heimdall_core::{HeimdallError, ProviderSettings, Result};

use crate::provider::{
    ChatMessage, InvokeOptions, ModelProvider, Role, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE,
};

const PROVIDER_NAME: &str = "anthropic";
const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
const API_VERSION: &str = "2023-06-01";

/// Anthropic Messages API backend.
///
/// # Examples
///
/// ```
/// use heimdall_core::ProviderSettings;
/// use heimdall_model::{AnthropicProvider, ModelProvider};
///
/// let settings = ProviderSettings {
///     api_key: Some("sk-ant-test".into()),
///     ..ProviderSettings::default()
/// };
/// let provider = AnthropicProvider::new(&settings).unwrap();
/// assert_eq!(provider.name(), "anthropic");
/// assert!(provider.is_available());
/// ```
pub struct AnthropicProvider {
    client: reqwest::Client,
    settings: ProviderSettings,
}

impl AnthropicProvider {
    /// Create a provider from backend settings.
    ///
    /// # Errors
    ///
    /// Returns [`HeimdallError::Provider`] if the HTTP client cannot be built.
    pub fn new(settings: &ProviderSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| HeimdallError::Provider {
                provider: PROVIDER_NAME.into(),
                message: format!("failed to create HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
            settings: settings.clone(),
        })
    }

    fn request_body(&self, prompt: &str, options: &InvokeOptions) -> serde_json::Value {
        let model = options
            .model_id
            .as_deref()
            .or(self.settings.model.as_deref())
            .unwrap_or(DEFAULT_MODEL);
        let max_tokens = options.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS);
        let temperature = options.temperature.unwrap_or(DEFAULT_TEMPERATURE);

        let messages = vec![ChatMessage {
            role: Role::User,
            content: prompt.to_string(),
        }];

        serde_json::json!({
            "model": model,
            "max_tokens": max_tokens,
            "temperature": temperature,
            "messages": self.format_messages(&messages),
        })
    }

    fn extract_text(body: &serde_json::Value) -> String {
        body.get("content")
            .and_then(|c| c.as_array())
            .and_then(|blocks| {
                blocks
                    .iter()
                    .find(|b| b.get("type").and_then(|t| t.as_str()) == Some("text"))
            })
            .and_then(|b| b.get("text"))
            .and_then(|t| t.as_str())
            .unwrap_or_default()
            .to_string()
    }
}

#[async_trait]
impl ModelProvider for AnthropicProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn is_available(&self) -> bool {
        self.settings
            .api_key
            .as_deref()
            .is_some_and(|key| !key.is_empty())
    }

    fn format_messages(&self, messages: &[ChatMessage]) -> serde_json::Value {
        // The Messages API only accepts "user" and "assistant" roles;
        // system-role content travels as a user turn.
        let native: Vec<serde_json::Value> = messages
            .iter()
            .map(|m| {
                let role = match m.role {
                    Role::Assistant => "assistant",
                    Role::System | Role::User => "user",
                };
                serde_json::json!({
                    "role": role,
                    "content": [{ "type": "text", "text": m.content }],
                })
            })
            .collect();
        serde_json::Value::Array(native)
    }

    async fn invoke(&self, prompt: &str, options: &InvokeOptions) -> Result<String> {
        let api_key = self
            .settings
            .api_key
            .as_deref()
            .ok_or_else(|| HeimdallError::Provider {
                provider: PROVIDER_NAME.into(),
                message: "no API key configured".into(),
            })?;

        let base_url = self
            .settings
            .base_url
            .as_deref()
            .unwrap_or("https://api.anthropic.com");
        let url = format!("{base_url}/v1/messages");
        let body = self.request_body(prompt, options);

        let response = self
            .client
            .post(&url)
            .header("x-api-key", api_key)
            .header("anthropic-version", API_VERSION)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| HeimdallError::Provider {
                provider: PROVIDER_NAME.into(),
                message: format!("request failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(HeimdallError::Provider {
                provider: PROVIDER_NAME.into(),
                message: format!("API error {status}: {body_text}"),
            });
        }

        let response_body: serde_json::Value =
            response.json().await.map_err(|e| HeimdallError::Provider {
                provider: PROVIDER_NAME.into(),
                message: format!("failed to parse response: {e}"),
            })?;

        Ok(Self::extract_text(&response_body))
    }
}
