use std::time::Duration;

use async_trait::async_trait;

use heimdall_core::{HeimdallError, ProviderSettings, Result};

use crate::provider::{
    ChatMessage, InvokeOptions, ModelProvider, Role, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE,
};

const PROVIDER_NAME: &str = "openai";
const DEFAULT_MODEL: &str = "gpt-4o";

/// OpenAI-compatible chat completions backend.
///
/// Works with any provider that exposes the `/v1/chat/completions` endpoint:
/// OpenAI, Ollama, vLLM, LiteLLM, etc.
///
/// # Examples
///
/// ```
/// use heimdall_core::ProviderSettings;
/// use heimdall_model::{ModelProvider, OpenAiProvider};
///
/// let settings = ProviderSettings {
///     api_key: Some("sk-test".into()),
///     ..ProviderSettings::default()
/// };
/// let provider = OpenAiProvider::new(&settings).unwrap();
/// assert_eq!(provider.name(), "openai");
/// ```
pub struct OpenAiProvider {
    client: reqwest::Client,
    settings: ProviderSettings,
}

impl OpenAiProvider {
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
        body.get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .unwrap_or_default()
            .to_string()
    }
}

#[async_trait]
impl ModelProvider for OpenAiProvider {
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
        let native: Vec<serde_json::Value> = messages
            .iter()
            .map(|m| {
                let role = match m.role {
                    Role::System => "system",
                    Role::User => "user",
                    Role::Assistant => "assistant",
                };
                serde_json::json!({ "role": role, "content": m.content })
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
            .unwrap_or("https://api.openai.com");
        let url = format!("{base_url}/v1/chat/completions");
        let body = self.request_body(prompt, options);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {api_key}"))
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

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(api_key: Option<&str>) -> ProviderSettings {
        ProviderSettings {
            api_key: api_key.map(String::from),
            model: None,
            base_url: None,
        }
    }

    #[test]
    fn availability_follows_api_key() {
        assert!(OpenAiProvider::new(&settings(Some("sk-x")))
            .unwrap()
            .is_available());
        assert!(!OpenAiProvider::new(&settings(None)).unwrap().is_available());
    }

    #[test]
    fn request_body_option_precedence() {
        let mut cfg = settings(Some("sk-x"));
        cfg.model = Some("gpt-4o-mini".into());
        let provider = OpenAiProvider::new(&cfg).unwrap();

        let options = InvokeOptions {
            model_id: Some("gpt-4.1".into()),
            ..InvokeOptions::default()
        };
        assert_eq!(provider.request_body("p", &options)["model"], "gpt-4.1");
        assert_eq!(
            provider.request_body("p", &InvokeOptions::default())["model"],
            "gpt-4o-mini"
        );

        let bare = OpenAiProvider::new(&settings(Some("sk-x"))).unwrap();
        let body = bare.request_body("p", &InvokeOptions::default());
        assert_eq!(body["model"], DEFAULT_MODEL);
        assert_eq!(body["max_tokens"], DEFAULT_MAX_TOKENS);
        assert!((body["temperature"].as_f64().unwrap() - f64::from(DEFAULT_TEMPERATURE)).abs() < 1e-6);
    }

    #[test]
    fn format_messages_keeps_openai_roles() {
        let provider = OpenAiProvider::new(&settings(Some("k"))).unwrap();
        let messages = vec![ChatMessage {
            role: Role::System,
            content: "rules".into(),
        }];
        let native = provider.format_messages(&messages);
        assert_eq!(native[0]["role"], "system");
        assert_eq!(native[0]["content"], "rules");
    }

    #[test]
    fn extract_text_reads_first_choice() {
        let body = serde_json::json!({
            "choices": [
                { "message": { "role": "assistant", "content": "looks good" } }
            ]
        });
        assert_eq!(OpenAiProvider::extract_text(&body), "looks good");
    }

    #[test]
    fn extract_text_empty_for_malformed_response() {
        assert_eq!(
            OpenAiProvider::extract_text(&serde_json::json!({ "choices": [] })),
            ""
        );
        assert_eq!(OpenAiProvider::extract_text(&serde_json::json!({})), "");
    }
}
