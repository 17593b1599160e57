//! Multi-provider model invocation for Heimdall.
//!
//! Exposes the [`ModelProvider`] capability trait, concrete backends for
//! Anthropic and OpenAI-compatible APIs, and the [`ModelManager`] that owns
//! the provider registry, default selection, and single-attempt fallback.

mod anthropic;
mod manager;
mod openai;
mod provider;

pub use anthropic::AnthropicProvider;
pub use manager::{ModelInvocationResult, ModelManager};
pub use openai::OpenAiProvider;
pub use provider::{
    ChatMessage, InvokeOptions, ModelProvider, Role, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE,
};
