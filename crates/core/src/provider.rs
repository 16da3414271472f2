//! Language model provider abstraction.
//!
//! A provider turns a conversation history plus tool definitions into either
//! a final answer or a set of tool calls. The same trait covers embeddings
//! for vector search; providers that cannot embed return `NotConfigured`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProviderError;
use crate::message::Message;

/// A tool definition advertised to the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema for the arguments object
    pub parameters: Value,
}

/// A chat completion request.
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    /// Model identifier (provider-specific)
    pub model: String,

    /// Full message history, including any transient system preamble
    pub messages: Vec<Message>,

    /// Sampling temperature
    pub temperature: f32,

    /// Maximum tokens to generate
    pub max_tokens: u32,

    /// Tools the model may call. Empty means plain text completion.
    pub tools: Vec<ToolDefinition>,
}

/// A chat completion response.
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    /// The assistant message, carrying content and/or tool calls
    pub message: Message,

    /// Which model actually served the request
    pub model: String,

    /// Token usage, if reported
    pub usage: Option<Usage>,
}

/// Token usage as reported by the provider.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// An embedding request.
#[derive(Debug, Clone)]
pub struct EmbeddingRequest {
    pub model: String,
    pub inputs: Vec<String>,
}

/// An embedding response, one vector per input, in order.
#[derive(Debug, Clone)]
pub struct EmbeddingResponse {
    pub embeddings: Vec<Vec<f32>>,
    pub model: String,
}

/// A language model backend.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Provider name, for logging.
    fn name(&self) -> &str;

    /// Run one chat completion.
    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError>;

    /// Embed a batch of texts. Providers without an embedding endpoint keep
    /// the default.
    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse, ProviderError> {
        let _ = request;
        Err(ProviderError::NotConfigured(format!(
            "{} does not support embeddings",
            self.name()
        )))
    }
}
