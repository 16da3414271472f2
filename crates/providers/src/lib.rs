//! # Doppel Providers
//!
//! Language model backends. Currently one implementation: any
//! OpenAI-compatible `/v1/chat/completions` + `/v1/embeddings` endpoint,
//! which covers OpenAI, OpenRouter, Ollama, vLLM, Together, and friends.

pub mod openai;

pub use openai::OpenAiCompatProvider;

use std::sync::Arc;

use doppel_config::LlmConfig;
use doppel_core::Provider;
use doppel_core::error::{Error, ProviderError};

/// Build the configured provider.
pub fn from_config(config: &LlmConfig) -> Result<Arc<dyn Provider>, Error> {
    let api_key = config
        .api_key
        .clone()
        .ok_or(ProviderError::NotConfigured(
            "no LLM API key set (llm.api_key or DOPPEL_LLM_API_KEY)".into(),
        ))?;

    Ok(Arc::new(OpenAiCompatProvider::new(
        "openai",
        config.base_url.clone(),
        api_key,
    )))
}
