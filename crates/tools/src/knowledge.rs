//! Knowledge-base lookup over the owner's profile.
//!
//! Retrieval then synthesis: embed the question, pull the nearest chunks
//! from the profile namespace, and have the model answer from that context
//! alone. An empty retrieval short-circuits to the canonical not-sure reply
//! so the model never improvises personal details.

use std::sync::Arc;

use async_trait::async_trait;
use doppel_core::error::ToolError;
use doppel_core::provider::{EmbeddingRequest, Provider, ProviderRequest};
use doppel_core::tool::{Tool, ToolOutput};
use doppel_core::{Message, Persona, VectorIndex};
use serde_json::{Value, json};
use tracing::debug;

/// Answers personal questions about the owner from the vector index.
pub struct ProfileLookupTool {
    provider: Arc<dyn Provider>,
    index: Arc<dyn VectorIndex>,
    namespace: String,
    embed_model: String,
    synthesis_model: String,
    persona: Persona,
    top_k: usize,
}

impl ProfileLookupTool {
    pub fn new(
        provider: Arc<dyn Provider>,
        index: Arc<dyn VectorIndex>,
        namespace: impl Into<String>,
        embed_model: impl Into<String>,
        synthesis_model: impl Into<String>,
        persona: Persona,
        top_k: usize,
    ) -> Self {
        Self {
            provider,
            index,
            namespace: namespace.into(),
            embed_model: embed_model.into(),
            synthesis_model: synthesis_model.into(),
            persona,
            top_k,
        }
    }

    fn synthesis_prompt(&self, context: &str) -> String {
        format!(
            "{preamble}\n\
             \n\
             Answer the question using ONLY the context below about {owner}. \
             If the context does not contain the answer, say exactly: {not_sure}\n\
             \n\
             Context:\n{context}",
            preamble = self.persona.preamble,
            owner = self.persona.name.trim_end_matches(" Bot"),
            not_sure = self.persona.not_sure_reply(),
        )
    }
}

#[async_trait]
impl Tool for ProfileLookupTool {
    fn name(&self) -> &str {
        "profile_lookup"
    }

    fn description(&self) -> &str {
        "Look up personal information about the owner from the knowledge base. \
         Use this for any question about the owner's background, work, \
         education, projects, or preferences."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The question to look up"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, arguments: Value) -> Result<ToolOutput, ToolError> {
        let query = arguments
            .get("query")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolError::InvalidArguments("missing query".into()))?;

        let embedding = self
            .provider
            .embed(EmbeddingRequest {
                model: self.embed_model.clone(),
                inputs: vec![query.to_string()],
            })
            .await
            .map_err(|e| {
                if e.is_transient() {
                    ToolError::ServiceUnavailable(e.to_string())
                } else {
                    ToolError::ExecutionFailed {
                        tool_name: "profile_lookup".into(),
                        reason: e.to_string(),
                    }
                }
            })?;

        let Some(query_vector) = embedding.embeddings.into_iter().next() else {
            return Err(ToolError::ExecutionFailed {
                tool_name: "profile_lookup".into(),
                reason: "embedding response was empty".into(),
            });
        };

        let chunks = self
            .index
            .search(&self.namespace, &query_vector, self.top_k)
            .await
            .map_err(|e| ToolError::ServiceUnavailable(e.to_string()))?;

        debug!(query, hits = chunks.len(), "Profile lookup retrieval");

        if chunks.is_empty() {
            return Ok(ToolOutput::Text(self.persona.not_sure_reply()));
        }

        let context = chunks
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join("\n---\n");

        let response = self
            .provider
            .complete(ProviderRequest {
                model: self.synthesis_model.clone(),
                messages: vec![
                    Message::system(self.synthesis_prompt(&context)),
                    Message::user(query),
                ],
                temperature: 0.3,
                max_tokens: 512,
                tools: vec![],
            })
            .await
            .map_err(|e| {
                if e.is_transient() {
                    ToolError::ServiceUnavailable(e.to_string())
                } else {
                    ToolError::ExecutionFailed {
                        tool_name: "profile_lookup".into(),
                        reason: e.to_string(),
                    }
                }
            })?;

        Ok(ToolOutput::Text(response.message.content))
    }
}
