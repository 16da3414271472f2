//! Email escalation entry point.
//!
//! This tool never sends anything itself. It suspends the turn with a
//! consent question; the routing loop owns the rest of the flow (consent,
//! optional CC, the single send) across later requests.

use async_trait::async_trait;
use doppel_core::error::ToolError;
use doppel_core::tool::{Suspension, Tool, ToolOutput};
use serde_json::{Value, json};

/// Offers to email the owner when no confident answer was found.
pub struct OfferEmailTool {
    owner_name: String,
}

impl OfferEmailTool {
    pub fn new(owner_name: impl Into<String>) -> Self {
        Self {
            owner_name: owner_name.into(),
        }
    }
}

#[async_trait]
impl Tool for OfferEmailTool {
    fn name(&self) -> &str {
        "offer_email"
    }

    fn description(&self) -> &str {
        "Offer to escalate by email when neither the knowledge base nor the \
         web produced a confident answer. Pass the user's original question."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "question": {
                    "type": "string",
                    "description": "The question the agent could not answer"
                }
            },
            "required": ["question"]
        })
    }

    async fn execute(&self, arguments: Value) -> Result<ToolOutput, ToolError> {
        let question = arguments
            .get("question")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolError::InvalidArguments("missing question".into()))?;

        Ok(ToolOutput::Suspend(Suspension {
            prompt: format!(
                "I couldn't find a confident answer via my knowledge base or the web.\n\
                 Do you want me to email this question to {} for a reply? (yes/no)",
                self.owner_name
            ),
            question: question.to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn suspends_with_consent_prompt() {
        let tool = OfferEmailTool::new("Aayushmaan");
        let out = tool
            .execute(json!({"question": "When is his birthday?"}))
            .await
            .unwrap();

        match out {
            ToolOutput::Suspend(s) => {
                assert!(s.prompt.contains("email this question to Aayushmaan"));
                assert!(s.prompt.contains("(yes/no)"));
                assert_eq!(s.question, "When is his birthday?");
            }
            ToolOutput::Text(_) => panic!("expected suspension"),
        }
    }

    #[tokio::test]
    async fn missing_question_is_invalid() {
        let tool = OfferEmailTool::new("Aayushmaan");
        let err = tool.execute(json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }
}
