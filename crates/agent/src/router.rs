//! The tool-routing conversation loop.
//!
//! One `run_turn` call handles one user message end to end. The session
//! alternates between asking the model for a decision and executing the
//! tools it requested, until the model answers in plain text. A tool may
//! instead suspend the turn to ask the human something; the suspension is
//! recorded on the session and the next message on that session resumes
//! the flow here before anything else happens.

use std::sync::Arc;

use doppel_core::error::{Error, Result};
use doppel_core::provider::{Provider, ProviderRequest};
use doppel_core::relay::{EmailRelay, OwnerContact};
use doppel_core::tool::{ToolCall, ToolOutput, ToolRegistry};
use doppel_core::{EscalationState, Message, Persona, Session};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::escalate;
use crate::inject::ContextInjector;

const DEFAULT_MAX_ITERATIONS: u32 = 8;

/// How a turn ended: either a final answer or a question for the human.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    Answer(String),
    Suspended { prompt: String },
}

impl TurnOutcome {
    /// The text to show the user either way.
    pub fn text(&self) -> &str {
        match self {
            Self::Answer(text) => text,
            Self::Suspended { prompt } => prompt,
        }
    }
}

/// The routing loop and everything it needs to run a turn.
pub struct RouterLoop {
    provider: Arc<dyn Provider>,
    tools: Arc<ToolRegistry>,
    persona: Persona,
    relay: Arc<dyn EmailRelay>,
    owner: OwnerContact,
    injector: ContextInjector,
    model: String,
    temperature: f32,
    max_tokens: u32,
    max_iterations: u32,
}

impl RouterLoop {
    pub fn new(
        provider: Arc<dyn Provider>,
        tools: Arc<ToolRegistry>,
        persona: Persona,
        relay: Arc<dyn EmailRelay>,
        owner: OwnerContact,
        model: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            tools,
            persona,
            relay,
            owner,
            injector: ContextInjector::disabled(),
            model: model.into(),
            temperature: 0.7,
            max_tokens: 2048,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    pub fn with_injector(mut self, injector: ContextInjector) -> Self {
        self.injector = injector;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    /// Process one user message on a session.
    ///
    /// The caller holds the session lock, so turns on one session are
    /// strictly serial.
    pub async fn run_turn(&self, session: &mut Session, user_message: &str) -> Result<TurnOutcome> {
        session.push(Message::user(user_message));

        if let Some(state) = session.pending_escalation.take() {
            return self.resume_escalation(session, state, user_message).await;
        }

        self.drive_loop(session).await
    }

    /// Resume a suspended escalation with the user's reply.
    ///
    /// The eventual outcome is inserted next to the suspended tool call
    /// rather than appended: by the time it arrives, the consent exchange
    /// sits between the call and its result, and providers reject tool
    /// messages that do not directly follow their request.
    async fn resume_escalation(
        &self,
        session: &mut Session,
        state: EscalationState,
        reply: &str,
    ) -> Result<TurnOutcome> {
        match state {
            EscalationState::AwaitingConsent { question, call_id } => {
                if escalate::is_consent(reply) {
                    session.pending_escalation =
                        Some(EscalationState::AwaitingCc { question, call_id });
                    session.push(Message::assistant(escalate::CC_PROMPT));
                    return Ok(TurnOutcome::Suspended {
                        prompt: escalate::CC_PROMPT.to_string(),
                    });
                }

                debug!(session_id = %session.id, "Escalation declined");
                session.insert_tool_result(call_id, escalate::DECLINE_REPLY);
                self.drive_loop(session).await
            }

            EscalationState::AwaitingCc { question, call_id } => {
                let cc = escalate::parse_cc(reply);
                let result = self.send_escalation(&question, cc).await;
                session.insert_tool_result(call_id, result);
                self.drive_loop(session).await
            }
        }
    }

    /// Send the escalation email exactly once and describe the outcome.
    async fn send_escalation(&self, question: &str, cc: Option<String>) -> String {
        let Some(to) = &self.owner.email else {
            return escalate::NOT_CONFIGURED_REPLY.to_string();
        };

        let email = escalate::compose_email(&self.owner.name, to, question, cc);
        match self.relay.send(email).await {
            Ok(()) => {
                info!(owner = %self.owner.name, "Escalation email sent");
                escalate::sent_reply(&self.owner.name)
            }
            Err(e) => {
                warn!(error = %e, "Escalation email failed");
                escalate::send_failed_reply(&e)
            }
        }
    }

    /// Decision/execution rounds until the model answers in plain text.
    async fn drive_loop(&self, session: &mut Session) -> Result<TurnOutcome> {
        for iteration in 1..=self.max_iterations {
            let response = self
                .provider
                .complete(ProviderRequest {
                    model: self.model.clone(),
                    messages: self.messages_with_preamble(session),
                    temperature: self.temperature,
                    max_tokens: self.max_tokens,
                    tools: self.tools.definitions(),
                })
                .await?;

            let assistant = response.message;
            session.push(assistant.clone());

            if assistant.tool_calls.is_empty() {
                debug!(iteration, "Final answer produced");
                return Ok(TurnOutcome::Answer(assistant.content));
            }

            for requested in &assistant.tool_calls {
                let tool = self
                    .tools
                    .get(&requested.name)
                    .ok_or_else(|| Error::UnknownTool(requested.name.clone()))?;

                let mut call = ToolCall {
                    id: requested.id.clone(),
                    name: requested.name.clone(),
                    arguments: serde_json::from_str(&requested.arguments)
                        .unwrap_or_else(|_| json!({})),
                };
                self.injector.apply(&mut call);

                debug!(tool = %call.name, iteration, "Executing tool");

                match tool.execute(call.arguments).await {
                    Ok(ToolOutput::Text(text)) => {
                        session.push(Message::tool_result(call.id, text));
                    }
                    Ok(ToolOutput::Suspend(suspension)) => {
                        // Remaining calls in this round are abandoned; the
                        // human's reply takes priority over everything else.
                        session.pending_escalation = Some(EscalationState::AwaitingConsent {
                            question: suspension.question,
                            call_id: call.id,
                        });
                        session.push(Message::assistant(suspension.prompt.clone()));
                        return Ok(TurnOutcome::Suspended {
                            prompt: suspension.prompt,
                        });
                    }
                    Err(e) => {
                        // Fed back as a result so the model can route around
                        // the failure or apologize.
                        warn!(tool = %call.name, error = %e, "Tool failed");
                        session.push(Message::tool_result(call.id, format!("Error: {e}")));
                    }
                }
            }
        }

        Err(Error::MaxIterationsExceeded {
            limit: self.max_iterations,
        })
    }

    /// History with the persona preamble prepended transiently. The
    /// preamble is never stored on the session.
    fn messages_with_preamble(&self, session: &Session) -> Vec<Message> {
        let mut messages = Vec::with_capacity(session.messages.len() + 1);
        messages.push(Message::system(self.persona.preamble.clone()));
        messages.extend(session.messages.iter().cloned());
        messages
    }
}
