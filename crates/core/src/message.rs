//! Message and Session domain types.
//!
//! These are the core value objects that flow through the whole system:
//! a user sends a message → the gateway resolves a Session → the routing
//! loop processes it → the provider generates a response.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a session (one conversation).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The role of a message sender in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user
    User,
    /// The agent
    Assistant,
    /// Fixed instructions (the persona preamble — never persisted)
    System,
    /// Tool execution result
    Tool,
}

/// A single message in a session's history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique message ID
    pub id: String,

    /// Who sent this message
    pub role: Role,

    /// The text content
    pub content: String,

    /// Tool calls requested by the assistant (if any)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<MessageToolCall>,

    /// If this is a tool result, which tool call it answers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,

    /// Timestamp
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::with_role(Role::User, content)
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_role(Role::Assistant, content)
    }

    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::with_role(Role::System, content)
    }

    /// Create a tool result message.
    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: Some(tool_call_id.into()),
            ..Self::with_role(Role::Tool, content)
        }
    }

    fn with_role(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
            timestamp: Utc::now(),
        }
    }
}

/// A tool call embedded in an assistant message.
///
/// Arguments arrive from the provider as a raw JSON string; the routing loop
/// parses them into a value just before dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageToolCall {
    /// Unique ID for this tool call
    pub id: String,

    /// Name of the tool to invoke
    pub name: String,

    /// Arguments as a JSON string
    pub arguments: String,
}

/// Where a suspended escalation flow is waiting for the human.
///
/// Persisted inside the Session so a reply arriving in a later HTTP request
/// resumes the correct pending step. The `call_id` is the continuation token:
/// it ties the eventual outcome back to the tool call that suspended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum EscalationState {
    /// Waiting for a yes/no consent reply.
    AwaitingConsent { question: String, call_id: String },
    /// Consent given; waiting for an optional CC address (or "skip").
    AwaitingCc { question: String, call_id: String },
}

/// A session is an ordered, append-only sequence of messages plus any
/// suspended escalation state. Process-lifetime only; never persisted
/// across restarts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Unique session ID
    pub id: SessionId,

    /// Ordered messages. The persona preamble is NOT stored here — the
    /// routing loop prepends it transiently before every decision step.
    pub messages: Vec<Message>,

    /// When this session was created
    pub created_at: DateTime<Utc>,

    /// When the last message was appended
    pub updated_at: DateTime<Utc>,

    /// A suspended escalation flow awaiting a human reply, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_escalation: Option<EscalationState>,
}

impl Session {
    /// Create a new empty session with a fresh id.
    pub fn new() -> Self {
        Self::with_id(SessionId::new())
    }

    /// Create a new empty session with the given id.
    pub fn with_id(id: SessionId) -> Self {
        let now = Utc::now();
        Self {
            id,
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
            pending_escalation: None,
        }
    }

    /// Append a message to the history.
    pub fn push(&mut self, message: Message) {
        self.updated_at = Utc::now();
        self.messages.push(message);
    }

    /// Insert a tool result directly after the assistant message that
    /// requested `tool_call_id`, behind any results already answering its
    /// sibling calls. Providers reject tool messages that do not directly
    /// follow their request, so a result arriving late (e.g. after a
    /// suspended escalation resumes) cannot simply be appended. Falls back
    /// to appending when no message carries the call.
    pub fn insert_tool_result(
        &mut self,
        tool_call_id: impl Into<String>,
        content: impl Into<String>,
    ) {
        let tool_call_id = tool_call_id.into();
        let message = Message::tool_result(tool_call_id.clone(), content);

        let Some(request) = self
            .messages
            .iter()
            .position(|m| m.tool_calls.iter().any(|tc| tc.id == tool_call_id))
        else {
            self.push(message);
            return;
        };

        let mut at = request + 1;
        while at < self.messages.len() && self.messages[at].role == Role::Tool {
            at += 1;
        }
        self.updated_at = Utc::now();
        self.messages.insert(at, message);
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_user_message() {
        let msg = Message::user("Hello there!");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "Hello there!");
        assert!(msg.tool_calls.is_empty());
    }

    #[test]
    fn tool_result_references_call() {
        let msg = Message::tool_result("call_7", "42");
        assert_eq!(msg.role, Role::Tool);
        assert_eq!(msg.tool_call_id.as_deref(), Some("call_7"));
    }

    #[test]
    fn session_tracks_updates() {
        let mut session = Session::new();
        let created = session.created_at;

        session.push(Message::user("First message"));
        assert_eq!(session.messages.len(), 1);
        assert!(session.updated_at >= created);
    }

    #[test]
    fn message_serialization_roundtrip() {
        let msg = Message::user("Test message");
        let json = serde_json::to_string(&msg).unwrap();
        let deserialized: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.content, "Test message");
        assert_eq!(deserialized.role, Role::User);
    }

    fn tool_request(id: &str) -> Message {
        let mut msg = Message::assistant("");
        msg.tool_calls = vec![MessageToolCall {
            id: id.into(),
            name: "offer_email".into(),
            arguments: "{}".into(),
        }];
        msg
    }

    #[test]
    fn inserted_tool_result_sits_directly_after_its_call() {
        let mut session = Session::new();
        session.push(Message::user("question"));
        session.push(tool_request("call_1"));
        session.push(Message::assistant("May I email the owner? (yes/no)"));
        session.push(Message::user("no"));

        session.insert_tool_result("call_1", "declined");

        let roles: Vec<Role> = session.messages.iter().map(|m| m.role.clone()).collect();
        assert_eq!(
            roles,
            vec![
                Role::User,
                Role::Assistant,
                Role::Tool,
                Role::Assistant,
                Role::User
            ]
        );
        assert_eq!(session.messages[2].content, "declined");
        assert_eq!(session.messages[2].tool_call_id.as_deref(), Some("call_1"));
    }

    #[test]
    fn inserted_tool_result_goes_behind_sibling_results() {
        let mut session = Session::new();
        let mut request = tool_request("call_1");
        request.tool_calls.push(MessageToolCall {
            id: "call_2".into(),
            name: "current_time".into(),
            arguments: "{}".into(),
        });
        session.push(request);
        session.push(Message::tool_result("call_1", "first result"));
        session.push(Message::user("go on"));

        session.insert_tool_result("call_2", "second result");

        assert_eq!(session.messages[1].content, "first result");
        assert_eq!(session.messages[2].content, "second result");
        assert_eq!(session.messages[3].role, Role::User);
    }

    #[test]
    fn unknown_call_id_falls_back_to_append() {
        let mut session = Session::new();
        session.push(Message::user("hi"));

        session.insert_tool_result("call_missing", "orphan");

        assert_eq!(session.messages.last().unwrap().content, "orphan");
    }

    #[test]
    fn escalation_state_roundtrip() {
        let state = EscalationState::AwaitingCc {
            question: "when was he born?".into(),
            call_id: "call_1".into(),
        };
        let json = serde_json::to_string(&state).unwrap();
        let back: EscalationState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }
}
