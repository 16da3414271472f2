//! Tool abstraction and registry.
//!
//! A tool is a named capability the model can invoke during a turn. Tools
//! receive JSON arguments and return either text (fed back into the loop as
//! a tool result) or a suspension (the turn pauses for human input).

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ToolError;
use crate::provider::ToolDefinition;

/// A tool invocation, after the raw argument string has been parsed.
#[derive(Debug, Clone)]
pub struct ToolCall {
    /// ID assigned by the model for this call
    pub id: String,

    /// Name of the tool
    pub name: String,

    /// Parsed JSON arguments
    pub arguments: Value,
}

/// What a tool execution produced.
#[derive(Debug, Clone)]
pub enum ToolOutput {
    /// Ordinary result text, appended to the session as a tool message.
    Text(String),

    /// The tool needs a human reply before it can finish. The turn ends
    /// here; the session stays suspended until the next user message.
    Suspend(Suspension),
}

/// A request to pause the turn and ask the user something.
#[derive(Debug, Clone)]
pub struct Suspension {
    /// The text shown to the user (e.g. a consent question).
    pub prompt: String,

    /// The underlying question the tool was asked to escalate.
    pub question: String,
}

/// A capability the model may invoke.
///
/// Implementations must be `Send + Sync` so the registry can be shared
/// across request handlers.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique name, as presented to the model.
    fn name(&self) -> &str;

    /// Human-readable description, used by the model to decide when to call.
    fn description(&self) -> &str;

    /// JSON Schema for the arguments object.
    fn parameters_schema(&self) -> Value;

    /// Execute the tool with the given arguments.
    async fn execute(&self, arguments: Value) -> Result<ToolOutput, ToolError>;

    /// The definition advertised to the provider on every decision step.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// Registry of all tools available to the routing loop.
///
/// Built once at startup and shared immutably afterwards.
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool. Later registrations with the same name replace
    /// earlier ones.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Look up a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    /// Definitions for every registered tool, for the provider request.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|t| t.to_definition()).collect()
    }

    /// Names of all registered tools.
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}
