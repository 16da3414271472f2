//! Error types for the Doppel domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all Doppel operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Vector index errors ---
    #[error("Index error: {0}")]
    Index(#[from] IndexError),

    // --- Email relay errors ---
    #[error("Relay error: {0}")]
    Relay(#[from] RelayError),

    /// The decision step named a tool that is not in the registry.
    /// This indicates a programming or configuration error, not a transient
    /// fault, so the routing loop treats it as fatal for the turn.
    #[error("Unknown tool requested by the model: {0}")]
    UnknownTool(String),

    /// The routing loop ran more decision rounds than allowed without
    /// reaching a final answer.
    #[error("Routing loop exceeded {limit} tool iterations without a final answer")]
    MaxIterationsExceeded { limit: u32 },

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Network error: {0}")]
    Network(String),
}

impl ProviderError {
    /// Whether a bounded retry with backoff is worthwhile.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Network(_)
                | Self::RateLimited { .. }
                | Self::ApiError { status_code: 500..=599, .. }
        )
    }
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool execution failed: {tool_name} — {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("External service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),
}

impl ToolError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::ServiceUnavailable(_))
    }
}

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("Index storage error: {0}")]
    Storage(String),

    #[error("Index unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Email relay not configured: {0}")]
    NotConfigured(String),

    #[error("Email send failed: {0}")]
    SendFailed(String),
}
