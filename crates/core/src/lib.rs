//! # Doppel Core
//!
//! Domain types, traits, and error definitions for the Doppel personal agent
//! backend. This crate has **zero framework dependencies** — it defines the
//! domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator (language model, vector index, email relay,
//! tool) is defined as a trait here. Implementations live in their respective
//! crates. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with mock/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod error;
pub mod index;
pub mod message;
pub mod persona;
pub mod provider;
pub mod relay;
pub mod retry;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{Error, Result};
pub use index::{IndexRecord, ScoredChunk, VectorIndex};
pub use message::{EscalationState, Message, Role, Session, SessionId};
pub use persona::Persona;
pub use provider::{Provider, ProviderRequest, ProviderResponse, ToolDefinition};
pub use relay::{EmailRelay, OutboundEmail, OwnerContact};
pub use tool::{Suspension, Tool, ToolCall, ToolOutput, ToolRegistry};
