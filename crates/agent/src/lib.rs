//! # Doppel Agent
//!
//! The tool-routing conversation loop. Each turn: ask the model for a
//! decision, execute any requested tools, feed results back, and repeat
//! until the model answers in plain text or the iteration cap trips.
//!
//! The loop also owns the resumable email escalation flow: a tool can
//! suspend the turn with a question for the human, and the next request on
//! the same session resumes exactly where it left off.

mod escalate;
pub mod inject;
pub mod relay;
pub mod router;

pub use inject::ContextInjector;
pub use relay::{HttpEmailRelay, NoopRelay};
pub use router::{RouterLoop, TurnOutcome};
