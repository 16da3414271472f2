//! # Doppel Index
//!
//! Vector index implementations: an in-process index for development and
//! tests, and a client for a remote vector store service.

pub mod in_memory;
pub mod remote;

pub use in_memory::InMemoryIndex;
pub use remote::RemoteIndex;
