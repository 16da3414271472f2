//! # Doppel Tools
//!
//! The capabilities the model can route to: knowledge-base lookup, web
//! search, current time, GitHub repository search, and the email escalation
//! flow.

pub mod escalate;
pub mod knowledge;
pub mod repo_search;
pub mod time;
pub mod web_search;

pub use escalate::OfferEmailTool;
pub use knowledge::ProfileLookupTool;
pub use repo_search::RepoSearchTool;
pub use time::CurrentTimeTool;
pub use web_search::{SearchClient, WebSearchTool};
