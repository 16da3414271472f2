//! Email relay abstraction.
//!
//! Escalation ends with exactly one email to the owner. The relay is a
//! trait so the hosted relay client and test doubles share a seam.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::RelayError;

/// An email handed to the relay for delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cc: Option<String>,
}

/// The owner the agent speaks for.
#[derive(Debug, Clone)]
pub struct OwnerContact {
    pub name: String,
    pub email: Option<String>,
}

/// Sends email on the agent's behalf.
#[async_trait]
pub trait EmailRelay: Send + Sync {
    async fn send(&self, email: OutboundEmail) -> Result<(), RelayError>;
}
