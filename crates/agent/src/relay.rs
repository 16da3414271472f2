//! Email relay implementations.

use async_trait::async_trait;
use doppel_core::error::RelayError;
use doppel_core::relay::{EmailRelay, OutboundEmail};
use tracing::{info, warn};

/// Client for a hosted email relay service.
///
/// The relay accepts a JSON POST and handles delivery; the agent never
/// speaks SMTP itself.
pub struct HttpEmailRelay {
    url: String,
    token: Option<String>,
    client: reqwest::Client,
}

impl HttpEmailRelay {
    pub fn new(url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            url: url.into(),
            token,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl EmailRelay for HttpEmailRelay {
    async fn send(&self, email: OutboundEmail) -> Result<(), RelayError> {
        let mut request = self.client.post(&self.url).json(&email);
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("Bearer {token}"));
        }

        let response = request
            .send()
            .await
            .map_err(|e| RelayError::SendFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            warn!(%status, "Relay rejected email");
            return Err(RelayError::SendFailed(format!(
                "relay returned {status}"
            )));
        }

        info!(to = %email.to, "Escalation email sent");
        Ok(())
    }
}

/// Relay used when no relay URL is configured. Every send fails with
/// `NotConfigured`, which the escalation flow reports to the user.
pub struct NoopRelay;

#[async_trait]
impl EmailRelay for NoopRelay {
    async fn send(&self, _email: OutboundEmail) -> Result<(), RelayError> {
        Err(RelayError::NotConfigured(
            "no email relay URL configured".into(),
        ))
    }
}
