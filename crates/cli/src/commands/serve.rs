//! `doppel serve` — start the HTTP gateway.

use std::sync::Arc;

use doppel_config::AppConfig;
use doppel_gateway::AppState;

use crate::bootstrap;

pub async fn run(port_override: Option<u16>) -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    let host = config.gateway.host.clone();
    let port = port_override.unwrap_or(config.gateway.port);
    let allowed_origins = config.gateway.allowed_origins.clone();
    let service_name = config.service_name.clone();

    let runtime = bootstrap::build(config)?;

    let state = Arc::new(AppState {
        agent: runtime.agent,
        sessions: runtime.sessions,
        service_name,
    });

    doppel_gateway::start(state, &host, port, &allowed_origins)
        .await
        .map_err(|e| anyhow::anyhow!("gateway failed: {e}"))
}
