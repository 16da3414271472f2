//! Shared wiring: build the provider, index, tools, and routing loop from
//! configuration. Every command goes through here so the CLI and the
//! gateway run the exact same agent.

use std::sync::Arc;

use anyhow::Context;
use doppel_agent::{ContextInjector, HttpEmailRelay, NoopRelay, RouterLoop};
use doppel_config::AppConfig;
use doppel_core::relay::{EmailRelay, OwnerContact};
use doppel_core::tool::ToolRegistry;
use doppel_core::{Persona, Provider, VectorIndex};
use doppel_index::{InMemoryIndex, RemoteIndex};
use doppel_ingest::Ingestor;
use doppel_sessions::SessionStore;
use doppel_tools::{
    CurrentTimeTool, OfferEmailTool, ProfileLookupTool, RepoSearchTool, SearchClient,
    WebSearchTool,
};
use tracing::warn;

/// Everything a command needs to run the agent.
pub struct Runtime {
    pub config: AppConfig,
    pub agent: Arc<RouterLoop>,
    pub sessions: Arc<SessionStore>,
    pub provider: Arc<dyn Provider>,
    pub index: Arc<dyn VectorIndex>,
}

impl Runtime {
    /// The ingestor for the configured profile namespace.
    pub fn ingestor(&self) -> Ingestor {
        Ingestor::new(
            Arc::clone(&self.provider),
            Arc::clone(&self.index),
            self.config.index.namespace.clone(),
            self.config.llm.embed_model.clone(),
        )
    }
}

/// Build the full runtime from configuration.
pub fn build(config: AppConfig) -> anyhow::Result<Runtime> {
    let provider =
        doppel_providers::from_config(&config.llm).context("building LLM provider")?;

    let index: Arc<dyn VectorIndex> = match &config.index.url {
        Some(url) => Arc::new(RemoteIndex::new(url.clone(), config.index.api_key.clone())),
        None => {
            warn!("No index URL configured, using the in-memory index");
            Arc::new(InMemoryIndex::new())
        }
    };

    let persona = Persona::load(
        &config.owner.name,
        config.agent.preamble_file.as_deref(),
        config.agent.preamble_override.as_deref(),
    )
    .context("loading persona")?;

    let mut registry = ToolRegistry::new();
    registry.register(Box::new(ProfileLookupTool::new(
        Arc::clone(&provider),
        Arc::clone(&index),
        config.index.namespace.clone(),
        config.llm.embed_model.clone(),
        config.llm.synthesis_model.clone(),
        persona.clone(),
        config.index.top_k,
    )));
    registry.register(Box::new(CurrentTimeTool::with_default(
        &config.agent.default_timezone,
    )));
    registry.register(Box::new(RepoSearchTool::default()));
    registry.register(Box::new(OfferEmailTool::new(config.owner.name.clone())));

    match &config.search.api_key {
        Some(key) => registry.register(Box::new(WebSearchTool::new(SearchClient::new(
            config.search.base_url.clone(),
            key.clone(),
            config.search.max_results,
        )))),
        None => warn!("No search API key configured, web search disabled"),
    }

    let relay: Arc<dyn EmailRelay> = match &config.relay.url {
        Some(url) => Arc::new(HttpEmailRelay::new(url.clone(), config.relay.token.clone())),
        None => Arc::new(NoopRelay),
    };

    let injector = match &config.owner.github_username {
        Some(username) => ContextInjector::new(
            "username",
            username.clone(),
            config.agent.needs_context.iter().cloned(),
        ),
        None => ContextInjector::disabled(),
    };

    let owner = OwnerContact {
        name: config.owner.name.clone(),
        email: config.owner.email.clone(),
    };

    let agent = RouterLoop::new(
        Arc::clone(&provider),
        Arc::new(registry),
        persona,
        relay,
        owner,
        config.llm.chat_model.clone(),
    )
    .with_injector(injector)
    .with_temperature(config.llm.temperature)
    .with_max_tokens(config.llm.max_tokens)
    .with_max_iterations(config.agent.max_iterations);

    Ok(Runtime {
        agent: Arc::new(agent),
        sessions: Arc::new(SessionStore::new()),
        provider,
        index,
        config,
    })
}
