//! GitHub repository search, scoped to the owner's account.
//!
//! The `username` argument is not exposed to the model; the routing loop
//! injects it before dispatch. Missing username therefore means a wiring
//! problem, reported as invalid arguments.

use async_trait::async_trait;
use doppel_core::error::ToolError;
use doppel_core::tool::{Tool, ToolOutput};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

const GITHUB_API: &str = "https://api.github.com";
const USER_AGENT: &str = "doppel-agent";

/// Searches the owner's public repositories.
pub struct RepoSearchTool {
    base_url: String,
    client: reqwest::Client,
}

impl Default for RepoSearchTool {
    fn default() -> Self {
        Self::new(GITHUB_API)
    }
}

impl RepoSearchTool {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }
}

/// Scope a free-text query to one user's repositories.
fn build_query(username: &str, query: &str) -> String {
    let query = query.trim();
    if query.is_empty() {
        format!("user:{username}")
    } else {
        format!("user:{username} {query}")
    }
}

#[derive(Debug, Deserialize)]
struct RepoSearchResponse {
    #[serde(default)]
    items: Vec<Repo>,
}

#[derive(Debug, Deserialize)]
struct Repo {
    full_name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    stargazers_count: u32,
    html_url: String,
}

fn format_repos(repos: &[Repo]) -> String {
    if repos.is_empty() {
        return "No matching repositories found.".into();
    }
    repos
        .iter()
        .take(5)
        .map(|r| {
            let desc = r.description.as_deref().unwrap_or("no description");
            format!(
                "{} ({} stars): {} — {}",
                r.full_name, r.stargazers_count, desc, r.html_url
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[async_trait]
impl Tool for RepoSearchTool {
    fn name(&self) -> &str {
        "repo_search"
    }

    fn description(&self) -> &str {
        "Search the owner's GitHub repositories by keyword. Use this when \
         asked about the owner's projects or code."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Keywords to match against repository names and descriptions"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, arguments: Value) -> Result<ToolOutput, ToolError> {
        let query = arguments
            .get("query")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolError::InvalidArguments("missing query".into()))?;

        let username = arguments
            .get("username")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                ToolError::InvalidArguments("username was not injected into arguments".into())
            })?;

        let q = build_query(username, query);
        debug!(%q, "Repository search");

        let url = format!("{}/search/repositories", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("q", q.as_str()), ("per_page", "5")])
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/vnd.github+json")
            .send()
            .await
            .map_err(|e| ToolError::ServiceUnavailable(e.to_string()))?;

        let status = response.status();
        if status.is_server_error() {
            return Err(ToolError::ServiceUnavailable(format!(
                "GitHub returned {status}"
            )));
        }
        if !status.is_success() {
            return Err(ToolError::ExecutionFailed {
                tool_name: "repo_search".into(),
                reason: format!("GitHub returned {status}"),
            });
        }

        let body: RepoSearchResponse =
            response.json().await.map_err(|e| ToolError::ExecutionFailed {
                tool_name: "repo_search".into(),
                reason: format!("bad search response: {e}"),
            })?;

        Ok(ToolOutput::Text(format_repos(&body.items)))
    }
}
