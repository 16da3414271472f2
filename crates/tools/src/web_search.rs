//! Web search via a Tavily-style search API.

use async_trait::async_trait;
use doppel_core::error::ToolError;
use doppel_core::tool::{Tool, ToolOutput};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

/// Thin client for the search API.
pub struct SearchClient {
    base_url: String,
    api_key: String,
    max_results: u32,
    client: reqwest::Client,
}

impl SearchClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, max_results: u32) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            max_results,
            client: reqwest::Client::new(),
        }
    }

    pub async fn search(&self, query: &str) -> Result<Vec<SearchResult>, ToolError> {
        let url = format!("{}/search", self.base_url);
        debug!(query, "Web search");

        let response = self
            .client
            .post(&url)
            .json(&json!({
                "api_key": self.api_key,
                "query": query,
                "max_results": self.max_results,
            }))
            .send()
            .await
            .map_err(|e| ToolError::ServiceUnavailable(e.to_string()))?;

        let status = response.status();
        if status.is_server_error() {
            return Err(ToolError::ServiceUnavailable(format!(
                "search API returned {status}"
            )));
        }
        if !status.is_success() {
            return Err(ToolError::ExecutionFailed {
                tool_name: "web_search".into(),
                reason: format!("search API returned {status}"),
            });
        }

        let body: SearchResponse = response.json().await.map_err(|e| ToolError::ExecutionFailed {
            tool_name: "web_search".into(),
            reason: format!("bad search response: {e}"),
        })?;

        Ok(body.results)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

/// Formats search hits into short text with titles and URLs.
pub fn format_results(results: &[SearchResult]) -> String {
    if results.is_empty() {
        return "No results found.".into();
    }
    results
        .iter()
        .map(|r| {
            if r.content.is_empty() {
                format!("{} ({})", r.title, r.url)
            } else {
                format!("{} ({})\n{}", r.title, r.url, r.content)
            }
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Searches the web for questions outside the owner's profile.
pub struct WebSearchTool {
    client: SearchClient,
}

impl WebSearchTool {
    pub fn new(client: SearchClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Search the web for current events, news, companies, tools, or \
         anything not covered by the owner's knowledge base."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search term"
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

        let results = self.client.search(query).await?;
        Ok(ToolOutput::Text(format_results(&results)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_search_response() {
        let body = r#"{
            "results": [
                {"title": "Rust Blog", "url": "https://blog.rust-lang.org", "content": "News"},
                {"title": "Docs", "url": "https://doc.rust-lang.org"}
            ]
        }"#;
        let parsed: SearchResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.results.len(), 2);
        assert_eq!(parsed.results[1].content, "");
    }

    #[test]
    fn format_includes_titles_and_urls() {
        let results = vec![
            SearchResult {
                title: "Rust Blog".into(),
                url: "https://blog.rust-lang.org".into(),
                content: "Announcing Rust 1.88".into(),
            },
            SearchResult {
                title: "Docs".into(),
                url: "https://doc.rust-lang.org".into(),
                content: String::new(),
            },
        ];
        let text = format_results(&results);
        assert!(text.contains("Rust Blog (https://blog.rust-lang.org)"));
        assert!(text.contains("Announcing Rust 1.88"));
        assert!(text.contains("Docs (https://doc.rust-lang.org)"));
    }

    #[test]
    fn format_empty_results() {
        assert_eq!(format_results(&[]), "No results found.");
    }

    #[tokio::test]
    async fn missing_query_is_invalid() {
        let tool = WebSearchTool::new(SearchClient::new("http://localhost", "key", 2));
        let err = tool.execute(json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }
}
