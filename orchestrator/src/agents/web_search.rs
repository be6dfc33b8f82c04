use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::error::{AgentError, AgentResult};

const MAX_RESULTS: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct WebHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
    pub date: String,
}

#[derive(Debug, Deserialize)]
struct SearxResponse {
    #[serde(default)]
    results: Vec<SearxResult>,
}

#[derive(Debug, Deserialize)]
struct SearxResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    content: String,
    #[serde(default, rename = "publishedDate")]
    published_date: Option<String>,
}

/// News search against a SearXNG instance's JSON API.
#[derive(Clone)]
pub struct WebSearchTool {
    http: reqwest::Client,
    endpoint: String,
}

impl WebSearchTool {
    pub fn new(endpoint: impl Into<String>) -> AgentResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent("brief-orchestrator/0.1")
            .timeout(Duration::from_secs(20))
            .build()?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }

    pub async fn run(&self, query: &str) -> AgentResult<Vec<WebHit>> {
        let url = format!("{}/search", self.endpoint.trim_end_matches('/'));
        let response = self
            .http
            .get(url)
            .query(&[
                ("q", query),
                ("format", "json"),
                ("categories", "news"),
                ("time_range", "week"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body: String = response
                .text()
                .await
                .unwrap_or_default()
                .chars()
                .take(512)
                .collect();
            return Err(AgentError::Upstream { status, body });
        }

        let raw: SearxResponse = response.json().await?;
        let hits = normalize_hits(raw.results);
        debug!(query, hits = hits.len(), "Web search finished");
        Ok(hits)
    }
}

fn normalize_hits(results: Vec<SearxResult>) -> Vec<WebHit> {
    results
        .into_iter()
        .filter(|r| !r.url.trim().is_empty())
        .take(MAX_RESULTS)
        .map(|r| WebHit {
            title: r.title.trim().to_string(),
            url: r.url.trim().to_string(),
            snippet: r.content.trim().to_string(),
            date: r.published_date.unwrap_or_default().trim().to_string(),
        })
        .collect()
}

/// Hits as the bullet list the search model is shown.
pub fn format_hits(hits: &[WebHit]) -> String {
    hits.iter()
        .map(|h| {
            format!(
                "- {}\n  URL: {}\n  Date: {}\n  Snippet: {}",
                h.title, h.url, h.date, h.snippet
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_searx_payload_and_drops_linkless_hits() {
        let raw: SearxResponse = serde_json::from_str(
            r#"{"results":[
                {"title":" Acme wins contract ","url":"https://reuters.com/a","content":"...","publishedDate":"2025-05-30T10:00:00"},
                {"title":"no link","url":"","content":"x"},
                {"title":"Acme IR","url":"https://ir.acme.com/q1"}
            ]}"#,
        )
        .unwrap();
        let hits = normalize_hits(raw.results);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].title, "Acme wins contract");
        assert_eq!(hits[0].date, "2025-05-30T10:00:00");
        assert_eq!(hits[1].date, "");
    }

    #[test]
    fn formats_hits_for_prompt() {
        let hits = vec![WebHit {
            title: "T".into(),
            url: "https://x.com".into(),
            snippet: "S".into(),
            date: "2025-01-01".into(),
        }];
        assert_eq!(
            format_hits(&hits),
            "- T\n  URL: https://x.com\n  Date: 2025-01-01\n  Snippet: S"
        );
    }
}
