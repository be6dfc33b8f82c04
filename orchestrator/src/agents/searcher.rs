// Search Agent: runs one web search and condenses the hits into a cited summary

use async_trait::async_trait;
use tracing::{info, warn};

use super::llm::LlmClient;
use super::web_search::{format_hits, WebSearchTool};
use super::Searcher;
use crate::error::AgentResult;
use crate::models::{SearchItem, SearchSummary};

const TEMPERATURE: f32 = 0.2;

const INSTRUCTIONS: &str = "\
You receive a search term, the reason for it, and web results formatted as
- <title>\\n  URL: <url>\\n  Date: <date>\\n  Snippet: <text>

Write a factual summary of at most 220 words that answers the reason for the search with
concrete names, products, dates and figures. Use ONLY the URLs provided; never invent links.
Prefer the newest items. If results mix different entities with the same name, pick one and
say so in the first sentence. If there are too few recent items, say so instead of guessing.
Return 3-6 distinct sources from the provided list.

Output ONLY json as {\"summary\": \"...\", \"sources\": [{\"title\": \"...\", \"url\": \"...\", \"date\": \"...\"}]}";

pub struct SearchAgent {
    llm: LlmClient,
    tool: WebSearchTool,
    model: String,
}

impl SearchAgent {
    pub fn new(llm: LlmClient, tool: WebSearchTool, model: String) -> Self {
        Self { llm, tool, model }
    }
}

#[async_trait]
impl Searcher for SearchAgent {
    async fn search(&self, item: &SearchItem) -> AgentResult<SearchSummary> {
        info!("Searcher: Searching for: {}", item.query);

        let results = match self.tool.run(&item.query).await {
            Ok(hits) => format_hits(&hits),
            Err(e) => {
                warn!(query = %item.query, error = %e, "Web search failed");
                format!("(web search failed: {e})")
            }
        };

        let input = format!(
            "Search term: {}\nReason for searching: {}\n\nWeb search results (use only these URLs):\n{}",
            item.query, item.reason, results
        );
        self.llm
            .structured(&self.model, INSTRUCTIONS, &input, TEMPERATURE)
            .await
    }
}
