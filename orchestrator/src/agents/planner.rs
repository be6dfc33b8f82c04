// Planner Agent: turns a free-text question into a focused search plan

use async_trait::async_trait;
use tracing::info;

use super::llm::LlmClient;
use super::Planner;
use crate::error::AgentResult;
use crate::models::{PlanDirectives, SearchPlan};

const TEMPERATURE: f32 = 0.3;

const INSTRUCTIONS: &str = "\
You plan web searches for an intelligence brief about a company or a sector.

Decide whether the question is about a Company or a Sector and set \"scope\" accordingly.
Pick ONE entity when the name is ambiguous, put its canonical name in \"resolved_topic\",
and add negative keywords to queries to keep other entities out.

Every query must contain the resolved_topic plus at least one intent term taken from the
question (launch, layoffs, earnings, pricing, partnerships, regulation, outages, ...) and a
recency hint. Prefer the last 30 days. Mix official sources (investor relations, newsroom,
filings, regulators) with credible press (Reuters, Bloomberg, WSJ, FT, CNBC).
Drop queries that differ from another only by a minor word.

Control lines that may precede the request:
- TIGHTEN:true means use stricter operators (intitle:, site:, filetype:pdf), a narrower
  window (last 7-30 days) and no opinion pieces.
- MAX_QUERIES:n means never return more than n searches.

Company scope: 4-6 searches. Sector scope: 6-8 searches.

Output JSON only:
{\"scope\": \"Company|Sector\", \"resolved_topic\": \"...\", \"timeframe\": \"last 30 days\",
 \"searches\": [{\"query\": \"...\", \"reason\": \"...\"}]}";

pub struct PlannerAgent {
    llm: LlmClient,
    model: String,
}

impl PlannerAgent {
    pub fn new(llm: LlmClient, model: String) -> Self {
        Self { llm, model }
    }
}

/// Planner request text, with control lines first when directives are set.
pub fn render_request(topic: &str, directives: PlanDirectives) -> String {
    let mut input = String::new();
    if directives.tighten {
        input.push_str("TIGHTEN:true\n");
    }
    if let Some(max) = directives.max_queries {
        input.push_str(&format!("MAX_QUERIES:{max}\n"));
    }
    input.push_str(&format!(
        "Topic: {topic}\nGoal: Plan searches for an Intelligence Brief."
    ));
    input
}

#[async_trait]
impl Planner for PlannerAgent {
    async fn plan(&self, topic: &str, directives: PlanDirectives) -> AgentResult<SearchPlan> {
        info!(tighten = directives.tighten, "Planner: Planning searches for: {}", topic);

        let input = render_request(topic, directives);
        self.llm
            .structured(&self.model, INSTRUCTIONS, &input, TEMPERATURE)
            .await
    }
}
