// Writer Agent: synthesises the final markdown brief with citations

use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

use super::llm::{extract_json, LlmClient};
use super::Writer;
use crate::error::{AgentError, AgentResult};
use crate::models::{Brief, WriteRequest};

const TEMPERATURE: f32 = 0.34;

const INSTRUCTIONS: &str = "\
You are an intelligence analyst writing a clear, professional, conversational brief.
You receive resolved_topic, scope, timeframe_text, an optional evidence_note,
ProvidedSources (title | url | date lines) and SearchSummaries.

Use ONLY ProvidedSources for links and never invent URLs. Answer the question first, then add
context. Be specific about products, partners, numbers and dates. If fresh data is limited
or an evidence_note is present, say so briefly. Keep links out of bullets.

Layout:
# Intelligence Brief: <resolved_topic>
## <section answering the question>
- 3-5 crisp bullets
## <section adding context: partnerships, risks, competitors>
- 3-5 bullets
## Conclusion
2-3 plain sentences.
## Sources
- [Title](URL) - Date, only sources actually used, no duplicates.

Output ONLY json as {\"markdown\": \"...\"} with all content inside markdown.";

#[derive(Deserialize)]
struct BriefPayload {
    markdown: String,
}

pub struct WriterAgent {
    llm: LlmClient,
    model: String,
}

impl WriterAgent {
    pub fn new(llm: LlmClient, model: String) -> Self {
        Self { llm, model }
    }
}

pub fn render_request(request: &WriteRequest) -> String {
    let mut input = format!(
        "resolved_topic: {}\nscope: {}\ntimeframe_text: {}\n",
        request.resolved_topic, request.scope, request.timeframe_text
    );
    if let Some(note) = &request.evidence_note {
        input.push_str(&format!("evidence_note: {note}\n"));
    }

    input.push_str("ProvidedSources:\n");
    for source in &request.provided_sources {
        input.push_str(&format!("- {} | {} | {}\n", source.title, source.url, source.date));
    }

    input.push_str("\nSearchSummaries:\n");
    for summary in request.summaries.iter().filter(|s| !s.summary.trim().is_empty()) {
        input.push_str(&format!("- {}\n", summary.summary));
    }
    input
}

/// `{"markdown": ...}` when the reply is JSON, otherwise the raw reply is the brief.
pub fn parse_brief(text: &str) -> AgentResult<Brief> {
    let markdown = match extract_json(text) {
        Ok(value) => match serde_json::from_value::<BriefPayload>(value) {
            Ok(payload) => payload.markdown,
            Err(_) => text.to_string(),
        },
        Err(_) => text.to_string(),
    };

    if markdown.trim().is_empty() {
        return Err(AgentError::MalformedOutput("empty brief".to_string()));
    }
    Ok(Brief { markdown })
}

#[async_trait]
impl Writer for WriterAgent {
    async fn write(&self, request: &WriteRequest) -> AgentResult<Brief> {
        info!("Writer: Writing brief for: {}", request.resolved_topic);

        let input = render_request(request);
        let text = self
            .llm
            .complete(&self.model, INSTRUCTIONS, &input, TEMPERATURE, true)
            .await?;
        parse_brief(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ScoredCandidate, Scope, SearchSummary};

    fn request(note: Option<&str>) -> WriteRequest {
        WriteRequest {
            resolved_topic: "Acme Corp".into(),
            scope: Scope::Company,
            timeframe_text: "last 30 days".into(),
            evidence_note: note.map(str::to_string),
            provided_sources: vec![ScoredCandidate {
                title: "Acme beats".into(),
                url: "https://reuters.com/a".into(),
                date: "2025-05-30".into(),
                published: None,
                score: 3.6,
            }],
            summaries: vec![
                SearchSummary { summary: "Acme grew.".into(), sources: vec![] },
                SearchSummary { summary: "  ".into(), sources: vec![] },
            ],
        }
    }

    #[test]
    fn request_lists_sources_and_summaries() {
        let text = render_request(&request(None));
        assert!(text.starts_with("resolved_topic: Acme Corp\nscope: Company\ntimeframe_text: last 30 days\n"));
        assert!(text.contains("- Acme beats | https://reuters.com/a | 2025-05-30\n"));
        assert!(text.ends_with("SearchSummaries:\n- Acme grew.\n"));
        assert!(!text.contains("evidence_note"));
    }

    #[test]
    fn evidence_note_is_included_when_present() {
        let text = render_request(&request(Some("thin")));
        assert!(text.contains("evidence_note: thin\n"));
    }

    #[test]
    fn brief_from_json_or_raw_text() {
        assert_eq!(parse_brief(r##"{"markdown":"# Brief"}"##).unwrap().markdown, "# Brief");
        assert_eq!(parse_brief("# Plain brief").unwrap().markdown, "# Plain brief");
        assert!(parse_brief("   ").is_err());
    }
}
