use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

// Research data model

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scope {
    #[serde(alias = "company", alias = "COMPANY")]
    Company,
    #[serde(alias = "sector", alias = "SECTOR")]
    Sector,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Company => write!(f, "Company"),
            Scope::Sector => write!(f, "Sector"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchItem {
    pub query: String,
    #[serde(default)]
    pub reason: String,
}

impl SearchItem {
    pub fn new(query: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchPlan {
    pub scope: Scope,
    pub resolved_topic: String,
    /// Free-form, e.g. "last 30 days".
    #[serde(default)]
    pub timeframe: String,
    #[serde(default)]
    pub searches: Vec<SearchItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceItem {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSummary {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub sources: Vec<SourceItem>,
}

/// A merged source with its relevance score. Rebuilt on every merge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredCandidate {
    pub title: String,
    pub url: String,
    pub date: String,
    #[serde(skip)]
    pub published: Option<NaiveDateTime>,
    pub score: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EvidenceMeta {
    pub has_official: bool,
    pub has_independent: bool,
}

impl EvidenceMeta {
    pub fn is_thin(&self) -> bool {
        !self.has_official || !self.has_independent
    }
}

/// Optional signal appended to a planning request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlanDirectives {
    pub tighten: bool,
    pub max_queries: Option<usize>,
}

impl PlanDirectives {
    pub fn tighten(max_queries: usize) -> Self {
        Self {
            tighten: true,
            max_queries: Some(max_queries),
        }
    }
}

/// Everything the writer receives for one brief.
#[derive(Debug, Clone)]
pub struct WriteRequest {
    pub resolved_topic: String,
    pub scope: Scope,
    pub timeframe_text: String,
    pub evidence_note: Option<String>,
    pub provided_sources: Vec<ScoredCandidate>,
    pub summaries: Vec<SearchSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Brief {
    pub markdown: String,
}

// API Request/Response models
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ResearchRequest {
    pub session_id: String,
    pub topic: String,
}

#[derive(Debug, Deserialize)]
pub struct EmailRequest {
    pub topic: String,
    pub markdown: String,
    pub to: String,
}

#[derive(Debug, Serialize)]
pub struct EmailResponse {
    pub sent: bool,
    pub message: String,
}
