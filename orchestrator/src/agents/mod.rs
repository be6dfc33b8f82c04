// Collaborator seams: the research core only talks to these traits.

pub mod llm;
pub mod planner;
pub mod searcher;
pub mod web_search;
pub mod writer;

use async_trait::async_trait;

use crate::error::AgentResult;
use crate::models::{Brief, PlanDirectives, SearchItem, SearchPlan, SearchSummary, WriteRequest};

pub use planner::PlannerAgent;
pub use searcher::SearchAgent;
pub use writer::WriterAgent;

#[async_trait]
pub trait Planner: Send + Sync {
    async fn plan(&self, topic: &str, directives: PlanDirectives) -> AgentResult<SearchPlan>;
}

#[async_trait]
pub trait Searcher: Send + Sync {
    async fn search(&self, item: &SearchItem) -> AgentResult<SearchSummary>;
}

#[async_trait]
pub trait Writer: Send + Sync {
    async fn write(&self, request: &WriteRequest) -> AgentResult<Brief>;
}
