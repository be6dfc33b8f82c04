pub mod dates;
pub mod executor;
pub mod merge;
pub mod orchestrator;
pub mod progress;
pub mod queries;
pub mod scoring;

pub use executor::{search_all, SearchBatch};
pub use merge::SourceMerger;
pub use orchestrator::{ResearchBrief, ResearchOrchestrator, RunOutcome};
pub use progress::{ProgressEvent, ProgressSender, ProgressStream};
pub use queries::dedupe_queries;
pub use scoring::RelevanceScorer;
