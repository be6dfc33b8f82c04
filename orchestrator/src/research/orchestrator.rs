use chrono::Utc;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

use crate::agents::{Planner, Searcher, Writer};
use crate::config::ResearchSettings;
use crate::error::ResearchError;
use crate::metrics;
use crate::models::{
    Brief, EvidenceMeta, PlanDirectives, ScoredCandidate, SearchPlan, SearchSummary, WriteRequest,
};
use crate::research::executor::search_all;
use crate::research::merge::SourceMerger;
use crate::research::progress::{ProgressEvent, ProgressSender, ProgressStream};
use crate::research::queries::dedupe_queries;

/// Fewer retained sources than this triggers the tighten pass.
const MIN_SOURCES: usize = 2;
const MAX_PASSES: u8 = 2;

const THIN_EVIDENCE_NOTE: &str =
    "Limited official/independent source mix in the recent window; interpret with caution.";

#[derive(Debug, Clone)]
pub struct ResearchBrief {
    pub plan: SearchPlan,
    pub sources: Vec<ScoredCandidate>,
    pub evidence: EvidenceMeta,
    pub brief: Brief,
    pub tightened: bool,
}

#[derive(Debug, Clone)]
pub enum RunOutcome {
    Completed(ResearchBrief),
    NoSources { tightened: bool },
}

/// plan → dedupe → search → merge → (tighten → search → merge)? → write.
#[derive(Clone)]
pub struct ResearchOrchestrator {
    planner: Arc<dyn Planner>,
    searcher: Arc<dyn Searcher>,
    writer: Arc<dyn Writer>,
    settings: Arc<ResearchSettings>,
    merger: SourceMerger,
}

impl ResearchOrchestrator {
    pub fn new(
        planner: Arc<dyn Planner>,
        searcher: Arc<dyn Searcher>,
        writer: Arc<dyn Writer>,
        settings: Arc<ResearchSettings>,
    ) -> Self {
        let merger = SourceMerger::new(&settings);
        Self {
            planner,
            searcher,
            writer,
            settings,
            merger,
        }
    }

    /// Run the pipeline on a background task and stream its progress.
    ///
    /// The stream ends with `Brief`, `NoSources` or `Failed`. Dropping it
    /// cancels the run, including any searches still in flight.
    pub fn stream(&self, topic: impl Into<String>) -> ProgressStream {
        let this = self.clone();
        let topic = topic.into();
        let (tx, rx) = mpsc::unbounded_channel();

        let task = tokio::spawn(async move {
            let run = AssertUnwindSafe(this.run(&topic, &tx)).catch_unwind().await;
            if run.is_err() {
                let err = ResearchError::Aborted("research task panicked".to_string());
                error!(error = %err, "Research run aborted");
                emit(&tx, ProgressEvent::Failed(err.to_string()));
            }
        });

        ProgressStream::new(rx, task)
    }

    /// Run the pipeline, pushing progress to `progress`.
    ///
    /// A failure is also reported once as `ProgressEvent::Failed`.
    #[instrument(skip(self, progress), fields(run_id = %Uuid::new_v4()))]
    pub async fn run(
        &self,
        topic: &str,
        progress: &ProgressSender,
    ) -> Result<RunOutcome, ResearchError> {
        metrics::RUNS_STARTED.inc();
        let timer = metrics::RUN_DURATION.start_timer();

        let result = self.execute(topic, progress).await;
        timer.observe_duration();

        let outcome = match &result {
            Ok(RunOutcome::Completed(_)) => "completed",
            Ok(RunOutcome::NoSources { .. }) => "no_sources",
            Err(e) => {
                error!(error = %e, "Research run failed");
                emit(progress, ProgressEvent::Failed(e.to_string()));
                "failed"
            }
        };
        metrics::RUN_OUTCOMES.with_label_values(&[outcome]).inc();

        result
    }

    async fn execute(
        &self,
        topic: &str,
        progress: &ProgressSender,
    ) -> Result<RunOutcome, ResearchError> {
        let max_queries = self.settings.max_total_queries;

        emit(progress, ProgressEvent::Planning);
        let mut plan = self
            .planner
            .plan(topic, PlanDirectives::default())
            .await
            .map_err(ResearchError::Planning)?;
        info!(resolved_topic = %plan.resolved_topic, planned = plan.searches.len(), "Plan ready");

        let mut pass: u8 = 1;
        let (summaries, sources, evidence) = loop {
            let items = dedupe_queries(&plan.searches, max_queries);
            emit(progress, ProgressEvent::Searching { pass, queries: items.len() });

            let batch = search_all(self.searcher.as_ref(), &items, self.settings.max_concurrency).await;
            if batch.failed > 0 {
                emit(progress, ProgressEvent::SearchFailures { pass, failed: batch.failed });
            }
            if batch.summaries.is_empty() {
                let tightened = pass > 1;
                info!(pass, "No search summaries returned");
                emit(progress, ProgressEvent::NoSources { tightened });
                return Ok(RunOutcome::NoSources { tightened });
            }

            let now = Utc::now().naive_utc();
            let (sources, evidence) = self.merger.merge(&plan, &batch.summaries, now);
            info!(
                pass,
                retained = sources.len(),
                has_official = evidence.has_official,
                has_independent = evidence.has_independent,
                "Sources merged"
            );

            if sources.len() >= MIN_SOURCES || pass >= MAX_PASSES {
                break (batch.summaries, sources, evidence);
            }

            emit(progress, ProgressEvent::Tightening);
            metrics::TIGHTEN_PASSES.inc();
            plan = self
                .planner
                .plan(topic, PlanDirectives::tighten(max_queries))
                .await
                .map_err(ResearchError::Planning)?;
            pass += 1;
        };

        emit(progress, ProgressEvent::Writing);
        let request = write_request(&plan, &summaries, &sources, evidence);
        let brief = self
            .writer
            .write(&request)
            .await
            .map_err(ResearchError::Writing)?;

        emit(progress, ProgressEvent::Written);
        emit(progress, ProgressEvent::Brief(brief.markdown.clone()));

        Ok(RunOutcome::Completed(ResearchBrief {
            plan,
            sources,
            evidence,
            brief,
            tightened: pass > 1,
        }))
    }
}

fn write_request(
    plan: &SearchPlan,
    summaries: &[SearchSummary],
    sources: &[ScoredCandidate],
    evidence: EvidenceMeta,
) -> WriteRequest {
    let timeframe_text = if plan.timeframe.trim().is_empty() {
        format!("Up to {}", Utc::now().format("%B %Y"))
    } else {
        plan.timeframe.clone()
    };

    WriteRequest {
        resolved_topic: plan.resolved_topic.clone(),
        scope: plan.scope,
        timeframe_text,
        evidence_note: evidence.is_thin().then(|| THIN_EVIDENCE_NOTE.to_string()),
        provided_sources: sources.to_vec(),
        summaries: summaries.to_vec(),
    }
}

fn emit(progress: &ProgressSender, event: ProgressEvent) {
    debug!(event = %event, "Progress");
    if progress.send(event).is_err() {
        debug!("Progress receiver dropped");
    }
}
