use futures::stream::{self, StreamExt};
use tracing::{info, warn};

use crate::agents::Searcher;
use crate::error::ResearchError;
use crate::metrics;
use crate::models::{SearchItem, SearchSummary};

#[derive(Debug, Default)]
pub struct SearchBatch {
    pub summaries: Vec<SearchSummary>,
    pub failed: usize,
}

/// Run one search per item with at most `max_concurrency` in flight.
///
/// Summaries come back in plan order regardless of completion order.
/// Every task reaches a terminal state before this returns; a failure is
/// counted and never cancels its siblings. Dropping the returned future drops
/// all in-flight searches with it.
pub async fn search_all(
    searcher: &dyn Searcher,
    items: &[SearchItem],
    max_concurrency: usize,
) -> SearchBatch {
    let tasks: Vec<_> = items.iter().map(|item| search_one(searcher, item)).collect();
    // `buffered` keeps plan order, so merge sees summaries deterministically.
    let outcomes: Vec<_> = stream::iter(tasks)
        .buffered(max_concurrency.max(1))
        .collect()
        .await;

    let mut batch = SearchBatch::default();
    for outcome in outcomes {
        match outcome {
            Ok(summary) => {
                metrics::SEARCHES.with_label_values(&["ok"]).inc();
                batch.summaries.push(summary);
            }
            Err(e) => {
                metrics::SEARCHES.with_label_values(&["failed"]).inc();
                warn!(error = %e, "Search task failed");
                batch.failed += 1;
            }
        }
    }

    info!(
        succeeded = batch.summaries.len(),
        failed = batch.failed,
        "Search batch finished"
    );
    batch
}

async fn search_one(
    searcher: &dyn Searcher,
    item: &SearchItem,
) -> Result<SearchSummary, ResearchError> {
    searcher
        .search(item)
        .await
        .map_err(|source| ResearchError::Search {
            query: item.query.clone(),
            source,
        })
}
