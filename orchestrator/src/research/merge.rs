use chrono::NaiveDateTime;
use std::cmp::Ordering;
use std::collections::HashSet;
use tracing::debug;

use crate::config::ResearchSettings;
use crate::error::ResearchError;
use crate::models::{EvidenceMeta, ScoredCandidate, SearchPlan, SearchSummary, SourceItem};
use crate::research::dates;
use crate::research::scoring::{host_of, window_from_timeframe, RelevanceScorer};

const UNTITLED: &str = "Untitled";

/// Flattens, dedupes and ranks sources across all search summaries.
#[derive(Debug, Clone)]
pub struct SourceMerger {
    scorer: RelevanceScorer,
    max_sources: usize,
    regulator_domains: Vec<String>,
    independent_domains: Vec<String>,
}

impl SourceMerger {
    pub fn new(settings: &ResearchSettings) -> Self {
        Self {
            scorer: RelevanceScorer::new(settings),
            max_sources: settings.max_sources,
            regulator_domains: lowercase_all(&settings.regulator_domains),
            independent_domains: lowercase_all(&settings.independent_domains),
        }
    }

    /// Returns the top `max_sources` candidates and the evidence flags over them.
    ///
    /// On a URL collision the first-seen title and date win.
    pub fn merge(
        &self,
        plan: &SearchPlan,
        summaries: &[SearchSummary],
        now: NaiveDateTime,
    ) -> (Vec<ScoredCandidate>, EvidenceMeta) {
        let topic = plan.resolved_topic.as_str();
        let window = window_from_timeframe(&plan.timeframe);

        let mut seen = HashSet::new();
        let mut candidates = Vec::new();

        for source in summaries.iter().flat_map(|s| s.sources.iter()) {
            let source = match validate(source) {
                Ok(source) => source,
                Err(err) => {
                    debug!(error = %err, "Skipping source");
                    continue;
                }
            };
            let url = source.url.trim().to_string();
            if !seen.insert(url.clone()) {
                continue;
            }

            let title = if source.title.trim().is_empty() {
                UNTITLED.to_string()
            } else {
                source.title.clone()
            };
            let date = source.date.clone().unwrap_or_default();
            let published = dates::normalize(Some(&date));
            let score = self.scorer.score(topic, &title, &url, published, window, now);

            candidates.push(ScoredCandidate {
                title,
                url,
                date,
                published,
                score,
            });
        }

        // Score first, recency breaks ties; undated sorts as oldest.
        candidates.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| cmp_published(b.published, a.published))
        });
        candidates.truncate(self.max_sources);

        let meta = EvidenceMeta {
            has_official: candidates.iter().any(|c| self.is_official(&c.url, topic)),
            has_independent: candidates.iter().any(|c| self.is_independent(&c.url)),
        };

        (candidates, meta)
    }

    /// Regulator domain, investor-relations host, or the company's own domain.
    pub fn is_official(&self, url: &str, topic: &str) -> bool {
        let Some(host) = host_of(url) else {
            return false;
        };
        if self.regulator_domains.iter().any(|d| host.ends_with(d.as_str())) {
            return true;
        }
        if host.contains("investor") || host.contains("ir.") {
            return true;
        }
        let compact: String = topic
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();
        !compact.is_empty() && host.contains(&compact)
    }

    pub fn is_independent(&self, url: &str) -> bool {
        host_of(url)
            .map(|host| self.independent_domains.iter().any(|d| host.ends_with(d.as_str())))
            .unwrap_or(false)
    }
}

fn validate(source: &SourceItem) -> Result<&SourceItem, ResearchError> {
    if source.url.trim().is_empty() {
        return Err(ResearchError::MergeInput(format!(
            "source '{}' has no URL",
            source.title
        )));
    }
    Ok(source)
}

fn cmp_published(a: Option<NaiveDateTime>, b: Option<NaiveDateTime>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}

fn lowercase_all(items: &[String]) -> Vec<String> {
    items.iter().map(|d| d.to_lowercase()).collect()
}
