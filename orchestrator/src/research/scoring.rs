use chrono::NaiveDateTime;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;
use url::Url;

use crate::config::ResearchSettings;

static DAY_WINDOW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*day").expect("static regex"));

const TITLE_MATCH: f64 = 2.0;
const URL_MATCH: f64 = 1.0;
const MAX_RECENCY_BONUS: f64 = 1.5;

/// Lower-cased host of a URL, without port. `None` for anything unparseable.
pub fn host_of(url: &str) -> Option<String> {
    Url::parse(url.trim())
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_lowercase()))
        .filter(|h| !h.is_empty())
}

/// Last two labels of a hostname.
pub fn apex_of(host: &str) -> Option<String> {
    let labels: Vec<&str> = host.split('.').filter(|l| !l.is_empty()).collect();
    if labels.len() < 2 {
        return None;
    }
    Some(labels[labels.len() - 2..].join("."))
}

/// Day count embedded in a timeframe like "last 30 days". Zero counts as absent.
pub fn window_from_timeframe(timeframe: &str) -> Option<i64> {
    DAY_WINDOW
        .captures(&timeframe.to_lowercase())
        .and_then(|caps| caps[1].parse::<i64>().ok())
        .filter(|days| *days > 0)
}

pub fn contains_topic(text: &str, topic: &str) -> bool {
    let topic = topic.trim();
    !topic.is_empty() && text.to_lowercase().contains(&topic.to_lowercase())
}

/// Scores a candidate source by topical match, domain trust and recency.
#[derive(Debug, Clone)]
pub struct RelevanceScorer {
    weights: HashMap<String, f64>,
    default_window_days: i64,
}

impl RelevanceScorer {
    pub fn new(settings: &ResearchSettings) -> Self {
        Self {
            weights: settings
                .domain_weights
                .iter()
                .map(|d| (d.domain.to_lowercase(), d.weight))
                .collect(),
            default_window_days: settings.recency_days_default,
        }
    }

    pub fn default_window_days(&self) -> i64 {
        self.default_window_days
    }

    /// Exact host first, then its apex. Unlisted or unparseable URLs weigh 1.0.
    pub fn domain_weight(&self, url: &str) -> f64 {
        let Some(host) = host_of(url) else {
            return 1.0;
        };
        if let Some(weight) = self.weights.get(&host) {
            return *weight;
        }
        apex_of(&host)
            .and_then(|apex| self.weights.get(&apex).copied())
            .unwrap_or(1.0)
    }

    pub fn score(
        &self,
        topic: &str,
        title: &str,
        url: &str,
        published: Option<NaiveDateTime>,
        window_days: Option<i64>,
        now: NaiveDateTime,
    ) -> f64 {
        let mut score = 0.0;
        if contains_topic(title, topic) {
            score += TITLE_MATCH;
        }
        if contains_topic(url, topic) {
            score += URL_MATCH;
        }

        score *= self.domain_weight(url);

        let window = window_days
            .filter(|w| *w > 0)
            .unwrap_or(self.default_window_days);
        if let Some(published) = published {
            // Future-dated items count as age zero so the bonus stays capped.
            let age_days = (now - published).num_days().max(0);
            if age_days <= window {
                score += (MAX_RECENCY_BONUS - age_days as f64 / window as f64).max(0.0);
            }
        }

        score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn scorer() -> RelevanceScorer {
        RelevanceScorer::new(&ResearchSettings::default())
    }

    #[test]
    fn subdomain_falls_back_to_apex_weight() {
        let scorer = scorer();
        assert_eq!(scorer.domain_weight("https://www.sec.gov/cgi-bin/browse-edgar"), 2.5);
        assert_eq!(scorer.domain_weight("https://reuters.com/a"), 1.8);
        assert_eq!(scorer.domain_weight("https://sec.gov:443/x"), 2.5);
    }

    #[test]
    fn unlisted_and_unparseable_urls_weigh_one() {
        let scorer = scorer();
        assert_eq!(scorer.domain_weight("https://blog.example.org/post"), 1.0);
        assert_eq!(scorer.domain_weight("not a url"), 1.0);
        assert_eq!(scorer.domain_weight(""), 1.0);
    }

    #[test]
    fn topic_match_in_title_and_url() {
        let scorer = scorer();
        let s = scorer.score("Acme", "ACME posts record quarter", "https://example.com/acme", None, None, now());
        assert_eq!(s, 3.0);
        let s = scorer.score("Acme", "Quarterly roundup", "https://example.com/x", None, None, now());
        assert_eq!(s, 0.0);
    }

    #[test]
    fn domain_weight_multiplies_topic_score() {
        let scorer = scorer();
        let s = scorer.score("Acme", "Acme files 10-Q", "https://www.sec.gov/x", None, None, now());
        assert_eq!(s, 5.0);
    }

    #[test]
    fn recency_bonus_decays_linearly_over_window() {
        let scorer = scorer();
        let fresh = scorer.score("Acme", "other", "https://example.com", Some(now()), Some(30), now());
        assert_eq!(fresh, 1.5);

        let half = now() - Duration::days(15);
        let mid = scorer.score("Acme", "other", "https://example.com", Some(half), Some(30), now());
        assert!((mid - 1.0).abs() < 1e-9);

        let stale = now() - Duration::days(45);
        let old = scorer.score("Acme", "Acme news", "https://example.com", Some(stale), Some(30), now());
        assert_eq!(old, 2.0);
    }

    #[test]
    fn future_dates_do_not_exceed_the_cap() {
        let scorer = scorer();
        let future = now() + Duration::days(10);
        let s = scorer.score("Acme", "other", "https://example.com", Some(future), None, now());
        assert_eq!(s, 1.5);
    }

    #[test]
    fn high_trust_domain_beats_fresher_low_trust_source() {
        let scorer = scorer();
        let old = now() - Duration::days(170);
        let official = scorer.score("Acme", "Acme 8-K", "https://www.sec.gov/a", Some(old), None, now());
        let fresh = scorer.score("Acme", "Acme rumor", "https://blog.example.com/b", Some(now()), None, now());
        assert!(official > fresh, "{official} should beat {fresh}");
    }

    #[test]
    fn recency_cannot_overcome_two_point_gap() {
        let scorer = scorer();
        let matched = scorer.score("Acme", "Acme expands", "https://example.com/1", None, None, now());
        let recent = scorer.score("Acme", "Unrelated", "https://example.com/2", Some(now()), None, now());
        assert!(matched > recent);
    }

    #[test]
    fn timeframe_window_parsing() {
        assert_eq!(window_from_timeframe("last 30 days"), Some(30));
        assert_eq!(window_from_timeframe("Last 7 Days"), Some(7));
        assert_eq!(window_from_timeframe("past 90day window"), Some(90));
        assert_eq!(window_from_timeframe("last 0 days"), None);
        assert_eq!(window_from_timeframe("this quarter"), None);
        assert_eq!(window_from_timeframe(""), None);
    }

    #[test]
    fn apex_requires_two_labels() {
        assert_eq!(apex_of("www.sec.gov").as_deref(), Some("sec.gov"));
        assert_eq!(apex_of("localhost"), None);
    }
}
