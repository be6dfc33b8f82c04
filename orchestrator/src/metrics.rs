use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, Encoder, Histogram,
    IntCounter, IntCounterVec, TextEncoder,
};
use std::sync::LazyLock;

pub static RUNS_STARTED: LazyLock<IntCounter> = LazyLock::new(|| {
    register_int_counter!("research_runs_started_total", "Research runs started")
        .expect("metric registration")
});

pub static RUN_OUTCOMES: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "research_run_outcomes_total",
        "Research runs by terminal outcome",
        &["outcome"]
    )
    .expect("metric registration")
});

pub static SEARCHES: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "research_searches_total",
        "Search tasks by outcome",
        &["outcome"]
    )
    .expect("metric registration")
});

pub static TIGHTEN_PASSES: LazyLock<IntCounter> = LazyLock::new(|| {
    register_int_counter!("research_tighten_passes_total", "Tightened retry passes")
        .expect("metric registration")
});

pub static RUN_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    register_histogram!(
        "research_run_duration_seconds",
        "Wall time of a research run",
        vec![1.0, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0]
    )
    .expect("metric registration")
});

/// Prometheus text exposition of the default registry.
pub fn render() -> Result<(Vec<u8>, String), prometheus::Error> {
    let encoder = TextEncoder::new();
    let mut buffer = vec![];
    encoder.encode(&prometheus::gather(), &mut buffer)?;
    Ok((buffer, encoder.format_type().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_show_up_in_exposition() {
        SEARCHES.with_label_values(&["ok"]).inc();
        let (body, content_type) = render().unwrap();
        let text = String::from_utf8(body).unwrap();
        assert!(text.contains("research_searches_total"));
        assert!(content_type.starts_with("text/plain"));
    }
}
