use futures::StreamExt;
use std::convert::Infallible;
use tracing::info;
use warp::sse::Event;
use warp::{Rejection, Reply};

use super::AppState;
use crate::error::ApiError;
use crate::middleware::check_rate;
use crate::models::ResearchRequest;
use crate::research::ProgressEvent;

pub fn sse_event(event: &ProgressEvent) -> Event {
    Event::default()
        .event(event.event_name())
        .data(event.to_string())
}

pub async fn handle_research(
    request: ResearchRequest,
    state: AppState,
) -> Result<impl Reply, Rejection> {
    let topic = request.topic.trim().to_string();
    if topic.is_empty() {
        return Err(warp::reject::custom(ApiError::BadRequest(
            "Please enter a topic.".to_string(),
        )));
    }
    let session_id = request.session_id.trim().to_string();
    if session_id.is_empty() {
        return Err(warp::reject::custom(ApiError::BadRequest(
            "Missing session_id".to_string(),
        )));
    }

    check_rate(&state.limiter, &session_id).map_err(warp::reject::custom)?;

    let mut sessions = state.sessions.clone();
    let allowed = sessions
        .try_start_question(&session_id)
        .await
        .map_err(|e| warp::reject::custom(ApiError::from(e)))?;
    if !allowed {
        return Err(warp::reject::custom(ApiError::QuotaExceeded));
    }

    info!("Starting research for session {}: {}", session_id, topic);

    // Client disconnect drops the stream, which aborts the run.
    let events = state
        .orchestrator
        .stream(topic)
        .map(|event| Ok::<_, Infallible>(sse_event(&event)));

    Ok(warp::sse::reply(warp::sse::keep_alive().stream(events)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_events_get_their_own_sse_name() {
        let brief = sse_event(&ProgressEvent::Brief("# Acme".into())).to_string();
        assert!(brief.contains("event:brief"));
        assert!(brief.contains("data:# Acme"));

        let planning = sse_event(&ProgressEvent::Planning).to_string();
        assert!(planning.contains("event:progress"));
    }
}
