use std::sync::Arc;
use warp::{Filter, Rejection, Reply};

use crate::emailer::SmtpSettings;
use crate::middleware::SessionRateLimiter;
use crate::research::ResearchOrchestrator;
use crate::sessions::SessionStore;

mod email;
mod research;
mod sessions;

/// Handles shared by every request; built once in `main`.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: ResearchOrchestrator,
    pub sessions: SessionStore,
    pub limiter: Arc<SessionRateLimiter>,
    pub smtp: SmtpSettings,
}

pub fn routes(state: AppState) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let api = warp::path("api").and(warp::path("v1"));

    let session_route = api
        .and(warp::path("sessions"))
        .and(warp::path::end())
        .and(warp::post())
        .and_then(sessions::handle_new_session);

    let research_route = api
        .and(warp::path("research"))
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::content_length_limit(16 * 1024))
        .and(warp::body::json())
        .and(with_state(state.clone()))
        .and_then(research::handle_research);

    let email_route = api
        .and(warp::path("email"))
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::content_length_limit(512 * 1024))
        .and(warp::body::json())
        .and(with_state(state))
        .and_then(email::handle_email);

    session_route.or(research_route).or(email_route)
}

fn with_state(
    state: AppState,
) -> impl Filter<Extract = (AppState,), Error = std::convert::Infallible> + Clone {
    warp::any().map(move || state.clone())
}
