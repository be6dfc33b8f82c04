use thiserror::Error;
use warp::{http::StatusCode, reject::Reject, Rejection, Reply};

/// Failures surfaced by the external collaborators (LLM, web search).
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upstream returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("malformed model output: {0}")]
    MalformedOutput(String),

    #[error("missing configuration: {0}")]
    Configuration(String),
}

pub type AgentResult<T> = Result<T, AgentError>;

/// Failure categories of a research run.
#[derive(Error, Debug)]
pub enum ResearchError {
    #[error("planning failed: {0}")]
    Planning(#[source] AgentError),

    #[error("search failed for '{query}': {source}")]
    Search {
        query: String,
        #[source]
        source: AgentError,
    },

    #[error("malformed source in search summary: {0}")]
    MergeInput(String),

    #[error("writing the brief failed: {0}")]
    Writing(#[source] AgentError),

    #[error("research task aborted: {0}")]
    Aborted(String),
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Redis error: {0}")]
    RedisError(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Email error: {0}")]
    EmailError(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Question limit reached for this session")]
    QuotaExceeded,

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl Reject for ApiError {}

pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Rejection> {
    if let Some(api_err) = err.find::<ApiError>() {
        let (code, message) = match api_err {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "Bad request"),
            ApiError::QuotaExceeded => (StatusCode::TOO_MANY_REQUESTS, "Question limit reached"),
            ApiError::RateLimitExceeded => (StatusCode::TOO_MANY_REQUESTS, "Rate limit exceeded"),
            ApiError::EmailError(_) => (StatusCode::BAD_GATEWAY, "Email delivery failed"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"),
        };

        let json = warp::reply::json(&serde_json::json!({
            "error": message,
            "details": api_err.to_string(),
        }));

        Ok(warp::reply::with_status(json, code))
    } else {
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn research_errors_name_their_category() {
        let err = ResearchError::Planning(AgentError::MalformedOutput("no json".into()));
        assert!(err.to_string().starts_with("planning failed"));

        let err = ResearchError::Search {
            query: "acme earnings".into(),
            source: AgentError::Upstream { status: 503, body: "busy".into() },
        };
        assert_eq!(err.to_string(), "search failed for 'acme earnings': upstream returned 503: busy");
    }
}
