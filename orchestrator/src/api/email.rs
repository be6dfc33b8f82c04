use tracing::{error, info};
use warp::{Rejection, Reply};

use super::AppState;
use crate::emailer::{send_brief, EmailError};
use crate::error::ApiError;
use crate::models::{EmailRequest, EmailResponse};

pub async fn handle_email(request: EmailRequest, state: AppState) -> Result<impl Reply, Rejection> {
    info!("Emailing brief on '{}'", request.topic);

    match send_brief(&state.smtp, &request.topic, &request.markdown, &request.to).await {
        Ok(()) => Ok(warp::reply::json(&EmailResponse {
            sent: true,
            message: "✅ Email sent!".to_string(),
        })),
        Err(e @ (EmailError::EmptyBrief | EmailError::InvalidAddress | EmailError::DisposableDomain)) => {
            Err(warp::reject::custom(ApiError::BadRequest(e.to_string())))
        }
        Err(e) => {
            error!("Failed to send email: {}", e);
            Err(warp::reject::custom(ApiError::EmailError(e.to_string())))
        }
    }
}
