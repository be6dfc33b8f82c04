use tracing::info;
use warp::{Rejection, Reply};

use crate::models::SessionResponse;
use crate::sessions::new_session_id;

pub async fn handle_new_session() -> Result<impl Reply, Rejection> {
    let session_id = new_session_id();
    info!("Issued session {}", session_id);
    Ok(warp::reply::json(&SessionResponse { session_id }))
}
