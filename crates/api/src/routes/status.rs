//! Status summary endpoint.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use relay_common::error::AppError;
use relay_common::types::Notification;

use super::not_found;
use crate::state::AppState;

/// Number of recent notifications included in the status summary.
const STATUS_RECENT_LIMIT: i64 = 10;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(status).fallback(not_found))
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub pending_count: i64,
    pub recent: Vec<Notification>,
}

/// GET /: Pending count and the most recent notifications.
async fn status(State(state): State<AppState>) -> Result<Json<StatusResponse>, AppError> {
    let pending_count = state.store.count_pending().await?;
    let recent = state.store.get_recent(STATUS_RECENT_LIMIT).await?;

    Ok(Json(StatusResponse {
        status: "ok",
        pending_count,
        recent,
    }))
}
