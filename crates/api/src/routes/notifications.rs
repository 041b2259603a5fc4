//! Notification intake, acknowledgement and queue inspection routes.

use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::{Value, json};

use relay_common::ACTIVITY_TARGET;
use relay_common::error::AppError;
use relay_common::types::{DEFAULT_PRIORITY, DEFAULT_SOURCE, NewNotification, Notification};

use super::{not_found, parse_body, text_field};
use crate::state::AppState;

/// Upper bound on notifications returned by `/history`.
const HISTORY_LIMIT: i64 = 50;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/notify", post(notify).fallback(not_found))
        .route("/done/", post(missing_id).fallback(not_found))
        .route("/done/{id}", post(mark_done).fallback(not_found))
        .route("/pending", get(list_pending).fallback(not_found))
        .route("/history", get(list_history).fallback(not_found))
}

/// Request body for a new notification. Every field is optional on the wire.
#[derive(Debug, Default)]
pub struct NotifyRequest {
    pub source: Option<String>,
    pub title: Option<String>,
    pub message: Option<String>,
    pub priority: Option<String>,
}

impl NotifyRequest {
    /// Read each field independently; a mistyped field does not discard the others.
    pub fn from_json(body: &Value) -> Self {
        Self {
            source: text_field(body, "source"),
            title: text_field(body, "title"),
            message: text_field(body, "message"),
            priority: text_field(body, "priority"),
        }
    }

    /// Apply defaults and reject a missing or empty message.
    pub fn into_new_notification(self) -> Result<NewNotification, AppError> {
        let message = self
            .message
            .filter(|m| !m.is_empty())
            .ok_or_else(|| AppError::Validation("message required".to_string()))?;

        Ok(NewNotification {
            source: self
                .source
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_SOURCE.to_string()),
            title: self.title.filter(|t| !t.is_empty()),
            message,
            priority: self
                .priority
                .filter(|p| !p.is_empty())
                .unwrap_or_else(|| DEFAULT_PRIORITY.to_string()),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct NotifyResponse {
    pub ok: bool,
    pub id: i64,
    pub message: &'static str,
}

/// Optional query filters for list endpoints.
#[derive(Debug, Default)]
pub struct ListParams {
    pub source: Option<String>,
    pub limit: Option<i64>,
}

impl ListParams {
    /// Unparseable values are ignored rather than rejected.
    pub fn from_query(query: &HashMap<String, String>) -> Self {
        Self {
            source: query.get("source").filter(|s| !s.is_empty()).cloned(),
            limit: query.get("limit").and_then(|l| l.trim().parse().ok()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct NotificationList {
    pub notifications: Vec<Notification>,
}

/// POST /notify: Persist a notification, then forward it to the agent.
///
/// Succeeds once the notification is stored; the forward outcome only changes
/// the response text.
async fn notify(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<NotifyResponse>, AppError> {
    let new = NotifyRequest::from_json(&parse_body(&body)).into_new_notification()?;

    let notification = state.store.create(&new).await?;
    tracing::info!(
        target: ACTIVITY_TARGET,
        notification_id = notification.id,
        "New notification #{} from {}: {}",
        notification.id,
        notification.source,
        notification.headline()
    );

    let forwarded = state.forwarder.forward(&notification).await;

    Ok(Json(NotifyResponse {
        ok: true,
        id: notification.id,
        message: if forwarded {
            "Notification forwarded to agent"
        } else {
            "Notification stored; agent forward failed"
        },
    }))
}

/// POST /done/{id}: Mark a notification done. Unknown ids are accepted silently.
async fn mark_done(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<serde_json::Value>, AppError> {
    let id: i64 = id
        .parse()
        .map_err(|_| AppError::Validation("Invalid ID".to_string()))?;
    let response = text_field(&parse_body(&body), "response");

    let found = state.store.mark_done(id, response.as_deref()).await?;
    if found {
        tracing::info!(target: ACTIVITY_TARGET, notification_id = id, "Marked #{} as done", id);
    } else {
        tracing::warn!(
            target: ACTIVITY_TARGET,
            notification_id = id,
            "Acknowledgement for unknown notification #{}",
            id
        );
    }

    Ok(Json(json!({ "ok": true })))
}

/// POST /done/ with no id segment.
async fn missing_id() -> AppError {
    AppError::Validation("Invalid ID".to_string())
}

/// GET /pending: Pending notifications, oldest first.
async fn list_pending(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<NotificationList>, AppError> {
    let params = ListParams::from_query(&query);
    let notifications = state
        .store
        .get_pending_from(params.source.as_deref())
        .await?;
    Ok(Json(NotificationList { notifications }))
}

/// GET /history: Most recent notifications, newest first, at most 50.
async fn list_history(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<NotificationList>, AppError> {
    let params = ListParams::from_query(&query);
    let limit = params
        .limit
        .unwrap_or(HISTORY_LIMIT)
        .clamp(1, HISTORY_LIMIT);
    let notifications = state
        .store
        .get_recent_from(params.source.as_deref(), limit)
        .await?;
    Ok(Json(NotificationList { notifications }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notify_request_defaults() {
        let new = NotifyRequest {
            message: Some("disk full".to_string()),
            ..Default::default()
        }
        .into_new_notification()
        .unwrap();

        assert_eq!(new.source, "unknown");
        assert_eq!(new.priority, "normal");
        assert!(new.title.is_none());
        assert_eq!(new.message, "disk full");
    }

    #[test]
    fn test_notify_request_empty_strings_use_defaults() {
        let new = NotifyRequest {
            source: Some(String::new()),
            title: Some(String::new()),
            message: Some("m".to_string()),
            priority: Some(String::new()),
        }
        .into_new_notification()
        .unwrap();

        assert_eq!(new.source, "unknown");
        assert_eq!(new.priority, "normal");
        assert!(new.title.is_none());
    }

    #[test]
    fn test_notify_request_requires_message() {
        let missing = NotifyRequest::default().into_new_notification();
        assert!(matches!(missing, Err(AppError::Validation(_))));

        let empty = NotifyRequest {
            message: Some(String::new()),
            ..Default::default()
        }
        .into_new_notification();
        assert!(matches!(empty, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_notify_request_reads_fields_independently() {
        let request = NotifyRequest::from_json(&json!({
            "message": "disk full",
            "title": 5,
            "priority": ["urgent"],
            "source": null
        }));

        assert_eq!(request.message.as_deref(), Some("disk full"));
        assert_eq!(request.title.as_deref(), Some("5"));
        assert!(request.priority.is_none());
        assert!(request.source.is_none());
    }

    #[test]
    fn test_list_params_ignore_bad_values() {
        let query = HashMap::from([
            ("limit".to_string(), "abc".to_string()),
            ("source".to_string(), String::new()),
        ]);
        let params = ListParams::from_query(&query);
        assert!(params.limit.is_none());
        assert!(params.source.is_none());

        let query = HashMap::from([("limit".to_string(), " 7 ".to_string())]);
        assert_eq!(ListParams::from_query(&query).limit, Some(7));
    }
}
