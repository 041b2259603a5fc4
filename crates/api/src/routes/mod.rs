pub mod notifications;
pub mod status;

use axum::Router;
use serde_json::{Map, Value};

use relay_common::error::AppError;

use crate::state::AppState;

/// Build the complete relay router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(status::router())
        .merge(notifications::router())
        .fallback(not_found)
        .with_state(state)
}

/// Fallback for unknown paths and unsupported methods.
pub(crate) async fn not_found() -> AppError {
    AppError::NotFound("Not found".to_string())
}

/// Parse a JSON request body, treating an empty, malformed or non-object body as `{}`.
pub(crate) fn parse_body(body: &[u8]) -> Value {
    if body.is_empty() {
        return Value::Object(Map::new());
    }
    match serde_json::from_slice::<Value>(body) {
        Ok(value) if value.is_object() => value,
        Ok(_) => {
            tracing::debug!("Ignoring non-object JSON body");
            Value::Object(Map::new())
        }
        Err(e) => {
            tracing::debug!(error = %e, "Ignoring malformed JSON body");
            Value::Object(Map::new())
        }
    }
}

/// A body field as text. Numbers and booleans are stringified; null, arrays
/// and objects count as absent.
pub(crate) fn text_field(body: &Value, key: &str) -> Option<String> {
    match body.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_parse_body_lenient() {
        let empty = Value::Object(Map::new());
        assert_eq!(parse_body(b""), empty);
        assert_eq!(parse_body(b"{not json"), empty);
        assert_eq!(parse_body(b"[1,2]"), empty);
        assert_eq!(
            parse_body(br#"{"message":"hi","extra":1}"#),
            json!({"message": "hi", "extra": 1})
        );
    }

    #[test]
    fn test_text_field() {
        let body = json!({"a": "x", "b": 5, "c": true, "d": null, "e": [1], "f": {"g": 1}});
        assert_eq!(text_field(&body, "a").as_deref(), Some("x"));
        assert_eq!(text_field(&body, "b").as_deref(), Some("5"));
        assert_eq!(text_field(&body, "c").as_deref(), Some("true"));
        assert!(text_field(&body, "d").is_none());
        assert!(text_field(&body, "e").is_none());
        assert!(text_field(&body, "f").is_none());
        assert!(text_field(&body, "missing").is_none());
    }
}
