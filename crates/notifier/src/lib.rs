//! Forwarder: delivers notifications to the downstream conversational agent.
//!
//! One chat-completion request per notification, bounded by a whole-call
//! timeout. Failures are logged and reported as `false`; they never touch
//! persisted state and are not retried.

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use relay_common::ACTIVITY_TARGET;
use relay_common::config::RelayConfig;
use relay_common::types::Notification;

/// Characters of the agent reply kept in the log.
const REPLY_PREVIEW_CHARS: usize = 100;

/// Characters of an error response body kept in `ForwardError::Status`.
const ERROR_BODY_CHARS: usize = 200;

/// Why a forward attempt failed.
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("agent returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("unparseable agent reply: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("agent reply is not a JSON object")]
    NotAnObject,
}

/// Settings for reaching the downstream agent.
#[derive(Debug, Clone)]
pub struct ForwarderConfig {
    pub endpoint: String,
    pub token: String,
    pub model: String,
    pub timeout: Duration,
    /// Base URL the agent uses for `/done/{id}`
    pub callback_base: String,
    pub recipient: Option<String>,
}

impl From<&RelayConfig> for ForwarderConfig {
    fn from(config: &RelayConfig) -> Self {
        Self {
            endpoint: config.agent_endpoint(),
            token: config.agent_token.clone(),
            model: config.agent_model.clone(),
            timeout: Duration::from_secs(config.agent_timeout_secs),
            callback_base: config.public_url.clone(),
            recipient: config.recipient.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// HTTP client for the downstream agent.
#[derive(Debug, Clone)]
pub struct Forwarder {
    client: reqwest::Client,
    config: ForwarderConfig,
}

impl Forwarder {
    pub fn new(config: ForwarderConfig) -> Result<Self, ForwardError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ForwarderConfig {
        &self.config
    }

    /// Forward a notification, logging the outcome. Returns `true` on success.
    pub async fn forward(&self, notification: &Notification) -> bool {
        match self.try_forward(notification).await {
            Ok(reply) => {
                tracing::info!(
                    target: ACTIVITY_TARGET,
                    notification_id = notification.id,
                    "Agent processed #{}: {}...",
                    notification.id,
                    preview(&reply, REPLY_PREVIEW_CHARS)
                );
                true
            }
            Err(e) => {
                tracing::error!(
                    target: ACTIVITY_TARGET,
                    notification_id = notification.id,
                    "Forwarding #{} to agent failed: {}",
                    notification.id,
                    e
                );
                false
            }
        }
    }

    /// Send one chat-completion request and return the agent's reply text.
    pub async fn try_forward(&self, notification: &Notification) -> Result<String, ForwardError> {
        let prompt = render_prompt(
            notification,
            &self.config.callback_base,
            self.config.recipient.as_deref(),
        );
        let body = ChatRequest {
            model: &self.config.model,
            messages: [ChatMessage {
                role: "user",
                content: &prompt,
            }],
        };

        tracing::debug!(
            notification_id = notification.id,
            endpoint = %self.config.endpoint,
            "Forwarding notification to agent"
        );

        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(ForwardError::Status {
                status,
                body: preview(&text, ERROR_BODY_CHARS),
            });
        }

        reply_content(&text)
    }
}

/// Extract `choices[0].message.content` from a chat-completion reply.
///
/// The body must be a JSON object; missing parts yield an empty reply.
fn reply_content(text: &str) -> Result<String, ForwardError> {
    let reply: Value = serde_json::from_str(text)?;
    if !reply.is_object() {
        return Err(ForwardError::NotAnObject);
    }

    Ok(reply["choices"][0]["message"]["content"]
        .as_str()
        .unwrap_or_default()
        .to_string())
}

/// Render the human-readable prompt sent to the agent for one notification.
pub fn render_prompt(
    notification: &Notification,
    callback_base: &str,
    recipient: Option<&str>,
) -> String {
    let heading = match notification.title.as_deref() {
        Some(title) if !title.is_empty() => format!("**{}**: {}", notification.source, title),
        _ => format!("**{}**", notification.source),
    };

    format!(
        "Relay notification #{id}\n\n\
         {glyph} {heading}\n\n\
         {message}\n\n\
         ---\n\
         INSTRUCTION: Forward this to {recipient} now. Add a brief comment if useful. \
         Then acknowledge: POST {base}/done/{id}",
        id = notification.id,
        glyph = notification.priority().glyph(),
        message = notification.message,
        recipient = recipient.unwrap_or("the recipient"),
        base = callback_base.trim_end_matches('/'),
    )
}

/// First `max_chars` characters of `text`.
pub fn preview(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use relay_common::types::NotificationStatus;

    use super::*;

    fn notification(title: Option<&str>, priority: &str) -> Notification {
        Notification {
            id: 7,
            created_at: Utc::now(),
            source: "backup".to_string(),
            title: title.map(str::to_string),
            message: "Disk is 91% full".to_string(),
            priority: priority.to_string(),
            status: NotificationStatus::Pending,
            response: None,
            responded_at: None,
        }
    }

    #[test]
    fn test_prompt_contains_notification_and_callback() {
        let prompt = render_prompt(
            &notification(Some("Storage"), "urgent"),
            "http://127.0.0.1:10020",
            None,
        );
        assert!(prompt.starts_with("Relay notification #7"));
        assert!(prompt.contains("🚨 **backup**: Storage"));
        assert!(prompt.contains("Disk is 91% full"));
        assert!(prompt.contains("Forward this to the recipient"));
        assert!(prompt.ends_with("POST http://127.0.0.1:10020/done/7"));
    }

    #[test]
    fn test_prompt_without_title_and_unknown_priority() {
        let prompt = render_prompt(
            &notification(Some(""), "whenever"),
            "http://relay.local/",
            Some("Ops on-call"),
        );
        assert!(prompt.contains("📬 **backup**\n"));
        assert!(!prompt.contains("**backup**:"));
        assert!(prompt.contains("Forward this to Ops on-call"));
        assert!(prompt.ends_with("POST http://relay.local/done/7"));
    }

    #[test]
    fn test_preview_counts_characters() {
        assert_eq!(preview("héllo wörld", 5), "héllo");
        assert_eq!(preview("short", 100), "short");
    }

    #[test]
    fn test_reply_defaults_when_fields_missing() {
        assert_eq!(reply_content("{}").unwrap(), "");
        assert_eq!(reply_content(r#"{"choices":[{}]}"#).unwrap(), "");
        assert_eq!(
            reply_content(r#"{"choices":[{"message":{"content":"done"}}]}"#).unwrap(),
            "done"
        );
    }

    #[test]
    fn test_reply_must_be_json_object() {
        assert!(matches!(reply_content("not json"), Err(ForwardError::Decode(_))));
        assert!(matches!(reply_content("[]"), Err(ForwardError::NotAnObject)));
        assert!(matches!(reply_content("\"ok\""), Err(ForwardError::NotAnObject)));
    }
}
