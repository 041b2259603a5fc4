use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default source recorded when a producer does not identify itself.
pub const DEFAULT_SOURCE: &str = "unknown";

/// Default priority label.
pub const DEFAULT_PRIORITY: &str = "normal";

/// Lifecycle state of a notification. `Pending` transitions once to `Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum NotificationStatus {
    Pending,
    Done,
}

impl std::fmt::Display for NotificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationStatus::Pending => write!(f, "pending"),
            NotificationStatus::Done => write!(f, "done"),
        }
    }
}

/// Display priority of a notification.
///
/// Priority is stored as a free-form label; only these four values carry
/// meaning, anything else renders as `Normal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    Urgent,
    High,
    Normal,
    Low,
}

impl Priority {
    pub fn from_label(label: &str) -> Self {
        match label {
            "urgent" => Priority::Urgent,
            "high" => Priority::High,
            "low" => Priority::Low,
            _ => Priority::Normal,
        }
    }

    pub fn glyph(self) -> &'static str {
        match self {
            Priority::Urgent => "🚨",
            Priority::High => "❗",
            Priority::Normal => "📬",
            Priority::Low => "📝",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::Urgent => write!(f, "urgent"),
            Priority::High => write!(f, "high"),
            Priority::Normal => write!(f, "normal"),
            Priority::Low => write!(f, "low"),
        }
    }
}

/// A persisted notification.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Notification {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub source: String,
    pub title: Option<String>,
    pub message: String,
    pub priority: String,
    pub status: NotificationStatus,
    pub response: Option<String>,
    pub responded_at: Option<DateTime<Utc>>,
}

impl Notification {
    pub fn priority(&self) -> Priority {
        Priority::from_label(&self.priority)
    }

    /// Title if present and non-empty, otherwise the first 50 characters of the message.
    pub fn headline(&self) -> String {
        match self.title.as_deref() {
            Some(title) if !title.is_empty() => title.to_string(),
            _ => self.message.chars().take(50).collect(),
        }
    }
}

/// Fields supplied by a producer for a new notification, after defaults are applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub source: String,
    pub title: Option<String>,
    pub message: String,
    pub priority: String,
}
