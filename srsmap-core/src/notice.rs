//! User-visible notices (toasts) raised by fetches and clipboard operations

use chrono::{DateTime, Duration, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Error,
}

/// Follow-up the user can trigger from a notice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeAction {
    /// Start a new fetch of the requirement tree
    Retry,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: String,
    pub description: Option<String>,
    pub action: Option<NoticeAction>,
    pub created_at: DateTime<Utc>,
    /// Transient notices disappear after this long; `None` stays until dismissed
    pub lifetime: Option<Duration>,
}

impl Notice {
    /// Short-lived informational notice
    pub fn info(title: impl Into<String>, lifetime: Duration) -> Self {
        Self {
            kind: NoticeKind::Info,
            title: title.into(),
            description: None,
            action: None,
            created_at: Utc::now(),
            lifetime: Some(lifetime),
        }
    }

    /// Error notice that stays until dismissed
    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            title: title.into(),
            description: Some(description.into()),
            action: None,
            created_at: Utc::now(),
            lifetime: None,
        }
    }

    pub fn with_action(mut self, action: NoticeAction) -> Self {
        self.action = Some(action);
        self
    }

    pub fn with_lifetime(mut self, lifetime: Duration) -> Self {
        self.lifetime = Some(lifetime);
        self
    }

    pub fn is_error(&self) -> bool {
        self.kind == NoticeKind::Error
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.lifetime
            .map(|lifetime| now - self.created_at >= lifetime)
            .unwrap_or(false)
    }
}
