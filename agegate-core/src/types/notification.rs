//! User-facing notification records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::profile::UserId;
use crate::outcome::VerificationOutcome;

/// Notification ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NotificationId(pub String);

impl NotificationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn generate() -> Self {
        Self(format!("notification:{}", Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NotificationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Notification category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    VerificationUpdate,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VerificationUpdate => "verification_update",
        }
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Write-once notification record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub notification_id: NotificationId,
    pub user_id: UserId,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Build the user-facing notice for a decided verification. Rejection
    /// reasons are joined into the message when the provider supplied any.
    pub fn verification_update(
        user_id: UserId,
        outcome: VerificationOutcome,
        rejection_reasons: &[String],
        now: DateTime<Utc>,
    ) -> Self {
        let (title, message) = match outcome {
            VerificationOutcome::Completed => (
                "Verification Approved".to_string(),
                "Your age verification has been approved! You can now access all parent features."
                    .to_string(),
            ),
            VerificationOutcome::Failed => {
                let detail = if rejection_reasons.is_empty() {
                    "Please try again or contact support.".to_string()
                } else {
                    rejection_reasons.join(", ")
                };
                (
                    "Verification Failed".to_string(),
                    format!("Age verification failed. {}", detail),
                )
            }
        };

        Self {
            notification_id: NotificationId::generate(),
            user_id,
            kind: NotificationKind::VerificationUpdate,
            title,
            message,
            read: false,
            created_at: now,
        }
    }
}
