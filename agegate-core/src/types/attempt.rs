//! Verification attempt types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::event::VerificationData;
use super::profile::UserId;
use crate::outcome::VerificationOutcome;

/// How long a freshly opened attempt stays usable for the provider flow.
pub const ATTEMPT_TTL_MINUTES: i64 = 30;

/// Attempt ID - primary identifier for verification attempts
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttemptId(pub String);

impl AttemptId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn generate() -> Self {
        Self(format!("attempt:{}", Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AttemptId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Session ID - correlates an attempt across systems; handed to the
/// provider as the external reference id and echoed back in webhooks
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Derive the session id for a new attempt: a short user-id prefix
    /// plus the current unix-millis timestamp.
    pub fn for_user(user_id: &UserId, now: DateTime<Utc>) -> Self {
        let prefix: String = user_id.as_str().chars().take(8).collect();
        Self(format!("{}_{}", prefix, now.timestamp_millis()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Attempt lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    Pending,
    Completed,
    Failed,
}

impl AttemptStatus {
    /// Terminal statuses are never left again.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl Default for AttemptStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl std::fmt::Display for AttemptStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Provider-reported details accumulated on an attempt
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttemptMetadata {
    /// Date of birth declared when the attempt was opened
    pub date_of_birth: Option<String>,
    /// Provider-assigned identification id
    pub provider_identification_id: Option<String>,
    /// Raw provider status string from the deciding webhook
    pub provider_status: Option<String>,
    pub verification_data: Option<VerificationData>,
    pub rejection_reasons: Vec<String>,
    pub webhook_received_at: Option<DateTime<Utc>>,
}

impl AttemptMetadata {
    /// Merge webhook-reported fields into the stored bag. Fields absent
    /// from `other` keep their current value.
    pub fn merge(&mut self, other: AttemptMetadata) {
        if other.date_of_birth.is_some() {
            self.date_of_birth = other.date_of_birth;
        }
        if other.provider_identification_id.is_some() {
            self.provider_identification_id = other.provider_identification_id;
        }
        if other.provider_status.is_some() {
            self.provider_status = other.provider_status;
        }
        if other.verification_data.is_some() {
            self.verification_data = other.verification_data;
        }
        if !other.rejection_reasons.is_empty() {
            self.rejection_reasons = other.rejection_reasons;
        }
        if other.webhook_received_at.is_some() {
            self.webhook_received_at = other.webhook_received_at;
        }
    }
}

/// A single identity-verification attempt
///
/// Opened pending, finalized to a terminal status exactly once by the
/// webhook pipeline, never deleted by this service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationAttempt {
    pub attempt_id: AttemptId,
    pub session_id: SessionId,
    pub user_id: UserId,
    /// Provider label, e.g. "ondato"
    pub method: String,
    pub status: AttemptStatus,
    /// Provider-hosted URL the user was sent to
    pub verification_url: Option<String>,
    pub metadata: AttemptMetadata,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl VerificationAttempt {
    /// Open a new pending attempt for a user.
    pub fn open(user_id: UserId, method: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            attempt_id: AttemptId::generate(),
            session_id: SessionId::for_user(&user_id, now),
            user_id,
            method: method.into(),
            status: AttemptStatus::Pending,
            verification_url: None,
            metadata: AttemptMetadata::default(),
            created_at: now,
            updated_at: now,
            expires_at: Some(now + chrono::Duration::minutes(ATTEMPT_TTL_MINUTES)),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == AttemptStatus::Pending
    }

    /// Apply a terminal outcome in place. Callers must guard that the
    /// attempt is still pending; the store finalize primitive does.
    pub fn finalize(
        &mut self,
        outcome: VerificationOutcome,
        metadata: AttemptMetadata,
        now: DateTime<Utc>,
    ) {
        self.status = outcome.attempt_status();
        self.metadata.merge(metadata);
        self.updated_at = now;
    }
}
