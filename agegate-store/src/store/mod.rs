//! Storage layer
//!
//! Attempt records must never be lost or silently double-finalized:
//! `finalize_attempt` only applies the terminal outcome while the stored
//! status is still pending, and the session index is unique so a webhook
//! session resolves to at most one attempt.

pub mod memory;
pub mod sled;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use agegate_core::outcome::VerificationOutcome;
use agegate_core::types::{
    AttemptId, AttemptMetadata, Notification, SessionId, UserId, UserProfile,
    VerificationAttempt,
};

use crate::error::StoreResult;

/// Result of a conditional finalize
#[derive(Debug, Clone)]
pub enum FinalizeStatus {
    /// This call won the swap; the attempt moved to its terminal status
    Applied(VerificationAttempt),
    /// The attempt was already terminal; nothing was written
    AlreadyFinal(VerificationAttempt),
}

impl FinalizeStatus {
    pub fn attempt(&self) -> &VerificationAttempt {
        match self {
            Self::Applied(attempt) | Self::AlreadyFinal(attempt) => attempt,
        }
    }

    pub fn was_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }
}

/// Verification record store interface
#[async_trait]
pub trait VerificationStore: Send + Sync {
    // ==================== Attempt operations ====================

    /// Save an attempt. Fails with `SessionTaken` when its session id is
    /// already owned by a different attempt.
    async fn save_attempt(&self, attempt: &VerificationAttempt) -> StoreResult<()>;

    /// Get an attempt by primary id.
    async fn get_attempt(&self, attempt_id: &AttemptId)
        -> StoreResult<Option<VerificationAttempt>>;

    /// Get an attempt through the unique session index.
    async fn get_attempt_by_session(
        &self,
        session_id: &SessionId,
    ) -> StoreResult<Option<VerificationAttempt>>;

    /// Conditionally finalize an attempt: apply the terminal outcome and
    /// merge webhook metadata only while the stored status is pending.
    /// Exactly one of any set of concurrent calls observes `Applied`.
    async fn finalize_attempt(
        &self,
        attempt_id: &AttemptId,
        outcome: VerificationOutcome,
        metadata: AttemptMetadata,
        now: DateTime<Utc>,
    ) -> StoreResult<FinalizeStatus>;

    // ==================== User operations ====================

    /// Save (insert or replace) a user profile.
    async fn save_user(&self, profile: &UserProfile) -> StoreResult<()>;

    /// Get a user profile by id.
    async fn get_user(&self, user_id: &UserId) -> StoreResult<Option<UserProfile>>;

    // ==================== Notification operations ====================

    /// Save a notification record.
    async fn save_notification(&self, notification: &Notification) -> StoreResult<()>;

    /// List a user's notifications, newest first.
    async fn list_notifications(
        &self,
        user_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> StoreResult<Vec<Notification>>;

    // ==================== Maintenance ====================

    /// Aggregate counts across the store.
    async fn get_stats(&self) -> StoreResult<StoreStats>;
}

/// Store statistics
#[derive(Debug, Clone, Default)]
pub struct StoreStats {
    pub total_attempts: u64,
    pub pending_attempts: u64,
    pub completed_attempts: u64,
    pub failed_attempts: u64,
    pub total_users: u64,
    pub total_notifications: u64,
}

/// Storage configuration
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Data directory for the sled backend
    pub data_dir: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: "./agegate_data".to_string(),
        }
    }
}

pub use self::sled::SledStore;
pub use memory::MemoryStore;
