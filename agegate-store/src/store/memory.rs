//! In-memory store implementation
//!
//! Thread-safe maps behind RwLocks, used by tests and development. The
//! attempts map is always locked before the session index so multi-lock
//! paths cannot deadlock.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use agegate_core::outcome::VerificationOutcome;
use agegate_core::types::{
    AttemptId, AttemptMetadata, AttemptStatus, Notification, NotificationId, SessionId, UserId,
    UserProfile, VerificationAttempt,
};

use super::{FinalizeStatus, StoreStats, VerificationStore};
use crate::error::{StoreError, StoreResult};

/// In-memory store
#[derive(Debug)]
pub struct MemoryStore {
    attempts: Arc<RwLock<HashMap<AttemptId, VerificationAttempt>>>,
    session_index: Arc<RwLock<HashMap<SessionId, AttemptId>>>,
    users: Arc<RwLock<HashMap<UserId, UserProfile>>>,
    notifications: Arc<RwLock<HashMap<NotificationId, Notification>>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an empty in-memory store.
    pub fn new() -> Self {
        Self {
            attempts: Arc::new(RwLock::new(HashMap::new())),
            session_index: Arc::new(RwLock::new(HashMap::new())),
            users: Arc::new(RwLock::new(HashMap::new())),
            notifications: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Drop all data.
    pub async fn clear(&self) {
        self.attempts.write().await.clear();
        self.session_index.write().await.clear();
        self.users.write().await.clear();
        self.notifications.write().await.clear();
    }
}

#[async_trait]
impl VerificationStore for MemoryStore {
    // ==================== Attempt operations ====================

    async fn save_attempt(&self, attempt: &VerificationAttempt) -> StoreResult<()> {
        let mut attempts = self.attempts.write().await;
        let mut sessions = self.session_index.write().await;

        if let Some(owner) = sessions.get(&attempt.session_id) {
            if owner != &attempt.attempt_id {
                return Err(StoreError::SessionTaken(attempt.session_id.to_string()));
            }
        }

        sessions.insert(attempt.session_id.clone(), attempt.attempt_id.clone());
        attempts.insert(attempt.attempt_id.clone(), attempt.clone());
        Ok(())
    }

    async fn get_attempt(
        &self,
        attempt_id: &AttemptId,
    ) -> StoreResult<Option<VerificationAttempt>> {
        let attempts = self.attempts.read().await;
        Ok(attempts.get(attempt_id).cloned())
    }

    async fn get_attempt_by_session(
        &self,
        session_id: &SessionId,
    ) -> StoreResult<Option<VerificationAttempt>> {
        let attempts = self.attempts.read().await;
        let sessions = self.session_index.read().await;

        match sessions.get(session_id) {
            Some(attempt_id) => Ok(attempts.get(attempt_id).cloned()),
            None => Ok(None),
        }
    }

    async fn finalize_attempt(
        &self,
        attempt_id: &AttemptId,
        outcome: VerificationOutcome,
        metadata: AttemptMetadata,
        now: DateTime<Utc>,
    ) -> StoreResult<FinalizeStatus> {
        let mut attempts = self.attempts.write().await;
        let attempt = attempts
            .get_mut(attempt_id)
            .ok_or_else(|| StoreError::AttemptMissing(attempt_id.to_string()))?;

        if attempt.status.is_terminal() {
            return Ok(FinalizeStatus::AlreadyFinal(attempt.clone()));
        }

        attempt.finalize(outcome, metadata, now);
        Ok(FinalizeStatus::Applied(attempt.clone()))
    }

    // ==================== User operations ====================

    async fn save_user(&self, profile: &UserProfile) -> StoreResult<()> {
        let mut users = self.users.write().await;
        users.insert(profile.user_id.clone(), profile.clone());
        Ok(())
    }

    async fn get_user(&self, user_id: &UserId) -> StoreResult<Option<UserProfile>> {
        let users = self.users.read().await;
        Ok(users.get(user_id).cloned())
    }

    // ==================== Notification operations ====================

    async fn save_notification(&self, notification: &Notification) -> StoreResult<()> {
        let mut notifications = self.notifications.write().await;
        notifications.insert(notification.notification_id.clone(), notification.clone());
        Ok(())
    }

    async fn list_notifications(
        &self,
        user_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> StoreResult<Vec<Notification>> {
        let notifications = self.notifications.read().await;
        let mut items: Vec<Notification> = notifications
            .values()
            .filter(|n| &n.user_id == user_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(items.into_iter().skip(offset).take(limit).collect())
    }

    // ==================== Maintenance ====================

    async fn get_stats(&self) -> StoreResult<StoreStats> {
        let attempts = self.attempts.read().await;
        let users = self.users.read().await;
        let notifications = self.notifications.read().await;

        let mut stats = StoreStats {
            total_attempts: attempts.len() as u64,
            total_users: users.len() as u64,
            total_notifications: notifications.len() as u64,
            ..Default::default()
        };
        for attempt in attempts.values() {
            match attempt.status {
                AttemptStatus::Pending => stats.pending_attempts += 1,
                AttemptStatus::Completed => stats.completed_attempts += 1,
                AttemptStatus::Failed => stats.failed_attempts += 1,
            }
        }

        Ok(stats)
    }
}
