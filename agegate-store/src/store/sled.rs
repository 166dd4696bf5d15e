//! Sled-backed store implementation
//!
//! Each record family lives in a named tree. Finalization uses
//! `compare_and_swap` on the attempt record so a terminal status is
//! written at most once even under concurrent webhook deliveries, and
//! session ids are claimed the same way.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

use agegate_core::outcome::VerificationOutcome;
use agegate_core::types::{
    AttemptId, AttemptMetadata, AttemptStatus, Notification, NotificationId, SessionId, UserId,
    UserProfile, VerificationAttempt,
};

use super::{FinalizeStatus, StoreConfig, StoreStats, VerificationStore};
use crate::error::{StoreError, StoreResult};

const ATTEMPTS_TREE: &str = "attempts";
const SESSIONS_TREE: &str = "session_index";
const USERS_TREE: &str = "users";
const NOTIFICATIONS_TREE: &str = "notifications";
const USER_NOTIFICATIONS_TREE: &str = "user_notifications";

/// Sled-backed store
pub struct SledStore {
    db: sled::Db,
    attempts: sled::Tree,
    sessions: sled::Tree,
    users: sled::Tree,
    notifications: sled::Tree,
    user_notifications: sled::Tree,
}

impl SledStore {
    /// Open (or create) the database under the configured data directory.
    pub fn new(config: &StoreConfig) -> StoreResult<Self> {
        Self::open(&config.data_dir)
    }

    /// Open (or create) the database at an explicit path.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let db = sled::open(path)
            .map_err(|e| StoreError::Storage(format!("Failed to open sled db: {}", e)))?;

        let attempts = Self::tree(&db, ATTEMPTS_TREE)?;
        let sessions = Self::tree(&db, SESSIONS_TREE)?;
        let users = Self::tree(&db, USERS_TREE)?;
        let notifications = Self::tree(&db, NOTIFICATIONS_TREE)?;
        let user_notifications = Self::tree(&db, USER_NOTIFICATIONS_TREE)?;

        Ok(Self {
            db,
            attempts,
            sessions,
            users,
            notifications,
            user_notifications,
        })
    }

    fn tree(db: &sled::Db, name: &str) -> StoreResult<sled::Tree> {
        db.open_tree(name)
            .map_err(|e| StoreError::Storage(format!("Failed to open tree {}: {}", name, e)))
    }

    /// Flush dirty pages to disk.
    pub fn flush(&self) -> StoreResult<()> {
        self.db
            .flush()
            .map_err(|e| StoreError::Storage(format!("Failed to flush db: {}", e)))?;
        Ok(())
    }

    /// Drop all data from every tree.
    pub fn clear(&self) -> StoreResult<()> {
        for tree in [
            &self.attempts,
            &self.sessions,
            &self.users,
            &self.notifications,
            &self.user_notifications,
        ] {
            tree.clear()
                .map_err(|e| StoreError::Storage(format!("Failed to clear tree: {}", e)))?;
        }
        Ok(())
    }

    fn serialize<T: Serialize>(value: &T) -> StoreResult<Vec<u8>> {
        serde_json::to_vec(value)
            .map_err(|e| StoreError::Serialization(format!("Failed to serialize: {}", e)))
    }

    fn deserialize<T: DeserializeOwned>(bytes: &[u8]) -> StoreResult<T> {
        serde_json::from_slice(bytes)
            .map_err(|e| StoreError::Serialization(format!("Failed to deserialize: {}", e)))
    }

    /// Claim `session_id` for `attempt_id`, failing if another attempt
    /// already holds it. Re-claiming by the same attempt is a no-op.
    fn claim_session(&self, session_id: &SessionId, attempt_id: &AttemptId) -> StoreResult<()> {
        let owner = attempt_id.as_str().as_bytes().to_vec();
        let claim = self
            .sessions
            .compare_and_swap(
                session_id.as_str().as_bytes(),
                None::<&[u8]>,
                Some(owner.clone()),
            )
            .map_err(|e| StoreError::Storage(format!("Failed to claim session: {}", e)))?;

        if let Err(cas) = claim {
            if cas.current.as_deref() != Some(owner.as_slice()) {
                return Err(StoreError::SessionTaken(session_id.to_string()));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl VerificationStore for SledStore {
    // ==================== Attempt operations ====================

    async fn save_attempt(&self, attempt: &VerificationAttempt) -> StoreResult<()> {
        self.claim_session(&attempt.session_id, &attempt.attempt_id)?;

        let bytes = Self::serialize(attempt)?;
        self.attempts
            .insert(attempt.attempt_id.as_str().as_bytes(), bytes)
            .map_err(|e| StoreError::Storage(format!("Failed to save attempt: {}", e)))?;
        Ok(())
    }

    async fn get_attempt(
        &self,
        attempt_id: &AttemptId,
    ) -> StoreResult<Option<VerificationAttempt>> {
        match self
            .attempts
            .get(attempt_id.as_str().as_bytes())
            .map_err(|e| StoreError::Storage(format!("Failed to get attempt: {}", e)))?
        {
            Some(bytes) => Ok(Some(Self::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn get_attempt_by_session(
        &self,
        session_id: &SessionId,
    ) -> StoreResult<Option<VerificationAttempt>> {
        let owner = self
            .sessions
            .get(session_id.as_str().as_bytes())
            .map_err(|e| StoreError::Storage(format!("Failed to resolve session: {}", e)))?;

        match owner {
            Some(bytes) => {
                let attempt_id: AttemptId =
                    AttemptId::new(String::from_utf8_lossy(&bytes).into_owned());
                self.get_attempt(&attempt_id).await
            }
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
        let key = attempt_id.as_str().as_bytes();

        loop {
            let current_bytes = self
                .attempts
                .get(key)
                .map_err(|e| StoreError::Storage(format!("Failed to get attempt: {}", e)))?
                .ok_or_else(|| StoreError::AttemptMissing(attempt_id.to_string()))?;
            let current: VerificationAttempt = Self::deserialize(&current_bytes)?;

            if current.status.is_terminal() {
                return Ok(FinalizeStatus::AlreadyFinal(current));
            }

            let mut updated = current.clone();
            updated.finalize(outcome, metadata.clone(), now);
            let new_bytes = Self::serialize(&updated)?;

            let swap = self
                .attempts
                .compare_and_swap(key, Some(current_bytes), Some(new_bytes))
                .map_err(|e| StoreError::Storage(format!("Failed to finalize attempt: {}", e)))?;

            match swap {
                Ok(()) => return Ok(FinalizeStatus::Applied(updated)),
                // Lost the race against a concurrent writer; re-read.
                Err(_) => continue,
            }
        }
    }

    // ==================== User operations ====================

    async fn save_user(&self, profile: &UserProfile) -> StoreResult<()> {
        let bytes = Self::serialize(profile)?;
        self.users
            .insert(profile.user_id.as_str().as_bytes(), bytes)
            .map_err(|e| StoreError::Storage(format!("Failed to save user: {}", e)))?;
        Ok(())
    }

    async fn get_user(&self, user_id: &UserId) -> StoreResult<Option<UserProfile>> {
        match self
            .users
            .get(user_id.as_str().as_bytes())
            .map_err(|e| StoreError::Storage(format!("Failed to get user: {}", e)))?
        {
            Some(bytes) => Ok(Some(Self::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    // ==================== Notification operations ====================

    async fn save_notification(&self, notification: &Notification) -> StoreResult<()> {
        let bytes = Self::serialize(notification)?;
        self.notifications
            .insert(notification.notification_id.as_str().as_bytes(), bytes)
            .map_err(|e| StoreError::Storage(format!("Failed to save notification: {}", e)))?;

        let user_key = notification.user_id.as_str().as_bytes();
        let mut ids: Vec<NotificationId> = match self
            .user_notifications
            .get(user_key)
            .map_err(|e| StoreError::Storage(format!("Failed to get notification index: {}", e)))?
        {
            Some(bytes) => Self::deserialize(&bytes)?,
            None => Vec::new(),
        };

        if !ids.contains(&notification.notification_id) {
            ids.push(notification.notification_id.clone());
            self.user_notifications
                .insert(user_key, Self::serialize(&ids)?)
                .map_err(|e| {
                    StoreError::Storage(format!("Failed to update notification index: {}", e))
                })?;
        }
        Ok(())
    }

    async fn list_notifications(
        &self,
        user_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> StoreResult<Vec<Notification>> {
        let ids: Vec<NotificationId> = match self
            .user_notifications
            .get(user_id.as_str().as_bytes())
            .map_err(|e| StoreError::Storage(format!("Failed to get notification index: {}", e)))?
        {
            Some(bytes) => Self::deserialize(&bytes)?,
            None => return Ok(Vec::new()),
        };

        // Ids are appended in creation order, so newest first is a reverse walk.
        let mut items = Vec::new();
        for id in ids.iter().rev().skip(offset).take(limit) {
            let bytes = self
                .notifications
                .get(id.as_str().as_bytes())
                .map_err(|e| StoreError::Storage(format!("Failed to get notification: {}", e)))?;
            if let Some(bytes) = bytes {
                items.push(Self::deserialize(&bytes)?);
            }
        }
        Ok(items)
    }

    // ==================== Maintenance ====================

    async fn get_stats(&self) -> StoreResult<StoreStats> {
        let mut stats = StoreStats {
            total_users: self.users.len() as u64,
            total_notifications: self.notifications.len() as u64,
            ..Default::default()
        };

        for entry in self.attempts.iter() {
            let (_, bytes) =
                entry.map_err(|e| StoreError::Storage(format!("Failed to scan attempts: {}", e)))?;
            let attempt: VerificationAttempt = Self::deserialize(&bytes)?;
            stats.total_attempts += 1;
            match attempt.status {
                AttemptStatus::Pending => stats.pending_attempts += 1,
                AttemptStatus::Completed => stats.completed_attempts += 1,
                AttemptStatus::Failed => stats.failed_attempts += 1,
            }
        }

        Ok(stats)
    }
}
