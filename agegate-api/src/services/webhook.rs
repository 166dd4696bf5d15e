//! Webhook processing pipeline
//!
//! Owns every step after authentication and schema validation:
//! classify the event, find the attempt, finalize it exactly once,
//! then run the follow-ups (profile update, notification, device push,
//! account promotion). The finalize is the authoritative state change;
//! each follow-up is individually fault-isolated and logged with the
//! session id, so a failure in one never blocks the others or the
//! provider acknowledgment.

use chrono::{DateTime, Utc};
use std::sync::Arc;

use agegate_core::outcome::{ProviderVerdict, VerificationOutcome};
use agegate_core::types::{
    AccountType, AttemptMetadata, Notification, ProviderEvent, SessionId, UserId, UserProfile,
};
use agegate_store::{FinalizeStatus, VerificationStore};

use crate::error::{ApiError, ApiResult};
use crate::push::{PushData, PushGateway, PushMessage, PushNotification};

/// What one webhook delivery amounted to, as reported back to the provider
#[derive(Debug)]
pub struct ProcessedWebhook {
    /// Attempt status after processing (pending, completed, failed)
    pub status: String,
    pub message: String,
}

/// Webhook processing service
pub struct WebhookService {
    store: Arc<dyn VerificationStore>,
    push: Arc<dyn PushGateway>,
}

impl WebhookService {
    pub fn new(store: Arc<dyn VerificationStore>, push: Arc<dyn PushGateway>) -> Self {
        Self { store, push }
    }

    /// Process one provider event end to end.
    pub async fn process_event(&self, event: ProviderEvent) -> ApiResult<ProcessedWebhook> {
        let session_id = event.session_id.clone();
        let verdict = ProviderVerdict::classify(&event);

        let attempt = self
            .store
            .get_attempt_by_session(&session_id)
            .await?
            .ok_or_else(|| {
                ApiError::NotFound(format!(
                    "Verification attempt not found for session {}",
                    session_id
                ))
            })?;

        let outcome = match verdict.outcome() {
            Some(outcome) => outcome,
            None => {
                // In-flight or unrecognized event: acknowledge without
                // mutating so the provider does not retry.
                if verdict == ProviderVerdict::Unknown {
                    tracing::warn!(
                        session_id = %session_id,
                        event_type = %event.event_type,
                        provider_status = %event.status,
                        "Unrecognized provider status, leaving attempt untouched"
                    );
                } else {
                    tracing::info!(
                        session_id = %session_id,
                        provider_status = %event.status,
                        "In-flight provider status, leaving attempt untouched"
                    );
                }
                return Ok(ProcessedWebhook {
                    status: attempt.status.to_string(),
                    message: "Webhook acknowledged".to_string(),
                });
            }
        };

        let now = Utc::now();
        let finalized = self
            .store
            .finalize_attempt(&attempt.attempt_id, outcome, webhook_metadata(&event, now), now)
            .await?;

        let attempt = match finalized {
            FinalizeStatus::Applied(attempt) => attempt,
            FinalizeStatus::AlreadyFinal(existing) => {
                tracing::info!(
                    session_id = %session_id,
                    status = %existing.status,
                    "Duplicate webhook delivery, attempt already finalized"
                );
                return Ok(ProcessedWebhook {
                    status: existing.status.to_string(),
                    message: "Webhook already processed".to_string(),
                });
            }
        };

        tracing::info!(
            session_id = %session_id,
            user_id = %attempt.user_id,
            outcome = %outcome,
            "Verification attempt finalized"
        );

        // The authoritative state change is committed; everything below
        // is best-effort.
        let profile = self
            .apply_outcome_to_profile(&attempt.user_id, &session_id, outcome, &attempt.method, now)
            .await;

        let device_token = profile.as_ref().and_then(|p| p.device_token.clone());
        self.notify_user(
            &attempt.user_id,
            &session_id,
            outcome,
            &event.rejection_reasons,
            device_token.as_deref(),
            now,
        )
        .await;

        if outcome == VerificationOutcome::Completed {
            self.promote_if_complete(&attempt.user_id, &session_id, now).await;
        }

        Ok(ProcessedWebhook {
            status: attempt.status.to_string(),
            message: "Webhook processed successfully".to_string(),
        })
    }

    /// Record the outcome on the profile and recompute completion.
    async fn apply_outcome_to_profile(
        &self,
        user_id: &UserId,
        session_id: &SessionId,
        outcome: VerificationOutcome,
        method: &str,
        now: DateTime<Utc>,
    ) -> Option<UserProfile> {
        match self.update_profile(user_id, outcome, method, now).await {
            Ok(profile) => Some(profile),
            Err(err) => {
                tracing::error!(
                    session_id = %session_id,
                    user_id = %user_id,
                    "Profile update failed: {}",
                    err
                );
                None
            }
        }
    }

    async fn update_profile(
        &self,
        user_id: &UserId,
        outcome: VerificationOutcome,
        method: &str,
        now: DateTime<Utc>,
    ) -> ApiResult<UserProfile> {
        let mut profile = self
            .store
            .get_user(user_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("User {} not found", user_id)))?;

        profile.age_verification_status = outcome.verification_status();
        profile.age_verification_date = match outcome {
            VerificationOutcome::Completed => Some(now),
            VerificationOutcome::Failed => None,
        };
        profile.verification_method = Some(method.to_string());
        profile.refresh_completion();
        profile.updated_at = now;

        self.store.save_user(&profile).await?;
        Ok(profile)
    }

    /// Write the notification record, then push to the device if a token
    /// is registered.
    async fn notify_user(
        &self,
        user_id: &UserId,
        session_id: &SessionId,
        outcome: VerificationOutcome,
        rejection_reasons: &[String],
        device_token: Option<&str>,
        now: DateTime<Utc>,
    ) {
        let notification =
            Notification::verification_update(user_id.clone(), outcome, rejection_reasons, now);

        if let Err(err) = self.store.save_notification(&notification).await {
            tracing::error!(
                session_id = %session_id,
                user_id = %user_id,
                "Notification write failed: {}",
                err
            );
            return;
        }

        let token = match device_token {
            Some(token) => token,
            None => return,
        };

        let message = PushMessage {
            to: token.to_string(),
            notification: PushNotification {
                title: notification.title.clone(),
                body: notification.message.clone(),
            },
            data: PushData {
                kind: notification.kind.as_str().to_string(),
            },
        };
        if let Err(err) = self.push.send(&message).await {
            tracing::warn!(
                session_id = %session_id,
                user_id = %user_id,
                "Push dispatch failed: {}",
                err
            );
        }
    }

    /// Promote a complete anonymous profile to a family account.
    async fn promote_if_complete(&self, user_id: &UserId, session_id: &SessionId, now: DateTime<Utc>) {
        if let Err(err) = self.try_promote(user_id, now).await {
            tracing::error!(
                session_id = %session_id,
                user_id = %user_id,
                "Account promotion failed: {}",
                err
            );
        }
    }

    async fn try_promote(&self, user_id: &UserId, now: DateTime<Utc>) -> ApiResult<()> {
        // Re-read so the check sees the completion score written above.
        let mut profile = match self.store.get_user(user_id).await? {
            Some(profile) => profile,
            None => return Ok(()),
        };

        if profile.is_complete() && profile.account_type == AccountType::Anonymous {
            profile.account_type = AccountType::Family;
            profile.updated_at = now;
            self.store.save_user(&profile).await?;
            tracing::info!(user_id = %user_id, "Anonymous account promoted to family");
        }
        Ok(())
    }
}

/// Fold the webhook payload into attempt metadata.
fn webhook_metadata(event: &ProviderEvent, now: DateTime<Utc>) -> AttemptMetadata {
    AttemptMetadata {
        date_of_birth: event
            .verification_data
            .as_ref()
            .and_then(|data| data.date_of_birth.clone()),
        provider_identification_id: Some(event.identification_id.clone()),
        provider_status: Some(event.status.clone()),
        verification_data: event.verification_data.clone(),
        rejection_reasons: event.rejection_reasons.clone(),
        webhook_received_at: Some(now),
    }
}
