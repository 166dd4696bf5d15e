//! Verification attempt endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;

use agegate_core::types::{AgeVerificationStatus, SessionId, UserId, VerificationAttempt};

use crate::dto::{AttemptResponse, StartVerificationRequest};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Start a verification attempt for a user
pub async fn start_verification(
    State(state): State<AppState>,
    Json(req): Json<StartVerificationRequest>,
) -> ApiResult<(StatusCode, Json<AttemptResponse>)> {
    let user_id = UserId::new(req.user_id);
    let now = Utc::now();

    let mut profile = state
        .store
        .get_user(&user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("User {} not found", user_id)))?;

    let method = req.method.unwrap_or_else(|| "ondato".to_string());
    let mut attempt = VerificationAttempt::open(user_id.clone(), method, now);
    attempt.verification_url = req.verification_url;
    attempt.metadata.date_of_birth = req.date_of_birth;

    state.store.save_attempt(&attempt).await?;

    // An open attempt marks the profile pending until the provider answers.
    profile.age_verification_status = AgeVerificationStatus::Pending;
    profile.updated_at = now;
    state.store.save_user(&profile).await?;

    tracing::info!(
        session_id = %attempt.session_id,
        user_id = %user_id,
        "Verification attempt started"
    );

    Ok((StatusCode::CREATED, Json(attempt_to_response(&attempt))))
}

/// Get a verification attempt by session id
pub async fn get_verification(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<Json<AttemptResponse>> {
    let session_id = SessionId::new(session_id);

    let attempt = state
        .store
        .get_attempt_by_session(&session_id)
        .await?
        .ok_or_else(|| {
            ApiError::NotFound(format!("Verification session {} not found", session_id))
        })?;

    Ok(Json(attempt_to_response(&attempt)))
}

// Helper functions

pub(crate) fn attempt_to_response(attempt: &VerificationAttempt) -> AttemptResponse {
    AttemptResponse {
        attempt_id: attempt.attempt_id.to_string(),
        session_id: attempt.session_id.to_string(),
        user_id: attempt.user_id.to_string(),
        method: attempt.method.clone(),
        status: attempt.status.to_string(),
        verification_url: attempt.verification_url.clone(),
        provider_status: attempt.metadata.provider_status.clone(),
        rejection_reasons: attempt.metadata.rejection_reasons.clone(),
        created_at: attempt.created_at,
        updated_at: attempt.updated_at,
        expires_at: attempt.expires_at,
    }
}
