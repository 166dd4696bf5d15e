//! User profile endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;

use agegate_core::types::{AccountType, Notification, UserId, UserProfile};

use crate::dto::{
    CreateUserRequest, ListQueryParams, NotificationResponse, RegisterDeviceTokenRequest,
    UserResponse,
};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Create a user profile
pub async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    let now = Utc::now();
    let mut profile = UserProfile::new(UserId::generate(), now);

    profile.username = req.username;
    profile.email = req.email;
    profile.display_name = req.display_name;
    profile.avatar = req.avatar;
    profile.bio = req.bio;
    profile.date_of_birth = req.date_of_birth;
    if let Some(account_type) = req.account_type {
        profile.account_type = parse_account_type(&account_type)?;
    }
    profile.refresh_completion();

    state.store.save_user(&profile).await?;

    tracing::info!(user_id = %profile.user_id, "User profile created");

    Ok((StatusCode::CREATED, Json(user_to_response(&profile))))
}

/// Get a user profile
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<UserResponse>> {
    let user_id = UserId::new(user_id);

    let profile = state
        .store
        .get_user(&user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("User {} not found", user_id)))?;

    Ok(Json(user_to_response(&profile)))
}

/// Register a device push token for a user
pub async fn register_device_token(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(req): Json<RegisterDeviceTokenRequest>,
) -> ApiResult<StatusCode> {
    let user_id = UserId::new(user_id);

    let mut profile = state
        .store
        .get_user(&user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("User {} not found", user_id)))?;

    profile.device_token = Some(req.device_token);
    profile.updated_at = Utc::now();
    state.store.save_user(&profile).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// List a user's notifications, newest first
pub async fn list_notifications(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(params): Query<ListQueryParams>,
) -> ApiResult<Json<Vec<NotificationResponse>>> {
    let user_id = UserId::new(user_id);

    if state.store.get_user(&user_id).await?.is_none() {
        return Err(ApiError::NotFound(format!("User {} not found", user_id)));
    }

    let notifications = state
        .store
        .list_notifications(&user_id, params.limit, params.offset)
        .await?;

    Ok(Json(
        notifications.iter().map(notification_to_response).collect(),
    ))
}

// Helper functions

fn parse_account_type(value: &str) -> Result<AccountType, ApiError> {
    match value {
        "anonymous" => Ok(AccountType::Anonymous),
        "individual" => Ok(AccountType::Individual),
        "family" => Ok(AccountType::Family),
        other => Err(ApiError::Validation(format!(
            "Invalid account type: {}",
            other
        ))),
    }
}

pub(crate) fn user_to_response(profile: &UserProfile) -> UserResponse {
    UserResponse {
        user_id: profile.user_id.to_string(),
        username: profile.username.clone(),
        email: profile.email.clone(),
        display_name: profile.display_name.clone(),
        avatar: profile.avatar.clone(),
        bio: profile.bio.clone(),
        date_of_birth: profile.date_of_birth.clone(),
        age_verification_status: profile.age_verification_status.to_string(),
        age_verification_date: profile.age_verification_date,
        verification_method: profile.verification_method.clone(),
        profile_completion: profile.profile_completion,
        onboarding_complete: profile.onboarding_complete,
        account_type: profile.account_type.to_string(),
        has_device_token: profile.device_token.is_some(),
        created_at: profile.created_at,
        updated_at: profile.updated_at,
    }
}

fn notification_to_response(notification: &Notification) -> NotificationResponse {
    NotificationResponse {
        notification_id: notification.notification_id.to_string(),
        kind: notification.kind.as_str().to_string(),
        title: notification.title.clone(),
        message: notification.message.clone(),
        read: notification.read,
        created_at: notification.created_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_account_type() {
        assert_eq!(parse_account_type("anonymous").unwrap(), AccountType::Anonymous);
        assert_eq!(parse_account_type("family").unwrap(), AccountType::Family);
        assert!(parse_account_type("corporate").is_err());
    }
}
