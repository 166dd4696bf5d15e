//! Data Transfer Objects for API requests and responses

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============ Webhook DTOs ============

/// Inbound provider webhook envelope
///
/// Field names follow the provider's PascalCase wire format. Unknown
/// fields are rejected so schema drift surfaces as a 400 instead of
/// being silently dropped.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct WebhookEnvelope {
    /// Provider event type, e.g. "KycIdentification.Approved"
    pub event_type: String,
    pub payload: WebhookPayload,
}

/// Webhook event payload
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct WebhookPayload {
    /// Provider-side identification id
    pub id: String,
    /// Session id assigned when the attempt was started
    pub external_reference_id: String,
    /// Raw provider status string
    pub status: String,
    /// Extracted document data (present on approved events)
    pub verification_data: Option<VerificationDataDto>,
    /// Rejection reasons (present on rejected events)
    pub rejection_reasons: Option<Vec<String>>,
}

/// Extracted document data
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct VerificationDataDto {
    pub date_of_birth: Option<String>,
    pub age: Option<u32>,
    pub document_type: Option<String>,
    pub document_number: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Webhook acknowledgment response
#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub success: bool,
    pub message: String,
    /// Attempt status after processing (pending, completed, failed)
    pub status: String,
}

// ============ Verification DTOs ============

/// Start verification request
#[derive(Debug, Deserialize)]
pub struct StartVerificationRequest {
    /// User the attempt belongs to
    pub user_id: String,
    /// Verification method label (defaults to "ondato")
    pub method: Option<String>,
    /// Declared date of birth, carried in attempt metadata
    pub date_of_birth: Option<String>,
    /// Provider-hosted verification URL for the client to open
    pub verification_url: Option<String>,
}

/// Verification attempt response
#[derive(Debug, Serialize)]
pub struct AttemptResponse {
    pub attempt_id: String,
    pub session_id: String,
    pub user_id: String,
    pub method: String,
    pub status: String,
    pub verification_url: Option<String>,
    pub provider_status: Option<String>,
    pub rejection_reasons: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

// ============ User DTOs ============

/// Create user request
#[derive(Debug, Deserialize, Default)]
pub struct CreateUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub avatar: Option<String>,
    pub bio: Option<String>,
    pub date_of_birth: Option<String>,
    /// Account classification (anonymous, individual, family)
    pub account_type: Option<String>,
}

/// User profile response
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user_id: String,
    pub username: Option<String>,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub avatar: Option<String>,
    pub bio: Option<String>,
    pub date_of_birth: Option<String>,
    pub age_verification_status: String,
    pub age_verification_date: Option<DateTime<Utc>>,
    pub verification_method: Option<String>,
    pub profile_completion: u8,
    pub onboarding_complete: bool,
    pub account_type: String,
    /// Whether a push token is registered (the token itself is never echoed)
    pub has_device_token: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Register device token request
#[derive(Debug, Deserialize)]
pub struct RegisterDeviceTokenRequest {
    pub device_token: String,
}

// ============ Notification DTOs ============

/// Notification response
#[derive(Debug, Serialize)]
pub struct NotificationResponse {
    pub notification_id: String,
    pub kind: String,
    pub title: String,
    pub message: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

// ============ Health DTOs ============

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

/// Store statistics response
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub total_attempts: u64,
    pub pending_attempts: u64,
    pub completed_attempts: u64,
    pub failed_attempts: u64,
    pub total_users: u64,
    pub total_notifications: u64,
}

// ============ Pagination ============

/// Query parameters for list endpoints
#[derive(Debug, Deserialize, Default)]
pub struct ListQueryParams {
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    100
}
