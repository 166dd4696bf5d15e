//! Webhook Basic authentication
//!
//! The verification provider calls the webhook with `Authorization:
//! Basic base64(username:password)`. Expected credentials are loaded
//! from the environment and compared with exact string equality; any
//! missing, malformed, or mismatched header is a 401 and the request
//! never reaches the handler.

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, Method},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::Engine;

use crate::error::ApiError;
use crate::state::AppState;

/// Expected webhook credentials
#[derive(Debug, Clone, Default)]
pub struct WebhookCredentials {
    /// Basic auth username
    pub username: String,
    /// Basic auth password
    pub password: String,
}

impl WebhookCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Load credentials from environment variables
    ///
    /// - `AGEGATE_WEBHOOK_USERNAME`: expected Basic auth username
    /// - `AGEGATE_WEBHOOK_PASSWORD`: expected Basic auth password
    ///
    /// When both are unset every webhook request is rejected.
    pub fn from_env() -> Self {
        Self {
            username: std::env::var("AGEGATE_WEBHOOK_USERNAME").unwrap_or_default(),
            password: std::env::var("AGEGATE_WEBHOOK_PASSWORD").unwrap_or_default(),
        }
    }

    /// Validate a raw `Authorization` header value.
    pub fn verify_header(&self, header: Option<&str>) -> Result<(), ApiError> {
        if self.username.is_empty() && self.password.is_empty() {
            return Err(ApiError::Unauthorized(
                "Webhook credentials are not configured".to_string(),
            ));
        }

        let header = header.ok_or_else(|| {
            ApiError::Unauthorized("No authorization header provided".to_string())
        })?;

        let encoded = header.strip_prefix("Basic ").ok_or_else(|| {
            ApiError::Unauthorized("Expected Basic authorization scheme".to_string())
        })?;

        let decoded = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(|_| ApiError::Unauthorized("Invalid base64 credentials".to_string()))?;
        let credentials = String::from_utf8(decoded)
            .map_err(|_| ApiError::Unauthorized("Invalid UTF-8 in credentials".to_string()))?;

        let (username, password) = credentials
            .split_once(':')
            .ok_or_else(|| ApiError::Unauthorized("Malformed basic credentials".to_string()))?;

        if username == self.username && password == self.password {
            Ok(())
        } else {
            Err(ApiError::Unauthorized("Invalid credentials".to_string()))
        }
    }
}

/// Basic auth middleware for the webhook route
pub async fn webhook_auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    // Method dispatch happens inside the route; non-POST falls through
    // to the router's 405 instead of failing auth first.
    if request.method() != Method::POST {
        return next.run(request).await;
    }

    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    match state.credentials.verify_header(header) {
        Ok(()) => next.run(request).await,
        Err(err) => {
            tracing::warn!("Webhook authentication failed: {}", err);
            err.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn basic_header(username: &str, password: &str) -> String {
        format!(
            "Basic {}",
            base64::engine::general_purpose::STANDARD
                .encode(format!("{}:{}", username, password))
        )
    }

    #[test]
    fn test_valid_credentials_pass() {
        let creds = WebhookCredentials::new("hook", "secret");
        let header = basic_header("hook", "secret");
        assert!(creds.verify_header(Some(&header)).is_ok());
    }

    #[test]
    fn test_missing_header_rejected() {
        let creds = WebhookCredentials::new("hook", "secret");
        assert!(creds.verify_header(None).is_err());
    }

    #[test]
    fn test_wrong_scheme_rejected() {
        let creds = WebhookCredentials::new("hook", "secret");
        assert!(creds.verify_header(Some("Bearer abcdef")).is_err());
    }

    #[test]
    fn test_bad_base64_rejected() {
        let creds = WebhookCredentials::new("hook", "secret");
        assert!(creds.verify_header(Some("Basic %%%not-base64%%%")).is_err());
    }

    #[test]
    fn test_missing_colon_rejected() {
        let creds = WebhookCredentials::new("hook", "secret");
        let encoded = base64::engine::general_purpose::STANDARD.encode("hooksecret");
        let header = format!("Basic {}", encoded);
        assert!(creds.verify_header(Some(&header)).is_err());
    }

    #[test]
    fn test_wrong_password_rejected() {
        let creds = WebhookCredentials::new("hook", "secret");
        let header = basic_header("hook", "wrong");
        assert!(creds.verify_header(Some(&header)).is_err());
    }

    #[test]
    fn test_unconfigured_credentials_reject_everything() {
        let creds = WebhookCredentials::default();
        let header = basic_header("", "");
        assert!(creds.verify_header(Some(&header)).is_err());
    }

    #[test]
    fn test_password_may_contain_colons() {
        let creds = WebhookCredentials::new("hook", "se:cr:et");
        let header = basic_header("hook", "se:cr:et");
        assert!(creds.verify_header(Some(&header)).is_ok());
    }
}
