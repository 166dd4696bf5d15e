//! Application state for the API server

use agegate_store::VerificationStore;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::auth::WebhookCredentials;
use crate::push::PushGateway;
use crate::services::WebhookService;

/// API server state
#[derive(Clone)]
pub struct AppState {
    /// Verification record store
    pub store: Arc<dyn VerificationStore>,
    /// Webhook processing pipeline
    pub webhooks: Arc<WebhookService>,
    /// Expected webhook credentials
    pub credentials: WebhookCredentials,
    /// Process start time (for uptime reporting)
    pub started_at: DateTime<Utc>,
    /// API version
    pub version: String,
}

impl AppState {
    /// Create new app state from its collaborators
    pub fn new(
        store: Arc<dyn VerificationStore>,
        push: Arc<dyn PushGateway>,
        credentials: WebhookCredentials,
    ) -> Self {
        let webhooks = Arc::new(WebhookService::new(store.clone(), push));

        Self {
            store,
            webhooks,
            credentials,
            started_at: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    pub enable_cors: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            enable_cors: true,
        }
    }
}
