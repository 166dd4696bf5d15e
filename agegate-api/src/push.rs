//! Push dispatch gateway
//!
//! Outbound device push for verification updates. Delivery is
//! fire-and-forget: the caller logs failures and never lets them block
//! webhook acknowledgment.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Push dispatch errors
#[derive(Error, Debug)]
pub enum PushError {
    #[error("Push request failed: {0}")]
    Request(String),

    #[error("Push relay returned status {0}")]
    Status(u16),
}

/// Push gateway configuration
#[derive(Debug, Clone, Default)]
pub struct PushConfig {
    /// Relay endpoint URL; push is disabled when unset
    pub endpoint: Option<String>,
    /// Optional bearer token for the relay
    pub token: Option<String>,
}

impl PushConfig {
    /// Load configuration from environment variables
    ///
    /// - `AGEGATE_PUSH_ENDPOINT`: relay URL (unset disables push)
    /// - `AGEGATE_PUSH_TOKEN`: optional bearer token
    pub fn from_env() -> Self {
        Self {
            endpoint: std::env::var("AGEGATE_PUSH_ENDPOINT").ok(),
            token: std::env::var("AGEGATE_PUSH_TOKEN").ok(),
        }
    }
}

/// Outbound push message
#[derive(Debug, Clone, Serialize)]
pub struct PushMessage {
    /// Target device token
    pub to: String,
    pub notification: PushNotification,
    pub data: PushData,
}

/// Visible notification content
#[derive(Debug, Clone, Serialize)]
pub struct PushNotification {
    pub title: String,
    pub body: String,
}

/// Opaque data delivered alongside the notification
#[derive(Debug, Clone, Serialize)]
pub struct PushData {
    pub kind: String,
}

/// Push delivery backend
#[async_trait]
pub trait PushGateway: Send + Sync {
    async fn send(&self, message: &PushMessage) -> Result<(), PushError>;
}

/// HTTP relay gateway
pub struct HttpPushGateway {
    client: Client,
    endpoint: String,
    token: Option<String>,
}

impl HttpPushGateway {
    /// Create a gateway posting to `endpoint`.
    pub fn new(endpoint: impl Into<String>, token: Option<String>) -> Result<Self, PushError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| PushError::Request(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            token,
        })
    }
}

#[async_trait]
impl PushGateway for HttpPushGateway {
    async fn send(&self, message: &PushMessage) -> Result<(), PushError> {
        let mut request = self.client.post(&self.endpoint).json(message);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| PushError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PushError::Status(status.as_u16()));
        }

        tracing::debug!("Push dispatched to relay");
        Ok(())
    }
}

/// Discarding gateway, used when no relay is configured and in tests
#[derive(Debug, Default)]
pub struct NoopPushGateway;

#[async_trait]
impl PushGateway for NoopPushGateway {
    async fn send(&self, message: &PushMessage) -> Result<(), PushError> {
        tracing::debug!(title = %message.notification.title, "Push discarded (no relay configured)");
        Ok(())
    }
}

/// Build the gateway matching `config`.
///
/// Falls back to the discarding gateway when no endpoint is configured
/// or the HTTP client cannot be built.
pub fn create_push_gateway(config: &PushConfig) -> Arc<dyn PushGateway> {
    match &config.endpoint {
        Some(endpoint) => match HttpPushGateway::new(endpoint.clone(), config.token.clone()) {
            Ok(gateway) => Arc::new(gateway),
            Err(e) => {
                tracing::warn!("Push relay client failed to build, push disabled: {}", e);
                Arc::new(NoopPushGateway)
            }
        },
        None => Arc::new(NoopPushGateway),
    }
}
