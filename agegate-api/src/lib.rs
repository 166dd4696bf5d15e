//! Agegate API Server
//!
//! Provides the REST API for age-verification webhook ingestion and
//! status reconciliation.
//!
//! ## Endpoints
//!
//! ### Webhook Channel
//! - POST /webhooks/verification - Receive provider verification events (Basic auth)
//!
//! ### Verification Management
//! - POST /api/v1/verifications - Start verification attempt
//! - GET /api/v1/verifications/:session_id - Get attempt by session
//!
//! ### User Management
//! - POST /api/v1/users - Create user profile
//! - GET /api/v1/users/:user_id - Get user profile
//! - PUT /api/v1/users/:user_id/device-token - Register push token
//! - GET /api/v1/users/:user_id/notifications - List notifications
//!
//! ### Operations
//! - GET /health - Liveness check
//! - GET /ready - Readiness check
//! - GET /api/v1/stats - Store statistics

pub mod auth;
pub mod dto;
pub mod error;
pub mod push;
pub mod routes;
pub mod server;
pub mod services;
pub mod state;

pub use auth::*;
pub use dto::*;
pub use error::*;
pub use push::*;
pub use routes::create_router;
pub use server::*;
pub use services::{ProcessedWebhook, WebhookService};
pub use state::*;
