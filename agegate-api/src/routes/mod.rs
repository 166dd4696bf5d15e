//! API route handlers

pub mod health;
pub mod user;
pub mod verification;
pub mod webhook;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::auth::webhook_auth_middleware;
use crate::state::AppState;

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    let webhook_routes = Router::new()
        .route("/webhooks/verification", post(webhook::receive_webhook))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            webhook_auth_middleware,
        ));

    Router::new()
        // Health endpoints
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))
        .route("/api/v1/stats", get(health::stats))
        // Verification endpoints
        .route("/api/v1/verifications", post(verification::start_verification))
        .route(
            "/api/v1/verifications/:session_id",
            get(verification::get_verification),
        )
        // User endpoints
        .route("/api/v1/users", post(user::create_user))
        .route("/api/v1/users/:user_id", get(user::get_user))
        .route(
            "/api/v1/users/:user_id/device-token",
            put(user::register_device_token),
        )
        .route(
            "/api/v1/users/:user_id/notifications",
            get(user::list_notifications),
        )
        // Webhook channel (Basic auth)
        .merge(webhook_routes)
        .with_state(state)
}
