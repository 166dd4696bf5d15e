//! Health and statistics endpoints

use axum::{extract::State, Json};
use chrono::Utc;

use crate::dto::{HealthResponse, StatsResponse};
use crate::error::ApiResult;
use crate::state::AppState;

/// Liveness check
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
        uptime_secs: uptime_secs(&state),
    })
}

/// Readiness check, verifies the store answers
pub async fn ready_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let status = match state.store.get_stats().await {
        Ok(_) => "ready",
        Err(e) => {
            tracing::error!("Readiness probe failed against the store: {}", e);
            "degraded"
        }
    };

    Json(HealthResponse {
        status: status.to_string(),
        version: state.version.clone(),
        uptime_secs: uptime_secs(&state),
    })
}

/// Aggregate store statistics
pub async fn stats(State(state): State<AppState>) -> ApiResult<Json<StatsResponse>> {
    let stats = state.store.get_stats().await?;

    Ok(Json(StatsResponse {
        total_attempts: stats.total_attempts,
        pending_attempts: stats.pending_attempts,
        completed_attempts: stats.completed_attempts,
        failed_attempts: stats.failed_attempts,
        total_users: stats.total_users,
        total_notifications: stats.total_notifications,
    }))
}

// Helper functions

fn uptime_secs(state: &AppState) -> u64 {
    (Utc::now() - state.started_at).num_seconds().max(0) as u64
}
