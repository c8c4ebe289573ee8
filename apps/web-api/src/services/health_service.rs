//! Health check endpoint.
//!
//! Reports database connectivity and migration progress for monitoring.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use crate::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServingStatus {
    Serving,
    NotServing,
}

#[derive(Debug, Serialize)]
pub struct HealthCheckResponse {
    pub status: ServingStatus,
    pub message: String,
    pub migrations_applied: usize,
    pub migrations_total: usize,
    pub server_time: DateTime<Utc>,
}

/// `GET /health`
pub async fn check(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthCheckResponse>) {
    let (status, message) = check_database_health(&state).await;

    let (migrations_total, migrations_applied) = match state.db.migration_status().await {
        Ok(counts) => counts,
        Err(e) => {
            warn!(error = %e, "Could not read migration status");
            (0, 0)
        }
    };

    let code = match status {
        ServingStatus::Serving => StatusCode::OK,
        ServingStatus::NotServing => StatusCode::SERVICE_UNAVAILABLE,
    };

    (
        code,
        Json(HealthCheckResponse {
            status,
            message,
            migrations_applied,
            migrations_total,
            server_time: Utc::now(),
        }),
    )
}

async fn check_database_health(state: &AppState) -> (ServingStatus, String) {
    if state.db.health_check().await {
        (ServingStatus::Serving, "Database connected".to_string())
    } else {
        (ServingStatus::NotServing, "Database unreachable".to_string())
    }
}
