/// Health check endpoint
///
/// `GET /health` answers 200 whether or not the database is reachable;
/// the body says which. Load balancers key off the status code, humans
/// and alerts key off the `status` field.

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use taskdeck_shared::db::pool::health_check;

/// Health check response body
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// "healthy" or "degraded"
    pub status: String,

    /// Application version
    pub version: String,

    /// "connected" or "disconnected"
    pub database: String,
}

/// Reports liveness and database connectivity
///
/// Delegates the probe to [`health_check`], the same check the pool
/// runs at startup.
pub async fn health_check_handler(
    State(state): State<AppState>,
) -> ApiResult<Json<HealthResponse>> {
    let db_ok = health_check(&state.db).await.is_ok();

    let (status, database) = if db_ok {
        ("healthy", "connected")
    } else {
        ("degraded", "disconnected")
    };

    Ok(Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: database.to_string(),
    }))
}
