//! Health check route.
//!
//! ```json
//! { "status": "ok", "database": "ok", "migrations": "1/1", "uptime_seconds": 42 }
//! ```

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/health", get(health))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    database: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    migrations: Option<String>,
    uptime_seconds: u64,
}

async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let healthy = state.db.health_check().await;
    let migrations = mostrador_db::migrations::migration_status(state.db.pool())
        .await
        .ok()
        .map(|(total, applied)| format!("{applied}/{total}"));

    let body = HealthResponse {
        status: if healthy { "ok" } else { "error" },
        database: if healthy { "ok" } else { "error" },
        migrations,
        uptime_seconds: state.started_at.elapsed().as_secs(),
    };
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(body))
}
