//! Liveness endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use tracing::warn;

use bazaar_db::migrations::migration_status;

use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: &'static str,
    pub database: bool,
    pub migrations_embedded: usize,
    pub migrations_applied: usize,
}

pub async fn check(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthReport>) {
    let database = state.db.health_check().await;
    let (embedded, applied, migrations_ok) = match migration_status(state.db.pool()).await {
        Ok((embedded, applied)) => (embedded, applied, embedded == applied),
        Err(e) => {
            warn!(error = %e, "Migration status unavailable");
            (0, 0, false)
        }
    };

    let healthy = database && migrations_ok;
    if !healthy {
        warn!(database, embedded, applied, "Health check failed");
    }

    let report = HealthReport {
        status: if healthy { "ok" } else { "degraded" },
        database,
        migrations_embedded: embedded,
        migrations_applied: applied,
    };

    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(report))
}
