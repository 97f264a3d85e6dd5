//! `GET /health` — liveness plus a live check of the spatial extensions.

use axum::{Extension, Json};
use serde::Serialize;

use crate::error::AppError;
use crate::state::AppContext;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub db_ok: bool,
    pub postgis_ok: bool,
    pub pgrouting_ok: bool,
}

pub async fn health(Extension(ctx): Extension<AppContext>) -> Result<Json<HealthResponse>, AppError> {
    let status = ctx
        .catalog
        .health()
        .await
        .map_err(|e| AppError::HealthCheckFailed(e.to_string()))?;

    Ok(Json(HealthResponse {
        status: "ok",
        db_ok: status.db_ok,
        postgis_ok: status.postgis_ok,
        pgrouting_ok: status.pgrouting_ok,
    }))
}
