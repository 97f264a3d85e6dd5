//! Read-only aggregates over the spatial catalog (C11).
//!
//! GET /catalog/summary
//! GET /catalog/districts
//! GET /catalog/franchises?district_id=

use axum::extract::Query;
use axum::{Extension, Json};
use serde::Deserialize;

use fiber_core::types::{DistrictSummary, FranchiseSummary, SystemSummary};

use crate::error::AppError;
use crate::state::AppContext;

pub async fn summary(Extension(ctx): Extension<AppContext>) -> Result<Json<SystemSummary>, AppError> {
    Ok(Json(ctx.catalog.system_summary().await?))
}

pub async fn districts(Extension(ctx): Extension<AppContext>) -> Result<Json<Vec<DistrictSummary>>, AppError> {
    Ok(Json(ctx.catalog.list_districts().await?))
}

#[derive(Deserialize)]
pub struct FranchiseQuery {
    pub district_id: Option<String>,
}

pub async fn franchises(
    Extension(ctx): Extension<AppContext>,
    Query(query): Query<FranchiseQuery>,
) -> Result<Json<Vec<FranchiseSummary>>, AppError> {
    Ok(Json(ctx.catalog.list_franchises(query.district_id.as_deref()).await?))
}
