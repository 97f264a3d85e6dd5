//! `POST /routing/compute` — single-point routing (C2).

use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::extract::AppJson;
use crate::orchestrator::Orchestrator;
use crate::state::AppContext;

#[derive(Deserialize)]
pub struct ConsumerRouteRequest {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Serialize)]
pub struct ConsumerRouteResponse {
    pub franchise_id: String,
    pub fiber_node_id: String,
    pub source_road_node_id: i64,
    pub target_road_node_id: i64,
    pub distance_meters: f64,
    pub estimated_cost: f64,
    pub edge_count: usize,
    pub route_geojson: serde_json::Value,
}

pub async fn compute(
    Extension(ctx): Extension<AppContext>,
    AppJson(request): AppJson<ConsumerRouteRequest>,
) -> Result<Json<ConsumerRouteResponse>, AppError> {
    if !(-90.0..=90.0).contains(&request.latitude) || !(-180.0..=180.0).contains(&request.longitude) {
        return Err(AppError::ValidationError(
            "latitude/longitude out of range".to_string(),
        ));
    }

    let result = Orchestrator::new(ctx).compute_route(request.latitude, request.longitude).await?;

    Ok(Json(ConsumerRouteResponse {
        franchise_id: result.franchise_id,
        fiber_node_id: result.fiber_node_id,
        source_road_node_id: result.source_road_node,
        target_road_node_id: result.target_road_node,
        distance_meters: result.distance_m,
        estimated_cost: result.estimated_cost,
        edge_count: result.edge_count,
        route_geojson: result.geometry,
    }))
}
