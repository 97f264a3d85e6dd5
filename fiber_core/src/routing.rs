//! C2 — single-point router. Pure pipeline over a `SpatialGateway`: resolve
//! franchise, pick nearest fiber node, snap both endpoints onto the franchise's
//! road graph, shortest-path between them.

use serde_json::json;

use crate::error::RouteError;
use crate::ports::SpatialGateway;
use crate::types::RouteResult;

/// Runs the C2 algorithm (spec §4.2) for one coordinate.
pub async fn route_point(
    gateway: &dyn SpatialGateway,
    lon: f64,
    lat: f64,
    default_cost_per_meter: f64,
) -> Result<RouteResult, RouteError> {
    let franchise_id = gateway
        .resolve_franchise(lon, lat)
        .await?
        .ok_or(RouteError::OutsideFranchise)?;

    let nearest_fiber = gateway
        .nearest_fiber_node(&franchise_id, lon, lat)
        .await?
        .ok_or(RouteError::NoFiberNode)?;

    let fiber_coords = gateway
        .fiber_node_coords(&nearest_fiber.node_id)
        .await?
        .ok_or(RouteError::FiberNodeGeometryMissing)?;

    let source_rn = gateway
        .nearest_road_node(&franchise_id, lon, lat)
        .await?
        .ok_or(RouteError::RoadSnapFailed)?;
    let target_rn = gateway
        .nearest_road_node(&franchise_id, fiber_coords.lon, fiber_coords.lat)
        .await?
        .ok_or(RouteError::RoadSnapFailed)?;

    if source_rn == target_rn {
        let node_coords = gateway
            .road_node_coords(&franchise_id, source_rn)
            .await?
            .ok_or(RouteError::RoadSnapFailed)?;
        let line = json!({
            "type": "LineString",
            "coordinates": [
                [node_coords.lon, node_coords.lat],
                [node_coords.lon, node_coords.lat],
            ],
        });
        return Ok(RouteResult {
            franchise_id,
            fiber_node_id: nearest_fiber.node_id,
            source_road_node: source_rn,
            target_road_node: target_rn,
            distance_m: 0.0,
            estimated_cost: 0.0,
            edge_count: 0,
            geometry: line,
        });
    }

    let path = gateway
        .shortest_path(&franchise_id, source_rn, target_rn)
        .await?
        .ok_or(RouteError::RouteNotFound)?;

    let estimated_cost = if path.cost_sum != 0.0 {
        path.cost_sum
    } else {
        path.distance_m * default_cost_per_meter
    };

    Ok(RouteResult {
        franchise_id,
        fiber_node_id: nearest_fiber.node_id,
        source_road_node: source_rn,
        target_road_node: target_rn,
        distance_m: path.distance_m,
        estimated_cost,
        edge_count: path.edge_count,
        geometry: path.geometry,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{LonLat, NearestFiberNode, ShortestPath};
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeGateway {
        franchise: Option<String>,
        fiber_node: Option<NearestFiberNode>,
        fiber_coords: Option<LonLat>,
        road_nodes: Mutex<Vec<Option<i64>>>,
        road_coords: Option<LonLat>,
        path: Option<ShortestPath>,
    }

    #[async_trait]
    impl SpatialGateway for FakeGateway {
        async fn resolve_franchise(&self, _lon: f64, _lat: f64) -> crate::ports::Result<Option<String>> {
            Ok(self.franchise.clone())
        }

        async fn nearest_fiber_node(
            &self,
            _franchise_id: &str,
            _lon: f64,
            _lat: f64,
        ) -> crate::ports::Result<Option<NearestFiberNode>> {
            Ok(self.fiber_node.as_ref().map(|n| NearestFiberNode {
                node_id: n.node_id.clone(),
                distance_m: n.distance_m,
            }))
        }

        async fn nearest_road_node(
            &self,
            _franchise_id: &str,
            _lon: f64,
            _lat: f64,
        ) -> crate::ports::Result<Option<i64>> {
            let mut queue = self.road_nodes.lock().unwrap();
            Ok(queue.pop().unwrap_or(None))
        }

        async fn fiber_node_coords(&self, _node_id: &str) -> crate::ports::Result<Option<LonLat>> {
            Ok(self.fiber_coords)
        }

        async fn road_node_coords(
            &self,
            _franchise_id: &str,
            _node_id: i64,
        ) -> crate::ports::Result<Option<LonLat>> {
            Ok(self.road_coords)
        }

        async fn shortest_path(
            &self,
            _franchise_id: &str,
            _source_rn: i64,
            _target_rn: i64,
        ) -> crate::ports::Result<Option<ShortestPath>> {
            Ok(self.path.as_ref().map(|p| ShortestPath {
                distance_m: p.distance_m,
                cost_sum: p.cost_sum,
                edge_count: p.edge_count,
                geometry: p.geometry.clone(),
            }))
        }
    }

    #[tokio::test]
    async fn outside_all_franchises_is_a_user_error() {
        let gw = FakeGateway::default();
        let err = route_point(&gw, 10.0, 10.0, 700.0).await.unwrap_err();
        assert_eq!(err.code(), "outside_franchise");
        assert!(err.is_user_error());
    }

    #[tokio::test]
    async fn degenerate_same_node_route_is_zero_length() {
        let gw = FakeGateway {
            franchise: Some("f1".into()),
            fiber_node: Some(NearestFiberNode {
                node_id: "fn1".into(),
                distance_m: 12.0,
            }),
            fiber_coords: Some(LonLat { lon: 1.0, lat: 1.0 }),
            road_nodes: Mutex::new(vec![Some(42), Some(42)]),
            road_coords: Some(LonLat { lon: 1.0, lat: 1.0 }),
            path: None,
        };
        let result = route_point(&gw, 1.0, 1.0, 700.0).await.unwrap();
        assert_eq!(result.distance_m, 0.0);
        assert_eq!(result.edge_count, 0);
        assert_eq!(result.estimated_cost, 0.0);
        assert_eq!(result.source_road_node, 42);
        assert_eq!(result.target_road_node, 42);
    }

    #[tokio::test]
    async fn no_path_between_distinct_nodes_is_route_not_found() {
        let gw = FakeGateway {
            franchise: Some("f1".into()),
            fiber_node: Some(NearestFiberNode {
                node_id: "fn1".into(),
                distance_m: 12.0,
            }),
            fiber_coords: Some(LonLat { lon: 1.0, lat: 1.0 }),
            road_nodes: Mutex::new(vec![Some(2), Some(1)]),
            road_coords: Some(LonLat { lon: 1.0, lat: 1.0 }),
            path: None,
        };
        let err = route_point(&gw, 1.0, 1.0, 700.0).await.unwrap_err();
        assert_eq!(err.code(), "route_not_found");
    }

    #[tokio::test]
    async fn zero_cost_sum_falls_back_to_distance_times_default_cost() {
        let gw = FakeGateway {
            franchise: Some("f1".into()),
            fiber_node: Some(NearestFiberNode {
                node_id: "fn1".into(),
                distance_m: 12.0,
            }),
            fiber_coords: Some(LonLat { lon: 1.0, lat: 1.0 }),
            road_nodes: Mutex::new(vec![Some(2), Some(1)]),
            road_coords: Some(LonLat { lon: 1.0, lat: 1.0 }),
            path: Some(ShortestPath {
                distance_m: 100.0,
                cost_sum: 0.0,
                edge_count: 3,
                geometry: json!({"type": "LineString", "coordinates": []}),
            }),
        };
        let result = route_point(&gw, 1.0, 1.0, 700.0).await.unwrap();
        assert_eq!(result.estimated_cost, 100.0 * 700.0);
        assert_eq!(result.edge_count, 3);
    }
}
