//! PostGIS/pgRouting-backed implementation of `SpatialGateway` (C1).
//!
//! All queries are parameter-bound. `franchise_id` is interpolated into the
//! `pgr_dijkstra` edge-subset predicate, but only via Postgres's own `format(...,
//! %L, ...)` literal-quoting on a bound parameter that was itself read back from
//! an earlier query in this same pipeline — never directly from request input.

use async_trait::async_trait;
use sqlx::PgPool;

use fiber_core::ports::{Result, SpatialGateway};
use fiber_core::types::{LonLat, NearestFiberNode, ShortestPath};

pub struct PgSpatialGateway {
    pool: PgPool,
}

impl PgSpatialGateway {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SpatialGateway for PgSpatialGateway {
    async fn resolve_franchise(&self, lon: f64, lat: f64) -> Result<Option<String>> {
        let row: Option<(String,)> = sqlx::query_as(
            r#"
            WITH consumer AS (
                SELECT ST_SetSRID(ST_Point($1, $2), 4326) AS geom
            )
            SELECT f.franchise_id
            FROM franchise_zones f
            CROSS JOIN consumer c
            WHERE ST_Contains(f.geom, c.geom)
            ORDER BY f.franchise_id
            LIMIT 1
            "#,
        )
        .bind(lon)
        .bind(lat)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|(id,)| id))
    }

    async fn nearest_fiber_node(
        &self,
        franchise_id: &str,
        lon: f64,
        lat: f64,
    ) -> Result<Option<NearestFiberNode>> {
        let row: Option<(String, f64)> = sqlx::query_as(
            r#"
            WITH consumer AS (
                SELECT ST_SetSRID(ST_Point($1, $2), 4326) AS geom
            )
            SELECT fn.node_id, ST_Distance(fn.geom::geography, c.geom::geography)
            FROM fiber_nodes fn
            CROSS JOIN consumer c
            WHERE fn.franchise_id = $3
            ORDER BY fn.geom <-> c.geom
            LIMIT 1
            "#,
        )
        .bind(lon)
        .bind(lat)
        .bind(franchise_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|(node_id, distance_m)| NearestFiberNode { node_id, distance_m }))
    }

    async fn nearest_road_node(
        &self,
        franchise_id: &str,
        lon: f64,
        lat: f64,
    ) -> Result<Option<i64>> {
        let row: Option<(i64,)> = sqlx::query_as(
            r#"
            WITH p AS (
                SELECT ST_SetSRID(ST_Point($1, $2), 4326) AS geom
            )
            SELECT rn.node_id
            FROM road_nodes rn
            CROSS JOIN p
            WHERE rn.franchise_id = $3
            ORDER BY rn.geom <-> p.geom
            LIMIT 1
            "#,
        )
        .bind(lon)
        .bind(lat)
        .bind(franchise_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|(id,)| id))
    }

    async fn fiber_node_coords(&self, node_id: &str) -> Result<Option<LonLat>> {
        let row: Option<(f64, f64)> = sqlx::query_as(
            r#"
            SELECT ST_X(geom), ST_Y(geom)
            FROM fiber_nodes
            WHERE node_id = $1
            LIMIT 1
            "#,
        )
        .bind(node_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|(lon, lat)| LonLat { lon, lat }))
    }

    async fn road_node_coords(&self, franchise_id: &str, node_id: i64) -> Result<Option<LonLat>> {
        let row: Option<(f64, f64)> = sqlx::query_as(
            r#"
            SELECT ST_X(geom), ST_Y(geom)
            FROM road_nodes
            WHERE franchise_id = $1 AND node_id = $2
            LIMIT 1
            "#,
        )
        .bind(franchise_id)
        .bind(node_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|(lon, lat)| LonLat { lon, lat }))
    }

    async fn shortest_path(
        &self,
        franchise_id: &str,
        source_rn: i64,
        target_rn: i64,
    ) -> Result<Option<ShortestPath>> {
        let row: Option<(f64, f64, i64, Option<String>)> = sqlx::query_as(
            r#"
            WITH route AS (
                SELECT *
                FROM pgr_dijkstra(
                    format(
                        'SELECT edge_id AS id, source, target, cost FROM road_edges WHERE franchise_id = %L',
                        $1::text
                    ),
                    $2, $3,
                    directed := false
                )
            )
            SELECT
                COALESCE(SUM(e.length_m), 0) AS distance_m,
                COALESCE(SUM(e.cost), 0) AS cost_sum,
                COUNT(*)::bigint AS edge_count,
                ST_AsGeoJSON(ST_LineMerge(ST_Collect(e.geom))) AS geometry
            FROM route r
            JOIN road_edges e ON e.edge_id = r.edge
            WHERE r.edge <> -1
            "#,
        )
        .bind(franchise_id)
        .bind(source_rn)
        .bind(target_rn)
        .fetch_optional(&self.pool)
        .await?;

        let Some((distance_m, cost_sum, edge_count, geometry_json)) = row else {
            return Ok(None);
        };
        if edge_count == 0 {
            return Ok(None);
        }
        let Some(geometry_json) = geometry_json else {
            return Ok(None);
        };
        let geometry = serde_json::from_str(&geometry_json)?;

        Ok(Some(ShortestPath {
            distance_m,
            cost_sum,
            edge_count: edge_count as usize,
            geometry,
        }))
    }
}
