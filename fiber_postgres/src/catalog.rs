//! Read-only aggregates over the spatial catalog (C11). All queries are plain
//! `COUNT`/`GROUP BY` over ingest-owned tables — nothing here writes.

use async_trait::async_trait;
use sqlx::PgPool;

use fiber_core::ports::{CatalogGateway, Result};
use fiber_core::types::{DistrictSummary, FranchiseSummary, HealthStatus, SystemSummary};

pub struct PgCatalogGateway {
    pool: PgPool,
}

impl PgCatalogGateway {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogGateway for PgCatalogGateway {
    async fn health(&self) -> Result<HealthStatus> {
        let db_ok = sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .is_ok();

        let postgis_ok = sqlx::query_scalar::<_, String>("SELECT PostGIS_Version()")
            .fetch_one(&self.pool)
            .await
            .is_ok();

        let pgrouting_ok = sqlx::query_scalar::<_, String>("SELECT pgr_version()")
            .fetch_one(&self.pool)
            .await
            .is_ok();

        Ok(HealthStatus {
            db_ok,
            postgis_ok,
            pgrouting_ok,
        })
    }

    async fn system_summary(&self) -> Result<SystemSummary> {
        let (district_count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM districts")
            .fetch_one(&self.pool)
            .await?;
        let (franchise_count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM franchise_zones")
            .fetch_one(&self.pool)
            .await?;
        let (fiber_node_count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM fiber_nodes")
            .fetch_one(&self.pool)
            .await?;
        let (road_edge_count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM road_edges")
            .fetch_one(&self.pool)
            .await?;
        let (road_node_count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM road_nodes")
            .fetch_one(&self.pool)
            .await?;

        Ok(SystemSummary {
            district_count,
            franchise_count,
            fiber_node_count,
            road_edge_count,
            road_node_count,
        })
    }

    async fn list_districts(&self) -> Result<Vec<DistrictSummary>> {
        let rows: Vec<(String, String, i64)> = sqlx::query_as(
            r#"
            SELECT d.district_id, d.name, COUNT(f.franchise_id)
            FROM districts d
            LEFT JOIN franchise_zones f ON f.district_id = d.district_id
            GROUP BY d.district_id, d.name
            ORDER BY d.district_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(district_id, name, franchise_count)| DistrictSummary {
                district_id,
                name,
                franchise_count,
            })
            .collect())
    }

    async fn list_franchises(&self, district_id: Option<&str>) -> Result<Vec<FranchiseSummary>> {
        let rows: Vec<(String, String, i64)> = match district_id {
            Some(district_id) => {
                sqlx::query_as(
                    r#"
                    SELECT f.franchise_id, f.district_id, COUNT(fn.node_id)
                    FROM franchise_zones f
                    LEFT JOIN fiber_nodes fn ON fn.franchise_id = f.franchise_id
                    WHERE f.district_id = $1
                    GROUP BY f.franchise_id, f.district_id
                    ORDER BY f.franchise_id
                    "#,
                )
                .bind(district_id)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as(
                    r#"
                    SELECT f.franchise_id, f.district_id, COUNT(fn.node_id)
                    FROM franchise_zones f
                    LEFT JOIN fiber_nodes fn ON fn.franchise_id = f.franchise_id
                    GROUP BY f.franchise_id, f.district_id
                    ORDER BY f.franchise_id
                    "#,
                )
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(rows
            .into_iter()
            .map(|(franchise_id, district_id, node_count)| FranchiseSummary {
                franchise_id,
                district_id,
                node_count,
            })
            .collect())
    }
}
