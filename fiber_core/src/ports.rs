//! Storage/gateway port traits — implemented by `fiber_postgres`. Core logic
//! (routing, orchestration) depends only on these traits, never on sqlx directly.

use async_trait::async_trait;
use uuid::Uuid;

use crate::types::{
    ChunkResult, DistrictSummary, DurableMetrics, FranchiseSummary, HealthStatus, JobRow,
    JobStatus, LonLat, NearestFiberNode, ShortestPath, SystemSummary,
};

pub type Result<T> = std::result::Result<T, anyhow::Error>;

/// C1 — thin typed adapter over the spatial store.
#[async_trait]
pub trait SpatialGateway: Send + Sync {
    async fn resolve_franchise(&self, lon: f64, lat: f64) -> Result<Option<String>>;

    async fn nearest_fiber_node(
        &self,
        franchise_id: &str,
        lon: f64,
        lat: f64,
    ) -> Result<Option<NearestFiberNode>>;

    async fn nearest_road_node(
        &self,
        franchise_id: &str,
        lon: f64,
        lat: f64,
    ) -> Result<Option<i64>>;

    async fn fiber_node_coords(&self, node_id: &str) -> Result<Option<LonLat>>;

    async fn road_node_coords(&self, franchise_id: &str, node_id: i64) -> Result<Option<LonLat>>;

    async fn shortest_path(
        &self,
        franchise_id: &str,
        source_rn: i64,
        target_rn: i64,
    ) -> Result<Option<ShortestPath>>;
}

/// Read-only catalog aggregates over the spatial store (C11, external per spec §1
/// but specified here since the distillation dropped its shape).
#[async_trait]
pub trait CatalogGateway: Send + Sync {
    async fn health(&self) -> Result<HealthStatus>;
    async fn system_summary(&self) -> Result<SystemSummary>;
    async fn list_districts(&self) -> Result<Vec<DistrictSummary>>;
    async fn list_franchises(&self, district_id: Option<&str>) -> Result<Vec<FranchiseSummary>>;
}

/// C4's durable layer — `batch_jobs` + `batch_chunk_results`. Each operation runs
/// in its own short transaction; no operation here spans chunk execution.
#[async_trait]
pub trait JobDurableStore: Send + Sync {
    async fn ensure_schema(&self) -> Result<()>;

    async fn create_job(&self, job_id: Uuid, total_points: usize, total_chunks: usize) -> Result<()>;

    async fn update_job_status(
        &self,
        job_id: Uuid,
        status: JobStatus,
        set_started_now: bool,
        set_finished_now: bool,
        error_message: Option<&str>,
    ) -> Result<()>;

    /// Inserts the chunk result row and atomically increments `processed_chunks`
    /// (and `failed_chunks` iff `status == Failed`) on the parent job row.
    async fn persist_chunk_result(&self, job_id: Uuid, result: &ChunkResult) -> Result<()>;

    async fn get_job(&self, job_id: Uuid) -> Result<Option<JobRow>>;

    async fn get_chunk_results(&self, job_id: Uuid) -> Result<Vec<ChunkResult>>;

    async fn active_job_count(&self) -> Result<i64>;

    /// Startup recovery: marks every `queued`/`processing` job `failed`. Returns
    /// the number of rows updated.
    async fn mark_incomplete_jobs_failed(&self) -> Result<u64>;

    async fn metrics(&self) -> Result<DurableMetrics>;
}
