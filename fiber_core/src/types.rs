//! Domain types shared across the routing pipeline and the dual job store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An immutable consumer coordinate from an uploaded batch. Position index within
/// the batch is authoritative, not `id`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CoordinatePoint {
    pub id: i64,
    pub lat: f64,
    pub lon: f64,
}

impl CoordinatePoint {
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lon)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Queued | Self::Processing)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChunkStatus {
    Ok,
    Failed,
}

impl ChunkStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Failed => "failed",
        }
    }
}

/// One chunk's outcome, persisted durably and appended to the cache entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkResult {
    pub chunk_index: usize,
    pub processed_points: usize,
    pub status: ChunkStatus,
    pub error_message: Option<String>,
    pub duration_ms: i64,
}

/// Durable job row shape (`batch_jobs`), without the cached results list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRow {
    pub job_id: Uuid,
    pub total_points: usize,
    pub total_chunks: usize,
    pub processed_chunks: usize,
    pub failed_chunks: usize,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
}

/// Full cache entry (C4): durable fields plus chunk results and rolling aggregates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    pub job_id: Uuid,
    pub status: JobStatus,
    pub total_points: usize,
    pub total_chunks: usize,
    pub chunk_sizes: Vec<usize>,
    pub processed_chunks: usize,
    pub failed_chunks: usize,
    pub results: Vec<ChunkResult>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub last_updated_at: DateTime<Utc>,
    pub average_chunk_duration: f64,
    pub max_chunk_duration: i64,
    pub total_processing_time: i64,
}

impl JobRecord {
    pub fn new(job_id: Uuid, total_points: usize, chunk_sizes: Vec<usize>, now: DateTime<Utc>) -> Self {
        Self {
            job_id,
            status: JobStatus::Queued,
            total_points,
            total_chunks: chunk_sizes.len(),
            chunk_sizes,
            processed_chunks: 0,
            failed_chunks: 0,
            results: Vec::new(),
            error_message: None,
            created_at: now,
            started_at: None,
            finished_at: None,
            last_updated_at: now,
            average_chunk_duration: 0.0,
            max_chunk_duration: 0,
            total_processing_time: 0,
        }
    }

    /// Approximate serialized size, used for memory-pressure eviction. A cheap
    /// per-entry accounting rather than a real `serde_json::to_vec` pass, per
    /// spec §9's allowance to substitute an order-of-magnitude-equivalent estimate.
    pub fn approx_size_bytes(&self) -> usize {
        const BASE_OVERHEAD: usize = 256;
        const PER_RESULT_OVERHEAD: usize = 96;
        BASE_OVERHEAD
            + self.chunk_sizes.len() * 8
            + self.results.len() * PER_RESULT_OVERHEAD
            + self
                .results
                .iter()
                .filter_map(|r| r.error_message.as_ref())
                .map(|s| s.len())
                .sum::<usize>()
            + self.error_message.as_ref().map(|s| s.len()).unwrap_or(0)
    }

    /// The timestamp eviction ordering compares on: finished, else last-updated,
    /// else created.
    pub fn eviction_timestamp(&self) -> DateTime<Utc> {
        self.finished_at.unwrap_or(self.last_updated_at)
    }
}

/// The nearest fiber node to a coordinate, distance measured in geodesic meters.
#[derive(Debug, Clone)]
pub struct NearestFiberNode {
    pub node_id: String,
    pub distance_m: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct LonLat {
    pub lon: f64,
    pub lat: f64,
}

/// Aggregated shortest-path result over the franchise-scoped road subgraph.
#[derive(Debug, Clone)]
pub struct ShortestPath {
    pub distance_m: f64,
    pub cost_sum: f64,
    pub edge_count: usize,
    pub geometry: serde_json::Value,
}

/// Result of routing a single consumer coordinate (C2's output).
#[derive(Debug, Clone, Serialize)]
pub struct RouteResult {
    pub franchise_id: String,
    pub fiber_node_id: String,
    pub source_road_node: i64,
    pub target_road_node: i64,
    pub distance_m: f64,
    pub estimated_cost: f64,
    pub edge_count: usize,
    pub geometry: serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct DistrictSummary {
    pub district_id: String,
    pub name: String,
    pub franchise_count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct FranchiseSummary {
    pub franchise_id: String,
    pub district_id: String,
    pub node_count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SystemSummary {
    pub district_count: i64,
    pub franchise_count: i64,
    pub fiber_node_count: i64,
    pub road_edge_count: i64,
    pub road_node_count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    pub db_ok: bool,
    pub postgis_ok: bool,
    pub pgrouting_ok: bool,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct DurableMetrics {
    pub active_jobs: i64,
    pub completed_jobs: i64,
    pub failed_jobs: i64,
    pub total_jobs: i64,
    pub average_chunk_duration_ms: f64,
    pub average_job_duration_ms: f64,
}
