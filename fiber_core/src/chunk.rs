//! C3 — chunk processor. A replaceable, pure (w.r.t. the job store) function that
//! consumes a chunk of points and returns a per-chunk summary. The orchestrator
//! treats it as opaque: it fills in any defaults the processor leaves unset and
//! synthesizes a failed result if the processor errors.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::ports::SpatialGateway;
use crate::routing::route_point;
use crate::types::{ChunkStatus, CoordinatePoint};

/// What a processor reports back for one chunk. Fields left `None` are filled by
/// the caller (chunk length for `processed_points`, observed wall time for
/// `duration_ms`), mirroring `result.setdefault(...)` in the original service.
#[derive(Debug, Clone, Default)]
pub struct ChunkOutcome {
    pub processed_points: Option<usize>,
    pub status: Option<ChunkStatus>,
    pub error_message: Option<String>,
}

#[async_trait]
pub trait ChunkProcessor: Send + Sync {
    async fn process(&self, chunk: &[CoordinatePoint], chunk_index: usize) -> anyhow::Result<ChunkOutcome>;
}

/// Default processor: no routing dependency, just a configurable delay so the
/// batch pipeline is exercisable without a spatial store. Mirrors
/// `mock_chunk_processor` in the original service.
pub struct MockChunkProcessor {
    pub delay: Duration,
}

impl MockChunkProcessor {
    pub fn new(delay_seconds: f64) -> Self {
        Self {
            delay: Duration::from_secs_f64(delay_seconds.max(0.0)),
        }
    }
}

#[async_trait]
impl ChunkProcessor for MockChunkProcessor {
    async fn process(&self, chunk: &[CoordinatePoint], _chunk_index: usize) -> anyhow::Result<ChunkOutcome> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(ChunkOutcome {
            processed_points: Some(chunk.len()),
            status: Some(ChunkStatus::Ok),
            error_message: None,
        })
    }
}

/// Production processor: routes every point in the chunk via C2 and aggregates.
/// The chunk is reported `failed` if any point fails to route; the first
/// failure's message is carried as the chunk's `error_message`.
pub struct RoutingChunkProcessor {
    pub gateway: Arc<dyn SpatialGateway>,
    pub default_cost_per_meter: f64,
}

#[async_trait]
impl ChunkProcessor for RoutingChunkProcessor {
    async fn process(&self, chunk: &[CoordinatePoint], _chunk_index: usize) -> anyhow::Result<ChunkOutcome> {
        let mut first_error: Option<String> = None;
        for point in chunk {
            if !point.is_valid() {
                first_error.get_or_insert_with(|| {
                    format!("point {} has out-of-range coordinates", point.id)
                });
                continue;
            }
            if let Err(e) = route_point(
                self.gateway.as_ref(),
                point.lon,
                point.lat,
                self.default_cost_per_meter,
            )
            .await
            {
                first_error.get_or_insert_with(|| format!("point {}: {}", point.id, e));
            }
        }

        Ok(ChunkOutcome {
            processed_points: Some(chunk.len()),
            status: Some(if first_error.is_some() {
                ChunkStatus::Failed
            } else {
                ChunkStatus::Ok
            }),
            error_message: first_error,
        })
    }
}
