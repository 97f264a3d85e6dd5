//! C6 — batch admission, the background job driver, and the read paths over
//! both halves of the dual job store. Mirrors `app/routers/upload_batch.py`'s
//! `upload_batch`/`_process`/`job_status`/`job_result`/`jobs_metrics`.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use uuid::Uuid;

use fiber_core::chunking::{chunk_slices, compute_chunk_sizes, hydrate_chunk_sizes};
use fiber_core::types::{ChunkResult, ChunkStatus, CoordinatePoint, DurableMetrics, JobStatus};

use crate::error::AppError;
use crate::state::AppContext;

pub struct Orchestrator {
    ctx: AppContext,
}

/// What `upload_batch` hands back for a newly admitted job.
pub struct AdmittedJob {
    pub job_id: Uuid,
    pub total_points: usize,
    pub total_chunks: usize,
    pub chunk_sizes: Vec<usize>,
}

/// The merged view `job_result` returns: durable fields plus the cached
/// per-chunk results (re-hydrated from the durable store on a cache miss).
pub struct JobView {
    pub job_id: Uuid,
    pub status: JobStatus,
    pub total_points: usize,
    pub total_chunks: usize,
    pub chunk_sizes: Vec<usize>,
    pub processed_chunks: usize,
    pub failed_chunks: usize,
    pub results: Vec<ChunkResult>,
    pub error_message: Option<String>,
    pub started_at: Option<chrono::DateTime<Utc>>,
    pub finished_at: Option<chrono::DateTime<Utc>>,
}

impl Orchestrator {
    pub fn new(ctx: AppContext) -> Self {
        Self { ctx }
    }

    pub async fn upload_batch(&self, coordinates: Vec<CoordinatePoint>) -> Result<AdmittedJob, AppError> {
        if coordinates.len() > self.ctx.settings.secure_max_points {
            return Err(AppError::BatchTooLarge);
        }
        if coordinates.is_empty() {
            return Err(AppError::ValidationError("batch must contain at least one point".to_string()));
        }
        for point in &coordinates {
            if !point.is_valid() {
                return Err(AppError::ValidationError(format!(
                    "point {} has out-of-range coordinates",
                    point.id
                )));
            }
        }

        let chunk_sizes = compute_chunk_sizes(coordinates.len(), self.ctx.settings.batch_chunk_size);
        self.ctx.cache.cleanup_finished();

        let record = self
            .ctx
            .cache
            .create_job_if_capacity(coordinates.len(), chunk_sizes.clone(), self.ctx.settings.max_active_jobs)
            .ok_or(AppError::ServerBusy)?;

        if let Err(e) = self
            .ctx
            .durable
            .create_job(record.job_id, record.total_points, record.total_chunks)
            .await
        {
            self.ctx.cache.pop_job(record.job_id);
            return Err(AppError::PersistenceError(e.to_string()));
        }

        let driver_ctx = self.ctx.clone();
        let job_id = record.job_id;
        let submission = self.ctx.executor.submit_job(async move {
            run_driver(driver_ctx, job_id, coordinates).await;
        });

        if submission.is_err() {
            self.ctx.cache.pop_job(job_id);
            let _ = self
                .ctx
                .durable
                .update_job_status(
                    job_id,
                    JobStatus::Failed,
                    false,
                    true,
                    Some("Job executor rejected submission."),
                )
                .await;
            return Err(AppError::ExecutorUnavailable);
        }

        Ok(AdmittedJob {
            job_id: record.job_id,
            total_points: record.total_points,
            total_chunks: record.total_chunks,
            chunk_sizes: record.chunk_sizes,
        })
    }

    pub async fn job_status(&self, job_id: Uuid) -> Result<JobView, AppError> {
        self.ctx.cache.cleanup_finished();
        self.hydrate(job_id).await?.ok_or(AppError::JobNotFound)
    }

    /// Returns the full result and, unlike `job_status`, pops the cache entry —
    /// the durable row remains for any later hydration.
    pub async fn job_result(&self, job_id: Uuid) -> Result<JobView, AppError> {
        self.ctx.cache.cleanup_finished();
        let view = self.hydrate(job_id).await?.ok_or(AppError::JobNotFound)?;
        if view.status.is_active() {
            return Err(AppError::JobNotReady);
        }
        self.ctx.cache.pop_job(job_id);
        Ok(view)
    }

    pub async fn jobs_metrics(&self) -> Result<JobMetrics, AppError> {
        let durable = self.ctx.durable.metrics().await?;
        Ok(JobMetrics {
            durable,
            max_active_jobs: self.ctx.settings.max_active_jobs,
            executor_max_workers: self.ctx.settings.executor_max_workers,
        })
    }

    pub async fn compute_route(&self, lat: f64, lon: f64) -> Result<fiber_core::types::RouteResult, AppError> {
        fiber_core::routing::route_point(
            self.ctx.spatial.as_ref(),
            lon,
            lat,
            self.ctx.settings.default_cost_per_meter,
        )
        .await
        .map_err(AppError::from)
    }

    /// Cache-then-hydrate read: a cache hit returns directly; a miss rebuilds a
    /// `JobView` from the durable row plus its persisted chunk results.
    async fn hydrate(&self, job_id: Uuid) -> Result<Option<JobView>, AppError> {
        if let Some(record) = self.ctx.cache.get_job(job_id) {
            return Ok(Some(JobView {
                job_id: record.job_id,
                status: record.status,
                total_points: record.total_points,
                total_chunks: record.total_chunks,
                chunk_sizes: record.chunk_sizes,
                processed_chunks: record.processed_chunks,
                failed_chunks: record.failed_chunks,
                results: record.results,
                error_message: record.error_message,
                started_at: record.started_at,
                finished_at: record.finished_at,
            }));
        }

        let Some(row) = self.ctx.durable.get_job(job_id).await? else {
            return Ok(None);
        };
        let results = self.ctx.durable.get_chunk_results(job_id).await?;
        let chunk_sizes = hydrate_chunk_sizes(row.total_points, row.total_chunks, self.ctx.settings.batch_chunk_size);

        Ok(Some(JobView {
            job_id: row.job_id,
            status: row.status,
            total_points: row.total_points,
            total_chunks: row.total_chunks,
            chunk_sizes,
            processed_chunks: row.processed_chunks,
            failed_chunks: row.failed_chunks,
            results,
            error_message: row.error_message,
            started_at: row.started_at,
            finished_at: row.finished_at,
        }))
    }
}

pub struct JobMetrics {
    pub durable: DurableMetrics,
    pub max_active_jobs: usize,
    pub executor_max_workers: usize,
}

/// The background driver (`_process`): runs outside any HTTP request scope,
/// spawned once per admitted job onto the job pool.
async fn run_driver(ctx: AppContext, job_id: Uuid, coordinates: Vec<CoordinatePoint>) {
    if let Err(e) = drive(&ctx, job_id, &coordinates).await {
        tracing::error!(%job_id, error = %e, "job driver failed");
        let _ = ctx
            .durable
            .update_job_status(
                job_id,
                JobStatus::Failed,
                false,
                true,
                Some(&format!("Background processing failed: {e}")),
            )
            .await;
        ctx.cache.update_job(job_id, |job| {
            job.status = JobStatus::Failed;
            job.finished_at = Some(Utc::now());
            job.error_message = Some(format!("Background processing failed: {e}"));
        });
    }
}

async fn drive(ctx: &AppContext, job_id: Uuid, coordinates: &[CoordinatePoint]) -> anyhow::Result<()> {
    ctx.durable
        .update_job_status(job_id, JobStatus::Processing, true, false, None)
        .await?;
    ctx.cache.update_job(job_id, |job| {
        job.status = JobStatus::Processing;
        job.started_at = Some(Utc::now());
    });

    let chunks = chunk_slices(coordinates, ctx.settings.batch_chunk_size);
    let mut had_failures = false;

    for (chunk_index, chunk) in chunks.into_iter().enumerate() {
        let started = Instant::now();
        let outcome = ctx.executor.run_chunk(ctx.processor.process(chunk, chunk_index)).await;
        let duration_ms = started.elapsed().as_millis() as i64;

        let result = match outcome {
            Ok(Ok(outcome)) => ChunkResult {
                chunk_index,
                processed_points: outcome.processed_points.unwrap_or(chunk.len()),
                status: outcome.status.unwrap_or(ChunkStatus::Ok),
                error_message: outcome.error_message,
                duration_ms,
            },
            Ok(Err(e)) => ChunkResult {
                chunk_index,
                processed_points: chunk.len(),
                status: ChunkStatus::Failed,
                error_message: Some(e.to_string()),
                duration_ms,
            },
            Err(_timed_out) => ChunkResult {
                chunk_index,
                processed_points: chunk.len(),
                status: ChunkStatus::Failed,
                error_message: Some(format!(
                    "Chunk timeout after {} seconds.",
                    ctx.executor.chunk_timeout().as_secs()
                )),
                duration_ms,
            },
        };

        if matches!(result.status, ChunkStatus::Failed) {
            had_failures = true;
        }

        ctx.durable.persist_chunk_result(job_id, &result).await?;
        ctx.cache.append_result(job_id, result);
    }

    let terminal_status = if had_failures { JobStatus::Failed } else { JobStatus::Completed };
    let error_message = had_failures.then(|| "One or more chunks failed.".to_string());

    ctx.durable
        .update_job_status(job_id, terminal_status, false, true, error_message.as_deref())
        .await?;
    ctx.cache.update_job(job_id, |job| {
        job.status = terminal_status;
        job.finished_at = Some(Utc::now());
        job.error_message = error_message;
    });
    ctx.cache.enforce_memory_limit();

    Ok(())
}
