//! Batch upload admission and the job read paths (C6).
//!
//! POST /upload-batch
//! GET  /job-status/{job_id}
//! GET  /job-result/{job_id}
//! GET  /jobs/metrics

use axum::extract::Path;
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use fiber_core::types::{ChunkResult, CoordinatePoint, JobStatus};

use crate::error::AppError;
use crate::extract::AppJson;
use crate::orchestrator::{JobView, Orchestrator};
use crate::state::AppContext;

#[derive(Deserialize)]
pub struct BatchUploadRequest {
    pub coordinates: Vec<CoordinatePoint>,
}

#[derive(Serialize)]
pub struct BatchUploadAccepted {
    pub job_id: Uuid,
    pub status: JobStatus,
    pub total_points: usize,
    pub total_chunks: usize,
    pub chunk_sizes: Vec<usize>,
}

pub async fn upload_batch(
    Extension(ctx): Extension<AppContext>,
    AppJson(request): AppJson<BatchUploadRequest>,
) -> Result<(StatusCode, Json<BatchUploadAccepted>), AppError> {
    let admitted = Orchestrator::new(ctx).upload_batch(request.coordinates).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(BatchUploadAccepted {
            job_id: admitted.job_id,
            status: JobStatus::Queued,
            total_points: admitted.total_points,
            total_chunks: admitted.total_chunks,
            chunk_sizes: admitted.chunk_sizes,
        }),
    ))
}

#[derive(Serialize)]
pub struct JobStatusResponse {
    pub job_id: Uuid,
    pub status: JobStatus,
    pub total_points: usize,
    pub total_chunks: usize,
    pub processed_chunks: usize,
    pub failed_chunks: usize,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
}

impl From<JobView> for JobStatusResponse {
    fn from(view: JobView) -> Self {
        Self {
            job_id: view.job_id,
            status: view.status,
            total_points: view.total_points,
            total_chunks: view.total_chunks,
            processed_chunks: view.processed_chunks,
            failed_chunks: view.failed_chunks,
            started_at: view.started_at,
            finished_at: view.finished_at,
            error_message: view.error_message,
        }
    }
}

pub async fn job_status(
    Extension(ctx): Extension<AppContext>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<JobStatusResponse>, AppError> {
    let view = Orchestrator::new(ctx).job_status(job_id).await?;
    Ok(Json(view.into()))
}

#[derive(Serialize)]
pub struct JobResultResponse {
    pub job_id: Uuid,
    pub status: JobStatus,
    pub total_points: usize,
    pub total_chunks: usize,
    pub chunk_sizes: Vec<usize>,
    pub processed_chunks: usize,
    pub failed_chunks: usize,
    pub results: Vec<ChunkResult>,
    pub error_message: Option<String>,
}

impl From<JobView> for JobResultResponse {
    fn from(view: JobView) -> Self {
        Self {
            job_id: view.job_id,
            status: view.status,
            total_points: view.total_points,
            total_chunks: view.total_chunks,
            chunk_sizes: view.chunk_sizes,
            processed_chunks: view.processed_chunks,
            failed_chunks: view.failed_chunks,
            results: view.results,
            error_message: view.error_message,
        }
    }
}

pub async fn job_result(
    Extension(ctx): Extension<AppContext>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<JobResultResponse>, AppError> {
    let view = Orchestrator::new(ctx).job_result(job_id).await?;
    Ok(Json(view.into()))
}

#[derive(Serialize)]
pub struct JobMetricsResponse {
    pub active_jobs: i64,
    pub completed_jobs: i64,
    pub failed_jobs: i64,
    pub total_jobs: i64,
    pub max_active_jobs: usize,
    pub executor_max_workers: usize,
    pub average_chunk_duration_ms: f64,
    pub average_job_duration_ms: f64,
}

pub async fn jobs_metrics(Extension(ctx): Extension<AppContext>) -> Result<Json<JobMetricsResponse>, AppError> {
    let metrics = Orchestrator::new(ctx).jobs_metrics().await?;
    Ok(Json(JobMetricsResponse {
        active_jobs: metrics.durable.active_jobs,
        completed_jobs: metrics.durable.completed_jobs,
        failed_jobs: metrics.durable.failed_jobs,
        total_jobs: metrics.durable.total_jobs,
        max_active_jobs: metrics.max_active_jobs,
        executor_max_workers: metrics.executor_max_workers,
        average_chunk_duration_ms: metrics.durable.average_chunk_duration_ms,
        average_job_duration_ms: metrics.durable.average_job_duration_ms,
    }))
}
