//! PostgreSQL implementation of the durable half of C4 (`batch_jobs` +
//! `batch_chunk_results`). Mirrors `app/job_repository.py`: every public method
//! opens and commits its own short transaction, never spanning chunk execution.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use fiber_core::ports::{JobDurableStore, Result};
use fiber_core::types::{ChunkResult, ChunkStatus, DurableMetrics, JobRow, JobStatus};

use crate::schema::{
    CREATE_CHUNK_RESULTS_JOB_ID_INDEX, CREATE_CHUNK_RESULTS_TABLE, CREATE_JOBS_STATUS_INDEX,
    CREATE_JOBS_TABLE,
};

pub struct PgJobStore {
    pool: PgPool,
}

impl PgJobStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn status_str(status: JobStatus) -> &'static str {
    status.as_str()
}

fn parse_status(raw: &str) -> JobStatus {
    match raw {
        "queued" => JobStatus::Queued,
        "processing" => JobStatus::Processing,
        "completed" => JobStatus::Completed,
        _ => JobStatus::Failed,
    }
}

#[async_trait]
impl JobDurableStore for PgJobStore {
    async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(CREATE_JOBS_TABLE).execute(&self.pool).await?;
        sqlx::query(CREATE_CHUNK_RESULTS_TABLE)
            .execute(&self.pool)
            .await?;
        sqlx::query(CREATE_JOBS_STATUS_INDEX)
            .execute(&self.pool)
            .await?;
        sqlx::query(CREATE_CHUNK_RESULTS_JOB_ID_INDEX)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn create_job(&self, job_id: Uuid, total_points: usize, total_chunks: usize) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO batch_jobs (job_id, total_points, total_chunks, processed_chunks, failed_chunks, status)
            VALUES ($1, $2, $3, 0, 0, $4)
            "#,
        )
        .bind(job_id)
        .bind(total_points as i32)
        .bind(total_chunks as i32)
        .bind(status_str(JobStatus::Queued))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_job_status(
        &self,
        job_id: Uuid,
        status: JobStatus,
        set_started_now: bool,
        set_finished_now: bool,
        error_message: Option<&str>,
    ) -> Result<()> {
        // Column set is fixed (no user-controlled text reaches the SQL text
        // itself); only values are bound.
        let mut set_clauses = vec!["status = $1".to_string()];
        let mut next_param = 2;
        if set_started_now {
            set_clauses.push("started_at = NOW()".to_string());
        }
        if set_finished_now {
            set_clauses.push("finished_at = NOW()".to_string());
        }
        if error_message.is_some() {
            set_clauses.push(format!("error_message = ${next_param}"));
            next_param += 1;
        }
        let job_id_param = next_param;
        let sql = format!(
            "UPDATE batch_jobs SET {} WHERE job_id = ${job_id_param}",
            set_clauses.join(", ")
        );

        let mut query = sqlx::query(&sql).bind(status_str(status));
        if let Some(msg) = error_message {
            query = query.bind(msg);
        }
        query = query.bind(job_id);
        query.execute(&self.pool).await?;
        Ok(())
    }

    async fn persist_chunk_result(&self, job_id: Uuid, result: &ChunkResult) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        let status = result.status.as_str();
        sqlx::query(
            r#"
            INSERT INTO batch_chunk_results (job_id, chunk_index, processed_points, status, error_message, duration_ms)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(job_id)
        .bind(result.chunk_index as i32)
        .bind(result.processed_points as i32)
        .bind(status)
        .bind(&result.error_message)
        .bind(result.duration_ms as i32)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE batch_jobs
            SET processed_chunks = processed_chunks + 1,
                failed_chunks = failed_chunks + CASE WHEN $1 = 'failed' THEN 1 ELSE 0 END
            WHERE job_id = $2
            "#,
        )
        .bind(status)
        .bind(job_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn get_job(&self, job_id: Uuid) -> Result<Option<JobRow>> {
        #[allow(clippy::type_complexity)]
        let row: Option<(
            Uuid,
            i32,
            i32,
            i32,
            i32,
            String,
            DateTime<Utc>,
            Option<DateTime<Utc>>,
            Option<DateTime<Utc>>,
            Option<String>,
        )> = sqlx::query_as(
            r#"
            SELECT job_id, total_points, total_chunks, processed_chunks, failed_chunks,
                   status, created_at, started_at, finished_at, error_message
            FROM batch_jobs
            WHERE job_id = $1
            "#,
        )
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(
            |(
                job_id,
                total_points,
                total_chunks,
                processed_chunks,
                failed_chunks,
                status,
                created_at,
                started_at,
                finished_at,
                error_message,
            )| JobRow {
                job_id,
                total_points: total_points as usize,
                total_chunks: total_chunks as usize,
                processed_chunks: processed_chunks as usize,
                failed_chunks: failed_chunks as usize,
                status: parse_status(&status),
                created_at,
                started_at,
                finished_at,
                error_message,
            },
        ))
    }

    async fn get_chunk_results(&self, job_id: Uuid) -> Result<Vec<ChunkResult>> {
        let rows: Vec<(i32, i32, String, Option<String>, Option<i32>)> = sqlx::query_as(
            r#"
            SELECT chunk_index, processed_points, status, error_message, duration_ms
            FROM batch_chunk_results
            WHERE job_id = $1
            ORDER BY chunk_index
            "#,
        )
        .bind(job_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(
                |(chunk_index, processed_points, status, error_message, duration_ms)| ChunkResult {
                    chunk_index: chunk_index as usize,
                    processed_points: processed_points as usize,
                    status: if status == "ok" {
                        ChunkStatus::Ok
                    } else {
                        ChunkStatus::Failed
                    },
                    error_message,
                    duration_ms: duration_ms.unwrap_or(0) as i64,
                },
            )
            .collect())
    }

    async fn active_job_count(&self) -> Result<i64> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM batch_jobs WHERE status IN ('queued', 'processing')")
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    async fn mark_incomplete_jobs_failed(&self) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE batch_jobs
            SET status = 'failed',
                finished_at = NOW(),
                error_message = 'Server restarted during execution.'
            WHERE status IN ('queued', 'processing')
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn metrics(&self) -> Result<DurableMetrics> {
        let (active_jobs, completed_jobs, failed_jobs, total_jobs): (i64, i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE status IN ('queued', 'processing')),
                COUNT(*) FILTER (WHERE status = 'completed'),
                COUNT(*) FILTER (WHERE status = 'failed'),
                COUNT(*)
            FROM batch_jobs
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        let (average_chunk_duration_ms,): (f64,) =
            sqlx::query_as("SELECT COALESCE(AVG(duration_ms), 0)::float8 FROM batch_chunk_results")
                .fetch_one(&self.pool)
                .await?;

        let (average_job_duration_ms,): (f64,) = sqlx::query_as(
            r#"
            SELECT COALESCE(AVG(EXTRACT(EPOCH FROM (finished_at - started_at)) * 1000), 0)::float8
            FROM batch_jobs
            WHERE started_at IS NOT NULL AND finished_at IS NOT NULL
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(DurableMetrics {
            active_jobs,
            completed_jobs,
            failed_jobs,
            total_jobs,
            average_chunk_duration_ms,
            average_job_duration_ms,
        })
    }
}
