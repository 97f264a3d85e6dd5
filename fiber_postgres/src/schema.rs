//! DDL for the two durable tables this service owns. Spatial tables (districts,
//! franchise_zones, fiber_nodes, road_nodes, road_edges) are ingest-owned and not
//! created here — the core assumes they already exist with their invariants
//! enforced at ingest time (spec §3).

pub const CREATE_JOBS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS batch_jobs (
    job_id UUID PRIMARY KEY,
    total_points INTEGER NOT NULL,
    total_chunks INTEGER NOT NULL,
    processed_chunks INTEGER NOT NULL DEFAULT 0,
    failed_chunks INTEGER NOT NULL DEFAULT 0,
    status TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    started_at TIMESTAMPTZ,
    finished_at TIMESTAMPTZ,
    error_message TEXT
)
"#;

pub const CREATE_CHUNK_RESULTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS batch_chunk_results (
    id SERIAL PRIMARY KEY,
    job_id UUID NOT NULL REFERENCES batch_jobs(job_id) ON DELETE CASCADE,
    chunk_index INTEGER NOT NULL,
    processed_points INTEGER NOT NULL,
    status TEXT NOT NULL,
    error_message TEXT,
    duration_ms INTEGER
)
"#;

pub const CREATE_JOBS_STATUS_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_batch_jobs_status ON batch_jobs(status)";

pub const CREATE_CHUNK_RESULTS_JOB_ID_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_batch_chunk_results_job_id ON batch_chunk_results(job_id)";
