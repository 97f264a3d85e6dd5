//! C4's in-memory layer: the job cache. A single mutex guards every read/write,
//! including eviction, mirroring `app/job_store.py::InMemoryJobStore`.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::Utc;
use uuid::Uuid;

use crate::types::{ChunkResult, ChunkStatus, JobRecord, JobStatus};

pub struct JobCache {
    inner: Mutex<HashMap<Uuid, JobRecord>>,
    job_retention_seconds: i64,
    max_stored_results_bytes: u64,
}

impl JobCache {
    pub fn new(job_retention_seconds: i64, max_stored_results_bytes: u64) -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
            job_retention_seconds,
            max_stored_results_bytes,
        }
    }

    /// Admission: atomic with respect to other admissions. Returns `None` if the
    /// active-job count is already at `max_active_jobs`.
    pub fn create_job_if_capacity(
        &self,
        total_points: usize,
        chunk_sizes: Vec<usize>,
        max_active_jobs: usize,
    ) -> Option<JobRecord> {
        let mut guard = self.inner.lock().unwrap();
        let active = guard.values().filter(|j| j.status.is_active()).count();
        if active >= max_active_jobs {
            return None;
        }
        let record = JobRecord::new(Uuid::new_v4(), total_points, chunk_sizes, Utc::now());
        guard.insert(record.job_id, record.clone());
        self.enforce_memory_limit_locked(&mut guard);
        Some(record)
    }

    pub fn set_job(&self, record: JobRecord) -> JobRecord {
        let mut guard = self.inner.lock().unwrap();
        guard.insert(record.job_id, record.clone());
        self.enforce_memory_limit_locked(&mut guard);
        record
    }

    pub fn get_job(&self, job_id: Uuid) -> Option<JobRecord> {
        self.inner.lock().unwrap().get(&job_id).cloned()
    }

    pub fn pop_job(&self, job_id: Uuid) -> Option<JobRecord> {
        self.inner.lock().unwrap().remove(&job_id)
    }

    /// Applies a mutation to an existing job, refreshing `last_updated_at`.
    /// Returns `None` if the job is absent.
    pub fn update_job(&self, job_id: Uuid, f: impl FnOnce(&mut JobRecord)) -> Option<JobRecord> {
        let mut guard = self.inner.lock().unwrap();
        let updated = {
            let job = guard.get_mut(&job_id)?;
            f(job);
            job.last_updated_at = Utc::now();
            job.clone()
        };
        self.enforce_memory_limit_locked(&mut guard);
        Some(updated)
    }

    pub fn append_result(&self, job_id: Uuid, item: ChunkResult) -> Option<JobRecord> {
        let mut guard = self.inner.lock().unwrap();
        let updated = {
            let job = guard.get_mut(&job_id)?;
            let failed = matches!(item.status, ChunkStatus::Failed);
            let duration = item.duration_ms;
            job.results.push(item);
            job.processed_chunks += 1;
            if failed {
                job.failed_chunks += 1;
            }
            let processed = job.processed_chunks as f64;
            let prev_avg = job.average_chunk_duration;
            job.average_chunk_duration = ((prev_avg * (processed - 1.0)) + duration as f64) / processed.max(1.0);
            job.max_chunk_duration = job.max_chunk_duration.max(duration);
            job.total_processing_time += duration;
            job.last_updated_at = Utc::now();
            job.clone()
        };
        self.enforce_memory_limit_locked(&mut guard);
        Some(updated)
    }

    pub fn active_job_count(&self) -> usize {
        self.inner
            .lock()
            .unwrap()
            .values()
            .filter(|j| j.status.is_active())
            .count()
    }

    pub fn metrics(&self) -> CacheMetrics {
        let guard = self.inner.lock().unwrap();
        let mut m = CacheMetrics::default();
        for job in guard.values() {
            m.total_jobs += 1;
            match job.status {
                JobStatus::Queued | JobStatus::Processing => m.active_jobs += 1,
                JobStatus::Completed => m.completed_jobs += 1,
                JobStatus::Failed => m.failed_jobs += 1,
            }
        }
        m
    }

    /// TTL sweep: terminal entries older than `job_retention_seconds` are
    /// removed, then the memory-pressure guard runs. Returns the count removed.
    pub fn cleanup_finished(&self) -> usize {
        let mut guard = self.inner.lock().unwrap();
        let now = Utc::now();
        let ttl = self.job_retention_seconds;
        let expired: Vec<Uuid> = guard
            .values()
            .filter(|j| j.status.is_terminal())
            .filter(|j| (now - j.eviction_timestamp()).num_seconds() > ttl)
            .map(|j| j.job_id)
            .collect();
        let mut removed = expired.len();
        for id in expired {
            guard.remove(&id);
        }
        removed += self.enforce_memory_limit_locked(&mut guard);
        removed
    }

    pub fn enforce_memory_limit(&self) -> usize {
        let mut guard = self.inner.lock().unwrap();
        self.enforce_memory_limit_locked(&mut guard)
    }

    /// Removes terminal entries oldest-first until total approximate size is
    /// under budget. Non-terminal entries are never evicted — backpressure
    /// against acceptance (admission) handles load instead.
    fn enforce_memory_limit_locked(&self, guard: &mut HashMap<Uuid, JobRecord>) -> usize {
        if self.max_stored_results_bytes == 0 {
            return 0;
        }
        let mut removed = 0;
        loop {
            let total: u64 = guard.values().map(|j| j.approx_size_bytes() as u64).sum();
            if total <= self.max_stored_results_bytes {
                break;
            }
            let oldest = guard
                .values()
                .filter(|j| j.status.is_terminal())
                .min_by_key(|j| j.eviction_timestamp())
                .map(|j| j.job_id);
            match oldest {
                Some(id) => {
                    guard.remove(&id);
                    removed += 1;
                }
                None => break,
            }
        }
        removed
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct CacheMetrics {
    pub active_jobs: usize,
    pub completed_jobs: usize,
    pub failed_jobs: usize,
    pub total_jobs: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChunkStatus;

    fn sample_chunk(idx: usize, status: ChunkStatus, duration_ms: i64) -> ChunkResult {
        ChunkResult {
            chunk_index: idx,
            processed_points: 10,
            status,
            error_message: None,
            duration_ms,
        }
    }

    #[test]
    fn admission_refuses_past_capacity() {
        let cache = JobCache::new(300, 200 * 1024 * 1024);
        assert!(cache.create_job_if_capacity(10, vec![10], 1).is_some());
        assert!(cache.create_job_if_capacity(10, vec![10], 1).is_none());
    }

    #[test]
    fn append_result_updates_rolling_aggregates() {
        let cache = JobCache::new(300, 200 * 1024 * 1024);
        let job = cache.create_job_if_capacity(20, vec![10, 10], 5).unwrap();
        cache.append_result(job.job_id, sample_chunk(0, ChunkStatus::Ok, 100));
        cache.append_result(job.job_id, sample_chunk(1, ChunkStatus::Failed, 300));
        let updated = cache.get_job(job.job_id).unwrap();
        assert_eq!(updated.processed_chunks, 2);
        assert_eq!(updated.failed_chunks, 1);
        assert_eq!(updated.average_chunk_duration, 200.0);
        assert_eq!(updated.max_chunk_duration, 300);
        assert_eq!(updated.total_processing_time, 400);
    }

    #[test]
    fn ttl_eviction_only_removes_terminal_entries_past_retention() {
        let cache = JobCache::new(-1, 200 * 1024 * 1024);
        let job = cache.create_job_if_capacity(10, vec![10], 5).unwrap();
        cache.update_job(job.job_id, |j| {
            j.status = JobStatus::Completed;
            j.finished_at = Some(Utc::now());
        });
        let removed = cache.cleanup_finished();
        assert_eq!(removed, 1);
        assert!(cache.get_job(job.job_id).is_none());
    }

    #[test]
    fn non_terminal_entries_survive_memory_pressure() {
        let cache = JobCache::new(300, 1);
        let job = cache.create_job_if_capacity(10, vec![10], 5).unwrap();
        cache.enforce_memory_limit();
        assert!(cache.get_job(job.job_id).is_some());
    }
}
