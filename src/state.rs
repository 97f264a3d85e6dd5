//! Application context (spec §9's "global process-wide state... expose as an
//! application context constructed at startup and passed explicitly through
//! handler scope"). Built once in `main`, shared via `axum::Extension`.

use std::sync::Arc;

use fiber_core::cache::JobCache;
use fiber_core::chunk::ChunkProcessor;
use fiber_core::config::Settings;
use fiber_core::ports::{CatalogGateway, JobDurableStore, SpatialGateway};

use crate::executor::ExecutorPool;

#[derive(Clone)]
pub struct AppContext(pub Arc<AppContextInner>);

pub struct AppContextInner {
    pub settings: Settings,
    pub spatial: Arc<dyn SpatialGateway>,
    pub catalog: Arc<dyn CatalogGateway>,
    pub durable: Arc<dyn JobDurableStore>,
    pub cache: Arc<JobCache>,
    pub processor: Arc<dyn ChunkProcessor>,
    pub executor: Arc<ExecutorPool>,
}

impl AppContext {
    pub fn new(
        settings: Settings,
        spatial: Arc<dyn SpatialGateway>,
        catalog: Arc<dyn CatalogGateway>,
        durable: Arc<dyn JobDurableStore>,
        processor: Arc<dyn ChunkProcessor>,
    ) -> Self {
        let cache = Arc::new(JobCache::new(
            settings.job_retention_seconds,
            settings.max_stored_results_memory_bytes(),
        ));
        let executor = Arc::new(ExecutorPool::new(
            settings.executor_max_workers,
            settings.chunk_executor_max_workers,
            std::time::Duration::from_secs(settings.chunk_timeout_seconds),
        ));
        Self(Arc::new(AppContextInner {
            settings,
            spatial,
            catalog,
            durable,
            cache,
            processor,
            executor,
        }))
    }
}

impl std::ops::Deref for AppContext {
    type Target = AppContextInner;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
