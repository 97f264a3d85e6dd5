//! PostgreSQL/PostGIS/pgRouting adapter crate. Implements every port trait
//! defined in `fiber_core::ports` against a single `sqlx::PgPool`.

pub mod catalog;
pub mod job_store;
pub mod schema;
pub mod spatial;

pub use catalog::PgCatalogGateway;
pub use job_store::PgJobStore;
pub use spatial::PgSpatialGateway;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Connects with the pool-sizing settings the core config carries, applying
/// `statement_timeout_ms` per spec §4.1's requirement that a single slow query
/// cannot wedge the pool indefinitely.
pub async fn connect(database_url: &str, max_connections: u32, statement_timeout_ms: u64) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .after_connect(move |conn, _meta| {
            Box::pin(async move {
                sqlx::query(&format!("SET statement_timeout = {statement_timeout_ms}"))
                    .execute(conn)
                    .await?;
                Ok(())
            })
        })
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Bundles the three store adapters behind one pool, mirroring the shared-pool
/// wiring pattern in `sem_os_postgres`.
pub struct PgStores {
    pub spatial: PgSpatialGateway,
    pub job_store: PgJobStore,
    pub catalog: PgCatalogGateway,
}

impl PgStores {
    pub fn new(pool: PgPool) -> Self {
        Self {
            spatial: PgSpatialGateway::new(pool.clone()),
            job_store: PgJobStore::new(pool.clone()),
            catalog: PgCatalogGateway::new(pool),
        }
    }
}
