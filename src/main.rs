//! fiber-routing-server.
//!
//! Reads config from environment (see `fiber_core::config::Settings` for the
//! full list; `DATABASE_URL` is the one operators must actually set).

use std::net::SocketAddr;
use std::sync::Arc;

use fiber_core::chunk::{ChunkProcessor, MockChunkProcessor, RoutingChunkProcessor};
use fiber_core::config::Settings;
use fiber_postgres::PgStores;
use fiber_routing::{lifecycle, router::build_router, state::AppContext};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,fiber_routing=debug".into()),
        )
        .init();

    let settings = Settings::from_env();

    let pool = fiber_postgres::connect(&settings.database_url, 10, settings.request_timeout_seconds * 1000)
        .await
        .expect("failed to connect to database");
    tracing::info!("connected to database");

    let stores = PgStores::new(pool);

    let use_mock_processor = std::env::var("USE_MOCK_CHUNK_PROCESSOR")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    let spatial: Arc<dyn fiber_core::ports::SpatialGateway> = Arc::new(stores.spatial);
    let processor: Arc<dyn ChunkProcessor> = if use_mock_processor {
        Arc::new(MockChunkProcessor::new(settings.mock_chunk_delay_seconds))
    } else {
        Arc::new(RoutingChunkProcessor {
            gateway: Arc::clone(&spatial),
            default_cost_per_meter: settings.default_cost_per_meter,
        })
    };

    let ctx = AppContext::new(
        settings.clone(),
        spatial,
        Arc::new(stores.catalog),
        Arc::new(stores.job_store),
        processor,
    );

    lifecycle::startup(&ctx).await.expect("startup failed");

    let app = build_router(ctx.clone());

    let bind_addr: SocketAddr = std::env::var("BIND_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
        .parse()
        .expect("BIND_ADDR must be a valid socket address");

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind to {bind_addr}: {e}"));
    tracing::info!("{} {} listening on {bind_addr}", settings.app_name, settings.app_version);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(lifecycle::shutdown_signal())
    .await
    .expect("server error");

    lifecycle::shutdown(&ctx).await;
}
