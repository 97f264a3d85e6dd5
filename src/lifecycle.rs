//! C7 — startup schema bootstrap plus crash recovery, and graceful shutdown.
//! By design jobs never survive a restart: anything still `queued` or
//! `processing` at startup is marked `failed`.

use crate::state::AppContext;

pub async fn startup(ctx: &AppContext) -> anyhow::Result<()> {
    ctx.durable.ensure_schema().await?;
    let recovered = ctx.durable.mark_incomplete_jobs_failed().await?;
    if recovered > 0 {
        tracing::warn!(jobs_failed = recovered, "marked incomplete jobs failed after restart");
    }
    Ok(())
}

pub async fn shutdown(ctx: &AppContext) {
    tracing::info!("draining executor pools");
    ctx.executor.shutdown().await;
    tracing::info!("shutdown complete");
}

/// Resolves on Ctrl-C or SIGTERM, whichever arrives first — the signal set
/// `axum::serve(...).with_graceful_shutdown(...)` expects.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
