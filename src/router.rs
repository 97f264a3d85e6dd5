//! Router construction. Middleware is layered so the observable request flow
//! is RequestTimeout → RateLimit → PayloadSizeLimit → RequestContext → CORS →
//! handler, matching `app/main.py`'s Starlette middleware stack (Starlette
//! itself applies `add_middleware` calls in reverse of registration order).

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::{middleware as axum_mw, Extension, Router};
use tower_http::cors::CorsLayer;

use crate::handlers;
use crate::middleware::payload_limit::{payload_size_limit, PayloadLimitConfig};
use crate::middleware::rate_limit::{rate_limit, RateLimitConfig, RateLimiter};
use crate::middleware::request_id::request_context;
use crate::middleware::timeout::{request_timeout, TimeoutConfig};
use crate::state::AppContext;

pub fn build_router(ctx: AppContext) -> Router {
    let cors = build_cors(&ctx.settings.cors_allow_origins);

    let payload_config = PayloadLimitConfig {
        max_body_bytes: ctx.settings.max_request_body_bytes,
    };
    let rate_limit_config = RateLimitConfig {
        limiter: Arc::new(RateLimiter::new(
            ctx.settings.rate_limit_window_seconds,
            ctx.settings.rate_limit_requests_per_window,
        )),
    };
    let timeout_config = TimeoutConfig {
        duration: Duration::from_secs(ctx.settings.request_timeout_seconds),
    };

    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/catalog/summary", get(handlers::catalog::summary))
        .route("/catalog/districts", get(handlers::catalog::districts))
        .route("/catalog/franchises", get(handlers::catalog::franchises))
        .route("/routing/compute", post(handlers::routing::compute))
        .route("/upload-batch", post(handlers::batch::upload_batch))
        .route("/job-status/:job_id", get(handlers::batch::job_status))
        .route("/job-result/:job_id", get(handlers::batch::job_result))
        .route("/jobs/metrics", get(handlers::batch::jobs_metrics))
        .layer(Extension(ctx))
        .layer(cors)
        .layer(axum_mw::from_fn(request_context))
        .layer(axum_mw::from_fn_with_state(payload_config, payload_size_limit))
        .layer(axum_mw::from_fn_with_state(rate_limit_config, rate_limit))
        .layer(axum_mw::from_fn_with_state(timeout_config, request_timeout))
}

fn build_cors(allow_origins: &str) -> CorsLayer {
    if allow_origins.trim() == "*" {
        return CorsLayer::permissive();
    }
    let origins: Vec<_> = allow_origins
        .split(',')
        .filter_map(|origin| origin.trim().parse().ok())
        .collect();
    CorsLayer::new().allow_origin(origins)
}
