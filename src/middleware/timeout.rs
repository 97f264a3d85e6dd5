//! Enforces `request_timeout_seconds` at the HTTP boundary. Independent of
//! background job execution — `/upload-batch` returns before the driver
//! starts, so this never cancels job work, only the admission request itself.

use std::time::Duration;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

use crate::error::AppError;

#[derive(Clone)]
pub struct TimeoutConfig {
    pub duration: Duration,
}

pub async fn request_timeout(
    State(config): State<TimeoutConfig>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    match tokio::time::timeout(config.duration, next.run(req)).await {
        Ok(response) => Ok(response),
        Err(_) => Err(AppError::RequestTimeout),
    }
}
