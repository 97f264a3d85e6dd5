//! Rejects oversized or ambiguous request bodies before they reach a handler,
//! mirroring `app/middleware.py`'s `PayloadSizeLimitMiddleware`.

use axum::extract::{Request, State};
use axum::http::{header, Method};
use axum::middleware::Next;
use axum::response::Response;

use crate::error::AppError;

#[derive(Clone)]
pub struct PayloadLimitConfig {
    pub max_body_bytes: u64,
}

pub async fn payload_size_limit(
    State(config): State<PayloadLimitConfig>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let content_length = req
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());

    let has_body = matches!(*req.method(), Method::POST | Method::PUT | Method::PATCH);

    match content_length {
        Some(len) if len > config.max_body_bytes => return Err(AppError::PayloadTooLarge),
        None if has_body => return Err(AppError::InvalidContentLength),
        _ => {}
    }

    Ok(next.run(req).await)
}
