//! Maps every error family in the service's taxonomy to an HTTP response.
//! Mirrors `sem_os_server::error::AppError` structurally: one wrapper, one
//! `IntoResponse` impl, rather than a chain of exception handlers.

use axum::{http::StatusCode, response::IntoResponse, response::Response, Json};
use fiber_core::error::RouteError;
use serde_json::json;

/// The full HTTP-facing error taxonomy (spec §7), beyond what `RouteError`
/// alone classifies — admission, job lifecycle, and boundary failures.
#[derive(Debug)]
pub enum AppError {
    Route(RouteError),
    ValidationError(String),
    MalformedJson(String),
    BatchTooLarge,
    ServerBusy,
    PersistenceError(String),
    ExecutorUnavailable,
    JobNotFound,
    JobNotReady,
    PayloadTooLarge,
    InvalidContentLength,
    RateLimitExceeded { retry_after_seconds: u64 },
    RequestTimeout,
    HealthCheckFailed(String),
    Internal(String),
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Route(e) => e.code(),
            Self::ValidationError(_) => "validation_error",
            Self::MalformedJson(_) => "malformed_json",
            Self::BatchTooLarge => "batch_too_large",
            Self::ServerBusy => "server_busy",
            Self::PersistenceError(_) => "persistence_error",
            Self::ExecutorUnavailable => "executor_unavailable",
            Self::JobNotFound => "job_not_found",
            Self::JobNotReady => "job_not_ready",
            Self::PayloadTooLarge => "payload_too_large",
            Self::InvalidContentLength => "invalid_content_length",
            Self::RateLimitExceeded { .. } => "rate_limit_exceeded",
            Self::RequestTimeout => "request_timeout",
            Self::HealthCheckFailed(_) => "health_check_failed",
            Self::Internal(_) => "internal_error",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Route(e) => {
                if e.is_user_error() {
                    StatusCode::BAD_REQUEST
                } else {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            }
            Self::ValidationError(_) | Self::MalformedJson(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::BatchTooLarge | Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::ServerBusy | Self::RateLimitExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::PersistenceError(_) | Self::ExecutorUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::JobNotFound => StatusCode::NOT_FOUND,
            Self::JobNotReady => StatusCode::CONFLICT,
            Self::InvalidContentLength => StatusCode::BAD_REQUEST,
            Self::RequestTimeout => StatusCode::GATEWAY_TIMEOUT,
            Self::HealthCheckFailed(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            Self::Route(e) => e.to_string(),
            Self::ValidationError(msg) => msg.clone(),
            Self::MalformedJson(_) => "Malformed JSON request body.".to_string(),
            Self::BatchTooLarge => "Batch exceeds the maximum accepted point count.".to_string(),
            Self::ServerBusy => "Too many active jobs; try again later.".to_string(),
            Self::PersistenceError(msg) => msg.clone(),
            Self::ExecutorUnavailable => "Job executor could not accept the job.".to_string(),
            Self::JobNotFound => "No job with that id was found.".to_string(),
            Self::JobNotReady => "Job has not reached a terminal state yet.".to_string(),
            Self::PayloadTooLarge => "Request body exceeds the configured limit.".to_string(),
            Self::InvalidContentLength => "Content-Length header is missing or invalid.".to_string(),
            Self::RateLimitExceeded { .. } => "Rate limit exceeded.".to_string(),
            Self::RequestTimeout => "Request exceeded the configured timeout.".to_string(),
            Self::HealthCheckFailed(msg) => msg.clone(),
            Self::Internal(msg) => msg.clone(),
        }
    }
}

impl From<RouteError> for AppError {
    fn from(e: RouteError) -> Self {
        Self::Route(e)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(e: anyhow::Error) -> Self {
        Self::Internal(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();
        let message = self.message();

        let mut response = (
            status,
            Json(json!({
                "error": { "code": code, "message": message },
            })),
        )
            .into_response();

        if let Self::RateLimitExceeded { retry_after_seconds } = &self {
            response
                .headers_mut()
                .insert("retry-after", retry_after_seconds.to_string().parse().unwrap());
        }

        response
    }
}
