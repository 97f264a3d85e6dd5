//! A `Json` extractor that folds axum's built-in `JsonRejection` into the
//! service's own `AppError` taxonomy, so a malformed or wrong-shaped request
//! body produces the spec's `{error:{code,message}}` contract instead of
//! axum's plain-text rejection response.

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::{async_trait, Json};
use serde::de::DeserializeOwned;

use crate::error::AppError;

pub struct AppJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for AppJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(AppJson(value)),
            Err(rejection) => Err(classify(rejection)),
        }
    }
}

/// `JsonSyntaxError`/`BytesRejection` mean the body itself isn't valid JSON;
/// everything else (missing field, wrong type, wrong content-type) is a
/// shape mismatch against the target type. Mirrors `app/main.py`'s
/// `validation_error_handler` distinguishing `json_invalid` from other
/// `RequestValidationError` entries.
fn classify(rejection: JsonRejection) -> AppError {
    match rejection {
        JsonRejection::JsonSyntaxError(e) => AppError::MalformedJson(e.to_string()),
        JsonRejection::BytesRejection(e) => AppError::MalformedJson(e.to_string()),
        other => AppError::ValidationError(other.to_string()),
    }
}
