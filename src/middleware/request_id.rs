//! Assigns (or propagates) `x-request-id` and logs one structured line per
//! completed request, mirroring `app/middleware.py`'s `RequestContextMiddleware`.

use std::time::Instant;

use axum::body::{to_bytes, Body};
use axum::extract::Request;
use axum::http::{header, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use serde_json::Value;
use uuid::Uuid;

const HEADER: &str = "x-request-id";

pub async fn request_context(mut req: Request, next: Next) -> Response {
    let request_id = req
        .headers()
        .get(HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    req.headers_mut().insert(
        HEADER,
        HeaderValue::from_str(&request_id).unwrap_or_else(|_| HeaderValue::from_static("invalid")),
    );

    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = Instant::now();

    let mut response = next.run(req).await;

    let duration_ms = started.elapsed().as_millis();
    tracing::info!(
        request_id = %request_id,
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        duration_ms,
        "request completed"
    );

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(HEADER, value);
    }

    if response.status().is_client_error() || response.status().is_server_error() {
        response = echo_request_id_into_body(response, &request_id).await;
    }
    response
}

/// Error bodies are `{error:{code,message}}` (spec §6's `{error:{code,message},
/// request_id?}`); this fills in the top-level `request_id` the handler-level
/// `IntoResponse` impl has no way to know, since it runs with no access to the
/// request. Anything that isn't a JSON object (or fails to parse) passes through.
async fn echo_request_id_into_body(response: Response, request_id: &str) -> Response {
    let (mut parts, body) = response.into_parts();
    let bytes = match to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(_) => return Response::from_parts(parts, Body::empty()),
    };

    let Ok(Value::Object(mut map)) = serde_json::from_slice::<Value>(&bytes) else {
        return Response::from_parts(parts, Body::from(bytes));
    };
    if !map.contains_key("error") {
        return Response::from_parts(parts, Body::from(bytes));
    }
    map.entry("request_id").or_insert_with(|| Value::String(request_id.to_string()));

    let encoded = serde_json::to_vec(&Value::Object(map)).unwrap_or_else(|_| bytes.to_vec());
    parts.headers.insert(
        header::CONTENT_LENGTH,
        HeaderValue::from_str(&encoded.len().to_string()).unwrap(),
    );
    Response::from_parts(parts, Body::from(encoded))
}
