//! Centralized error formatting
//!
//! Error responses carry their full error chain as an [`ErrorDetails`]
//! extension. Outside production the chain is copied into the JSON body as
//! `error`; in production it is dropped.

use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::header::CONTENT_LENGTH,
    middleware::Next,
    response::Response,
};

use crate::error::ErrorDetails;
use crate::AppState;

/// Error bodies are small JSON envelopes
const MAX_ERROR_BODY: usize = 64 * 1024;

pub async fn error_details_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;

    let Some(ErrorDetails(details)) = response.extensions_mut().remove::<ErrorDetails>() else {
        return response;
    };
    if state.config.is_production() {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match to_bytes(body, MAX_ERROR_BODY).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to buffer error body");
            return Response::from_parts(parts, Body::empty());
        }
    };

    let body = match serde_json::from_slice::<serde_json::Value>(&bytes) {
        Ok(serde_json::Value::Object(mut envelope)) => {
            envelope.insert("error".to_string(), serde_json::Value::String(details));
            serde_json::to_vec(&envelope).unwrap_or_else(|_| bytes.to_vec())
        }
        _ => bytes.to_vec(),
    };

    parts.headers.remove(CONTENT_LENGTH);
    Response::from_parts(parts, Body::from(body))
}
