//! Health check and fallback handlers

use axum::http::Uri;

use crate::error::AppError;

/// Root endpoint
pub async fn root() -> &'static str {
    "Inventory Reports API v1.0"
}

/// Liveness check; does not touch the database
pub async fn health_check() -> &'static str {
    "OK"
}

/// Answer for any path no route matched
pub async fn route_not_found(uri: Uri) -> AppError {
    AppError::RouteNotFound(uri.path().to_string())
}
