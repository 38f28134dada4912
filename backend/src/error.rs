//! Error handling for the Inventory Reports service
//!
//! Provides consistent error envelopes in Arabic and English. Responses
//! carry the full error chain as an extension; the error-details middleware
//! decides whether it reaches the client.

use axum::{
    extract::multipart::MultipartRejection,
    extract::rejection::{PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shared::ParamError;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Request errors
    #[error("Invalid query string: {0}")]
    QueryRejected(#[from] QueryRejection),

    #[error("Invalid path: {0}")]
    PathRejected(#[from] PathRejection),

    #[error("Invalid multipart request: {0}")]
    MultipartRejected(#[from] MultipartRejection),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(#[from] ParamError),

    #[error("No files were uploaded")]
    NoFilesUploaded,

    #[error("Unsupported file type: {0}")]
    UnsupportedFile(String),

    #[error("Too many files, at most {max} allowed")]
    TooManyFiles { max: usize },

    #[error("Invalid multipart request: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),

    // Lookup errors
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Route not found: {0}")]
    RouteNotFound(String),

    // Storage errors
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

/// Error envelope returned to clients
#[derive(Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
    pub message_en: String,
    pub code: String,
}

/// Full error chain attached to error responses
#[derive(Debug, Clone)]
pub struct ErrorDetails(pub String);

struct ErrorDetail {
    code: &'static str,
    message: String,
    message_en: String,
}

const SERVER_ERROR_AR: &str = "خطأ في الخادم";

impl AppError {
    fn detail(&self) -> (StatusCode, ErrorDetail) {
        match self {
            AppError::QueryRejected(rejection) => (
                rejection.status(),
                ErrorDetail {
                    code: "INVALID_QUERY",
                    message: "معاملات الاستعلام غير صالحة".to_string(),
                    message_en: rejection.body_text(),
                },
            ),
            AppError::PathRejected(rejection) => (
                rejection.status(),
                ErrorDetail {
                    code: "INVALID_PATH",
                    message: "مسار الطلب غير صالح".to_string(),
                    message_en: rejection.body_text(),
                },
            ),
            AppError::MultipartRejected(rejection) => (
                rejection.status(),
                ErrorDetail {
                    code: "INVALID_MULTIPART",
                    message: "طلب رفع الملفات غير صالح".to_string(),
                    message_en: rejection.body_text(),
                },
            ),
            AppError::InvalidParameter(err) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: match err {
                        ParamError::InvalidStoreCode(_) => "INVALID_STORE_CODE",
                        _ => "VALIDATION_ERROR",
                    },
                    message: err.message_ar(),
                    message_en: err.to_string(),
                },
            ),
            AppError::NoFilesUploaded => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "NO_FILES_UPLOADED",
                    message: "لم يتم رفع أي ملفات".to_string(),
                    message_en: "No files were uploaded".to_string(),
                },
            ),
            AppError::UnsupportedFile(name) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "UNSUPPORTED_FILE",
                    message: format!("يجب أن يكون الملف من نوع Excel (.xlsx أو .xls): {}", name),
                    message_en: format!("File must be an Excel workbook (.xlsx or .xls): {}", name),
                },
            ),
            AppError::TooManyFiles { max } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "TOO_MANY_FILES",
                    message: format!("الحد الأقصى لعدد الملفات هو {}", max),
                    message_en: format!("At most {} files can be uploaded at once", max),
                },
            ),
            AppError::Multipart(err) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "INVALID_MULTIPART",
                    message: "طلب رفع الملفات غير صالح".to_string(),
                    message_en: format!("Invalid multipart request: {}", err.body_text()),
                },
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                ErrorDetail {
                    code: "NOT_FOUND",
                    message: format!("لم يتم العثور على {}", resource),
                    message_en: format!("{} not found", resource),
                },
            ),
            AppError::TableNotFound(table) => (
                StatusCode::NOT_FOUND,
                ErrorDetail {
                    code: "TABLE_NOT_FOUND",
                    message: format!("الجدول {} غير موجود", table),
                    message_en: format!("Table {} not found", table),
                },
            ),
            AppError::RouteNotFound(path) => (
                StatusCode::NOT_FOUND,
                ErrorDetail {
                    code: "ROUTE_NOT_FOUND",
                    message: format!("الطريق {} غير موجود", path),
                    message_en: format!("Route {} not found", path),
                },
            ),
            AppError::Spreadsheet(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "SPREADSHEET_ERROR",
                    message: "خطأ في قراءة ملف Excel".to_string(),
                    message_en: "Failed to read spreadsheet".to_string(),
                },
            ),
            AppError::Storage(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "STORAGE_ERROR",
                    message: "خطأ في تخزين الملفات".to_string(),
                    message_en: "File storage error".to_string(),
                },
            ),
            AppError::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "DATABASE_ERROR",
                    message: SERVER_ERROR_AR.to_string(),
                    message_en: "A database error occurred".to_string(),
                },
            ),
            AppError::Internal(_) | AppError::InternalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "INTERNAL_ERROR",
                    message: SERVER_ERROR_AR.to_string(),
                    message_en: "An internal server error occurred".to_string(),
                },
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, detail) = self.detail();

        if status.is_server_error() {
            tracing::error!(code = detail.code, "Error: {:?}", self);
        } else {
            tracing::debug!(code = detail.code, "Request rejected: {}", self);
        }

        let body = ErrorResponse {
            success: false,
            message: detail.message,
            message_en: detail.message_en,
            code: detail.code.to_string(),
        };

        let mut response = (status, Json(body)).into_response();
        response
            .extensions_mut()
            .insert(ErrorDetails(format!("{:?}", self)));
        response
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_invalid_store_code_maps_to_bad_request() {
        let response =
            AppError::from(ParamError::InvalidStoreCode("7".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(response.extensions().get::<ErrorDetails>().is_some());

        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "INVALID_STORE_CODE");
        assert!(body.get("error").is_none());
    }

    #[tokio::test]
    async fn test_database_errors_are_generic() {
        let response = AppError::DatabaseError(sqlx::Error::PoolTimedOut).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["message"], SERVER_ERROR_AR);
        assert_eq!(body["code"], "DATABASE_ERROR");
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::TableNotFound("x".into()).detail().0,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::RouteNotFound("/nope".into()).detail().0,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::TooManyFiles { max: 10 }.detail().0,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Internal("boom".into()).detail().0,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
