//! Request extractors that reject with `AppError`
//!
//! Axum's own `Query`, `Path` and `Multipart` reject with plain-text bodies.
//! These wrappers convert the rejection so it is rendered as the usual JSON
//! error envelope and passes through the error-details middleware.

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Request},
    http::request::Parts,
};
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// Query string deserialized into `T`
#[derive(Debug, Clone, Copy, Default)]
pub struct Query<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for Query<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let axum::extract::Query(value) =
            axum::extract::Query::<T>::from_request_parts(parts, state).await?;
        Ok(Query(value))
    }
}

/// Path segments deserialized into `T`
#[derive(Debug, Clone, Copy, Default)]
pub struct Path<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for Path<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let axum::extract::Path(value) =
            axum::extract::Path::<T>::from_request_parts(parts, state).await?;
        Ok(Path(value))
    }
}

/// `multipart/form-data` body
pub struct Multipart(pub axum::extract::Multipart);

#[async_trait]
impl<S> FromRequest<S> for Multipart
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let multipart = axum::extract::Multipart::from_request(req, state).await?;
        Ok(Multipart(multipart))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct SearchParams {
        #[allow(dead_code)]
        search: Option<String>,
    }

    fn parts(uri: &str) -> Parts {
        Request::builder()
            .uri(uri)
            .body(Body::empty())
            .unwrap()
            .into_parts()
            .0
    }

    #[tokio::test]
    async fn test_query_rejection_becomes_app_error() {
        let mut parts = parts("/materials?search=a&search=b");
        let result = Query::<SearchParams>::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(AppError::QueryRejected(_))));
    }

    #[tokio::test]
    async fn test_query_accepts_single_value() {
        let mut parts = parts("/materials?search=milk");
        let Query(params) = Query::<SearchParams>::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(params.search.as_deref(), Some("milk"));
    }

    #[tokio::test]
    async fn test_multipart_without_boundary_becomes_app_error() {
        let req = Request::builder()
            .method("POST")
            .header("content-type", "application/json")
            .body(Body::from("{}"))
            .unwrap();
        let result = Multipart::from_request(req, &()).await;
        assert!(matches!(result, Err(AppError::MultipartRejected(_))));
    }
}
