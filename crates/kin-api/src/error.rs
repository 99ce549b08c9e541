//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use kin_core::TreeError;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl<E> From<TreeError<E>> for ApiError
where
  E: std::error::Error + Send + Sync + 'static,
{
  fn from(err: TreeError<E>) -> Self {
    match err {
      TreeError::AnchorNotFound(e) => ApiError::NotFound(e.to_string()),
      TreeError::Store(e) => ApiError::Store(Box::new(e)),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
      ApiError::Store(e) => {
        // The detail goes to the log only.
        tracing::error!(error = %e, "store error");
        (StatusCode::INTERNAL_SERVER_ERROR, "internal server error".to_owned())
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
