//! Error type for the media service and its [`IntoResponse`] mapping.

use axum::{
  Json,
  extract::multipart::MultipartError,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MediaError {
  #[error("not found: {0}")]
  NotFound(String),

  /// Missing file part, unsupported type, oversize upload.
  #[error("invalid upload: {0}")]
  InvalidUpload(String),

  #[error("malformed multipart body: {0}")]
  Multipart(#[from] MultipartError),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T, E = MediaError> = std::result::Result<T, E>;

impl IntoResponse for MediaError {
  fn into_response(self) -> Response {
    let status = match &self {
      MediaError::NotFound(_) => StatusCode::NOT_FOUND,
      MediaError::InvalidUpload(_) | MediaError::Multipart(_) => {
        StatusCode::BAD_REQUEST
      }
      MediaError::Io(e) => {
        tracing::error!(error = %e, "media file io failed");
        StatusCode::INTERNAL_SERVER_ERROR
      }
      MediaError::Store(e) => {
        tracing::error!(error = %e, "store error");
        StatusCode::INTERNAL_SERVER_ERROR
      }
    };
    let message = if status.is_server_error() {
      "internal server error".to_owned()
    } else {
      self.to_string()
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
