//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use msi_core::{SubmissionError, ValidationError};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("{0}")]
  Unauthorized(String),

  #[error("admin access required")]
  Forbidden,

  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error(transparent)]
  Validation(ValidationError),

  #[error(transparent)]
  Submission(SubmissionError),

  #[error("export error: {0}")]
  Export(#[from] msi_csv::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<msi_core::Error> for ApiError {
  fn from(e: msi_core::Error) -> Self {
    match e {
      msi_core::Error::InvalidCredentials => ApiError::Unauthorized(e.to_string()),
      msi_core::Error::Forbidden => ApiError::Forbidden,
      msi_core::Error::NotAnOption { .. } => ApiError::BadRequest(e.to_string()),
      msi_core::Error::Validation(v) => ApiError::Validation(v),
      msi_core::Error::Submission(s) => ApiError::Submission(s),
      msi_core::Error::Store(s) => ApiError::Store(s),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = match &self {
      ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
      ApiError::Forbidden => StatusCode::FORBIDDEN,
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
      ApiError::Submission(e) => {
        if !e.orphaned.is_empty() {
          warn!(orphaned = ?e.orphaned, "documents left behind after failed submission");
        }
        error!(error = %e, "submission failed");
        StatusCode::INTERNAL_SERVER_ERROR
      }
      ApiError::Export(e) => {
        error!(error = %e, "export failed");
        StatusCode::INTERNAL_SERVER_ERROR
      }
      ApiError::Store(e) => {
        error!(error = %e, "store error");
        StatusCode::INTERNAL_SERVER_ERROR
      }
    };
    (status, Json(json!({ "error": self.to_string() }))).into_response()
  }
}
