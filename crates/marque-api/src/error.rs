//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("forbidden: {0}")]
  Forbidden(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("unauthorized: {0}")]
  Unauthorized(String),

  #[error("engine error: {0}")]
  Engine(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<marque_core::Error> for ApiError {
  fn from(e: marque_core::Error) -> Self {
    use marque_core::Error as E;
    match e {
      E::BookmarkNotFound(_) | E::CommentNotFound(_) => ApiError::NotFound(e.to_string()),
      E::Forbidden(_) => ApiError::Forbidden(e.to_string()),
      E::DepthExceeded { .. } | E::CommentDeleted(_) | E::NotDeleted(_) => {
        ApiError::BadRequest(e.to_string())
      }
      E::Store(inner) => ApiError::Engine(inner),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::Forbidden(m) => (StatusCode::FORBIDDEN, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Unauthorized(m) => (StatusCode::UNAUTHORIZED, m.clone()),
      ApiError::Engine(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
