//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use visor_core::error::AssociationConflict;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  /// The resolver refused to run against stale association state. The
  /// conflicting pairs travel with the response so the caller can settle
  /// them; nothing was applied.
  #[error("association conflicts: {} pair(s)", .0.len())]
  Conflict(Vec<AssociationConflict>),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<visor_core::Error> for ApiError {
  fn from(err: visor_core::Error) -> Self {
    match err {
      visor_core::Error::InvariantViolation { conflicts } => {
        ApiError::Conflict(conflicts)
      }
      other => ApiError::BadRequest(other.to_string()),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    match &self {
      ApiError::NotFound(m) => {
        (StatusCode::NOT_FOUND, Json(json!({ "error": m }))).into_response()
      }
      ApiError::BadRequest(m) => {
        (StatusCode::BAD_REQUEST, Json(json!({ "error": m })))
          .into_response()
      }
      ApiError::Conflict(conflicts) => (
        StatusCode::CONFLICT,
        Json(json!({
          "error": "association invariants violated",
          "conflicts": conflicts,
        })),
      )
        .into_response(),
      ApiError::Store(e) => (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": e.to_string() })),
      )
        .into_response(),
    }
  }
}
