//! Caller-identity extraction.
//!
//! Authentication is the surrounding web layer's responsibility; it passes
//! the resolved identity down as trusted headers:
//!
//! | Header        | Meaning                              |
//! |---------------|--------------------------------------|
//! | `x-user-id`   | UUID of the authenticated user       |
//! | `x-username`  | Display/mention name of that user    |
//! | `x-moderator` | `true`/`1` when the caller moderates |
//!
//! Reads accept anonymous callers ([`MaybeCaller`]); writes require an
//! identity ([`RequireCaller`]) and answer 401 without one.

use axum::http::{HeaderMap, request::Parts};
use marque_core::moderation::Caller;
use uuid::Uuid;

use crate::error::ApiError;

fn caller_from_headers(headers: &HeaderMap) -> Result<Option<Caller>, ApiError> {
  let Some(raw_id) = headers.get("x-user-id") else {
    return Ok(None);
  };

  let user_id: Uuid = raw_id
    .to_str()
    .ok()
    .and_then(|s| s.parse().ok())
    .ok_or_else(|| ApiError::BadRequest("x-user-id is not a valid UUID".to_string()))?;

  let username = headers
    .get("x-username")
    .and_then(|v| v.to_str().ok())
    .filter(|s| !s.is_empty())
    .ok_or_else(|| ApiError::BadRequest("x-username header is required".to_string()))?
    .to_string();

  let moderator = headers
    .get("x-moderator")
    .and_then(|v| v.to_str().ok())
    .map(|s| s == "true" || s == "1")
    .unwrap_or(false);

  Ok(Some(Caller { user_id, username, moderator }))
}

/// The caller's identity, if the request carries one.
pub struct MaybeCaller(pub Option<Caller>);

impl<S: Send + Sync> axum::extract::FromRequestParts<S> for MaybeCaller {
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
    Ok(MaybeCaller(caller_from_headers(&parts.headers)?))
  }
}

/// The caller's identity; rejects the request with 401 when absent.
pub struct RequireCaller(pub Caller);

impl<S: Send + Sync> axum::extract::FromRequestParts<S> for RequireCaller {
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
    caller_from_headers(&parts.headers)?
      .map(RequireCaller)
      .ok_or_else(|| ApiError::Unauthorized("caller identity required".to_string()))
  }
}
