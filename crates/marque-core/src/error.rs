//! Error types for `marque-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("bookmark not found: {0}")]
  BookmarkNotFound(Uuid),

  #[error("comment not found: {0}")]
  CommentNotFound(Uuid),

  #[error("not allowed to modify comment {0}")]
  Forbidden(Uuid),

  #[error("maximum depth exceeded (max {max})")]
  DepthExceeded { max: u32 },

  #[error("comment {0} is deleted")]
  CommentDeleted(Uuid),

  #[error("comment {0} is not deleted")]
  NotDeleted(Uuid),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Wrap a backend error as [`Error::Store`].
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
