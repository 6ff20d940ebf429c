//! Error type for `marque-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("unknown vote kind: {0:?}")]
  UnknownVoteKind(String),

  /// Attempted to mutate a comment row that was not found (or, for soft
  /// delete and restore, was not in the expected deleted state).
  #[error("comment not found: {0}")]
  CommentNotFound(uuid::Uuid),

  /// Attempted to edit a comment row that is soft-deleted.
  #[error("comment is deleted: {0}")]
  CommentDeleted(uuid::Uuid),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
