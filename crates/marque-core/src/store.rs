//! The `CommentStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `marque-store-sqlite`).
//! Higher layers (`marque-api`, the engine) depend on this abstraction, not
//! on any concrete backend.
//!
//! Denormalised counters (the comment's like/dislike counts and the
//! bookmark's comment count) are adjusted only inside the store operations
//! that own them, atomically with the row writes they accompany. No other
//! code path touches those fields.

use std::{collections::HashMap, future::Future};

use uuid::Uuid;

use crate::{
  comment::{Bookmark, Comment, NewComment, UserRef},
  vote::{VoteDelta, VoteKind},
};

/// Abstraction over a comment store backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`). Every write that
/// spans more than one row (create, soft delete, restore, vote transition)
/// must apply atomically; partial application must not be observable even
/// under concurrent callers.
pub trait CommentStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Identity / container mirrors ──────────────────────────────────────

  /// Mirror `(user_id, username)` into the store, updating the username if
  /// the row already exists. Idempotent.
  fn upsert_user<'a>(
    &'a self,
    user_id: Uuid,
    username: &'a str,
  ) -> impl Future<Output = Result<UserRef, Self::Error>> + Send + 'a;

  /// Resolve a username to its mirrored identity row. `None` if unknown.
  fn resolve_username<'a>(
    &'a self,
    username: &'a str,
  ) -> impl Future<Output = Result<Option<UserRef>, Self::Error>> + Send + 'a;

  /// Create a bookmark owned by `owner_id`, with a zero comment count.
  fn add_bookmark(
    &self,
    owner_id: Uuid,
  ) -> impl Future<Output = Result<Bookmark, Self::Error>> + Send + '_;

  /// Retrieve a bookmark by id. `None` if not found.
  fn get_bookmark(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Bookmark>, Self::Error>> + Send + '_;

  // ── Comments ──────────────────────────────────────────────────────────

  /// Retrieve a comment by id. `None` if not found.
  fn get_comment(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Comment>, Self::Error>> + Send + '_;

  /// All non-purged comments for a bookmark, ordered by creation time
  /// ascending. Soft-deleted comments are included (they render as
  /// placeholders).
  fn list_comments(
    &self,
    bookmark_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Comment>, Self::Error>> + Send + '_;

  /// Persist a new comment and increment the bookmark's comment counter in
  /// the same transaction. The `created_at` timestamp is set by the store.
  fn create_comment(
    &self,
    input: NewComment,
  ) -> impl Future<Output = Result<Comment, Self::Error>> + Send + '_;

  /// Replace a comment's content, set the edited flag, and stamp the
  /// update time. Soft-deleted rows must never be overwritten; the deleted
  /// check is part of the write, not a separate read.
  fn update_comment<'a>(
    &'a self,
    id: Uuid,
    content: &'a str,
  ) -> impl Future<Output = Result<Comment, Self::Error>> + Send + 'a;

  /// Soft-delete: preserve the current content, write the placeholder, set
  /// the deleted flag, and decrement the bookmark's comment counter
  /// (floored at zero) — all in one transaction. Children stay addressable.
  fn soft_delete_comment(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Undo a soft delete: copy the preserved content back, clear the deleted
  /// flag and the preserved slot, and re-increment the bookmark's comment
  /// counter — all in one transaction.
  fn restore_comment(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Comment, Self::Error>> + Send + '_;

  // ── Vote ledger ───────────────────────────────────────────────────────

  /// Apply one vote transition for `(user_id, comment_id)` and adjust the
  /// comment's counters, atomically:
  ///
  /// - no existing vote → insert one of `kind`, increment its counter;
  /// - existing vote of the same kind → delete it, decrement (toggle-off);
  /// - existing vote of the opposite kind → flip in place, decrement the
  ///   old counter and increment the new one.
  ///
  /// This is the only entry point that may change vote state or counters.
  fn cast_vote(
    &self,
    comment_id: Uuid,
    user_id: Uuid,
    kind: VoteKind,
  ) -> impl Future<Output = Result<VoteDelta, Self::Error>> + Send + '_;

  /// The caller's own vote on a single comment, if any.
  fn get_vote(
    &self,
    comment_id: Uuid,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Option<VoteKind>, Self::Error>> + Send + '_;

  /// All of one user's votes on comments of one bookmark, keyed by comment
  /// id. Used to annotate the response tree.
  fn votes_by_user(
    &self,
    bookmark_id: Uuid,
    user_id: Uuid,
  ) -> impl Future<Output = Result<HashMap<Uuid, VoteKind>, Self::Error>> + Send + '_;
}
