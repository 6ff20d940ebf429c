//! Comment and container records — the rows the engine operates on.
//!
//! A comment belongs to exactly one bookmark and optionally to a parent
//! comment; the reply tree is implicit in the `parent_id` references and is
//! rebuilt at query time (see [`crate::tree`]). Like/dislike counters are
//! denormalised copies of the vote ledger and are mutated only by the vote
//! transition (see [`crate::store::CommentStore::cast_vote`]).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Nesting limit for replies. A reply whose depth would exceed this is
/// rejected at creation time.
pub const MAX_DEPTH: u32 = 5;

/// The fixed text shown in place of a soft-deleted comment's content.
pub const DELETED_PLACEHOLDER: &str = "[deleted]";

// ─── Identity mirrors ────────────────────────────────────────────────────────

/// A mirrored identity row. The surrounding application owns user accounts;
/// the store keeps `(user_id, username)` so mention tokens can be resolved
/// and author names rendered without a second lookup path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
  pub user_id:  Uuid,
  pub username: String,
}

/// The container a comment is attached to. Only `comment_count` is mutated
/// by this engine; every other bookmark field belongs to the surrounding
/// application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bookmark {
  pub bookmark_id:   Uuid,
  pub owner_id:      Uuid,
  /// Denormalised count of non-deleted comments. Floored at zero.
  pub comment_count: i64,
  pub created_at:    DateTime<Utc>,
}

// ─── Comment ─────────────────────────────────────────────────────────────────

/// A persisted comment row.
///
/// While `deleted` is set, `content` holds [`DELETED_PLACEHOLDER`] and the
/// real text is preserved in `original_content` for a possible restore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
  pub comment_id:       Uuid,
  pub bookmark_id:      Uuid,
  pub author_id:        Uuid,
  /// Resolved from the identity mirror at read time; never stored on the row.
  pub author_name:      String,
  pub parent_id:        Option<Uuid>,
  pub content:          String,
  pub original_content: Option<String>,
  /// 0 for top-level, `parent.depth + 1` otherwise. Never exceeds
  /// [`MAX_DEPTH`].
  pub depth:            u32,
  pub like_count:       i64,
  pub dislike_count:    i64,
  pub deleted:          bool,
  pub edited:           bool,
  pub created_at:       DateTime<Utc>,
  pub updated_at:       Option<DateTime<Utc>>,
}

// ─── NewComment ──────────────────────────────────────────────────────────────

/// Input to [`crate::store::CommentStore::create_comment`].
/// `created_at` is always set by the store; `depth` is validated by the
/// engine before it reaches the store.
#[derive(Debug, Clone)]
pub struct NewComment {
  pub bookmark_id: Uuid,
  pub author_id:   Uuid,
  pub parent_id:   Option<Uuid>,
  pub content:     String,
  pub depth:       u32,
}
