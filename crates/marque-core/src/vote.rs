//! Vote ledger types.
//!
//! A user holds at most one vote per comment. The ledger row is the sole
//! truth of whether and which way a user voted; the counters on the comment
//! row are derived from ledger transitions, never from client input.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which way a vote points. Serialised as `"LIKE"`/`"DISLIKE"` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VoteKind {
  Like,
  Dislike,
}

/// A ledger row — unique per `(user_id, comment_id)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vote {
  pub user_id:    Uuid,
  pub comment_id: Uuid,
  pub kind:       VoteKind,
  pub created_at: DateTime<Utc>,
}

// ─── Transition result ───────────────────────────────────────────────────────

/// What a single [`cast_vote`](crate::store::CommentStore::cast_vote)
/// transition did, with the post-transition counters.
///
/// `previous`/`current` distinguish the three transitions: a fresh vote
/// (`None` → `Some`), a toggle-off (`Some(k)` → `None`), and a flip
/// (`Some(k)` → `Some(k')`). Only a fresh like triggers a notification.
#[derive(Debug, Clone, Copy)]
pub struct VoteDelta {
  pub previous:      Option<VoteKind>,
  pub current:       Option<VoteKind>,
  pub like_count:    i64,
  pub dislike_count: i64,
}

/// The caller-facing result of a vote: current counters, the recomputed
/// score, and the caller's resulting vote (absent after a toggle-off).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteOutcome {
  pub like_count:    i64,
  pub dislike_count: i64,
  pub score:         i64,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub user_vote:     Option<VoteKind>,
}

impl From<VoteDelta> for VoteOutcome {
  fn from(d: VoteDelta) -> Self {
    VoteOutcome {
      like_count:    d.like_count,
      dislike_count: d.dislike_count,
      score:         d.like_count - d.dislike_count,
      user_vote:     d.current,
    }
  }
}
