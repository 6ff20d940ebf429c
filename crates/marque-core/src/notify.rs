//! Notification events and the fire-and-forget sink trait.
//!
//! Delivery and storage mechanics live behind [`NotificationSink`]; the
//! engine only decides who to notify about what. Dispatch failures never
//! roll back the primary write — the engine logs and swallows them.

use std::future::Future;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What happened. Each event names the comment that triggered it so a sink
/// can link back to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NotificationEvent {
  /// A top-level comment was posted on a bookmark you own.
  Commented { bookmark_id: Uuid, comment_id: Uuid },
  /// Someone replied to your comment.
  Replied { bookmark_id: Uuid, comment_id: Uuid },
  /// You were `@`-mentioned in a comment.
  Mentioned { bookmark_id: Uuid, comment_id: Uuid },
  /// Your comment received a fresh like. Dislikes and flips never notify.
  Liked { comment_id: Uuid },
}

/// Abstraction over a notification backend.
///
/// Implementations must be best-effort: the engine treats any error as
/// non-fatal. `recipient` never equals `actor` — self-notification is
/// suppressed before dispatch.
pub trait NotificationSink: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn notify(
    &self,
    recipient: Uuid,
    actor: Uuid,
    event: NotificationEvent,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
