//! The moderation gate — who may edit, delete, or restore a comment.
//!
//! Identity is threaded explicitly into every engine call; there is no
//! ambient "current user". The moderator flag is supplied by the caller's
//! web layer and grants override on actions regardless of authorship.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::comment::Comment;

/// The resolved identity of the calling user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Caller {
  pub user_id:   Uuid,
  pub username:  String,
  pub moderator: bool,
}

/// Whether `caller` may edit or soft-delete `comment`: moderators always,
/// everyone else only their own comments.
pub fn can_modify(caller: &Caller, comment: &Comment) -> bool {
  caller.moderator || caller.user_id == comment.author_id
}
