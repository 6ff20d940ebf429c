//! The tree builder — turns the flat per-bookmark comment list into a nested
//! response forest.
//!
//! The builder is pure: it operates on a snapshot already fetched from the
//! store and needs no locking. The input list arrives ordered by creation
//! time ascending; that order is preserved at every level and never
//! re-sorted.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  comment::{Comment, DELETED_PLACEHOLDER},
  vote::VoteKind,
};

// ─── Node ────────────────────────────────────────────────────────────────────

/// One comment in the response forest, annotated for the viewing user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentNode {
  pub comment_id:      Uuid,
  pub bookmark_id:     Uuid,
  pub author_id:       Uuid,
  pub author_name:     String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub parent_id:       Option<Uuid>,
  /// The parent author's username, `"[deleted]"` if the parent is
  /// soft-deleted, absent for top-level comments.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub parent_username: Option<String>,
  pub content:         String,
  pub depth:           u32,
  pub like_count:      i64,
  pub dislike_count:   i64,
  /// Always `like_count - dislike_count`, recomputed at response time.
  pub score:           i64,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub user_vote:       Option<VoteKind>,
  /// Count of ALL strict descendants, not just direct replies.
  pub reply_count:     usize,
  pub can_edit:        bool,
  pub can_delete:      bool,
  pub deleted:         bool,
  pub edited:          bool,
  pub created_at:      DateTime<Utc>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub updated_at:      Option<DateTime<Utc>>,
  pub replies:         Vec<CommentNode>,
}

impl CommentNode {
  /// Build a node for a single comment, with no replies attached.
  ///
  /// `can_edit`/`can_delete` reflect display-time policy only: the viewer
  /// must be the author and the comment must not be deleted. Moderator
  /// override is applied when the action itself is invoked, not here.
  pub fn single(
    comment:         &Comment,
    viewer:          Option<Uuid>,
    user_vote:       Option<VoteKind>,
    parent_username: Option<String>,
  ) -> Self {
    let own = !comment.deleted && viewer == Some(comment.author_id);
    CommentNode {
      comment_id:      comment.comment_id,
      bookmark_id:     comment.bookmark_id,
      author_id:       comment.author_id,
      author_name:     comment.author_name.clone(),
      parent_id:       comment.parent_id,
      parent_username,
      content:         comment.content.clone(),
      depth:           comment.depth,
      like_count:      comment.like_count,
      dislike_count:   comment.dislike_count,
      score:           comment.like_count - comment.dislike_count,
      user_vote,
      reply_count:     0,
      can_edit:        own,
      can_delete:      own,
      deleted:         comment.deleted,
      edited:          comment.edited,
      created_at:      comment.created_at,
      updated_at:      comment.updated_at,
      replies:         Vec::new(),
    }
  }
}

// ─── Builder ─────────────────────────────────────────────────────────────────

/// The label shown on a reply whose parent is soft-deleted, and the parent
/// author's username otherwise. `None` when the comment has no parent or the
/// parent is not in the snapshot.
fn parent_label(comment: &Comment, by_id: &HashMap<Uuid, &Comment>) -> Option<String> {
  let parent = comment.parent_id.and_then(|pid| by_id.get(&pid))?;
  if parent.deleted {
    Some(DELETED_PLACEHOLDER.to_string())
  } else {
    Some(parent.author_name.clone())
  }
}

fn expand(
  comment:   &Comment,
  children:  &HashMap<Uuid, Vec<&Comment>>,
  by_id:     &HashMap<Uuid, &Comment>,
  viewer:    Option<Uuid>,
  own_votes: &HashMap<Uuid, VoteKind>,
) -> CommentNode {
  let mut node = CommentNode::single(
    comment,
    viewer,
    own_votes.get(&comment.comment_id).copied(),
    parent_label(comment, by_id),
  );

  if let Some(direct) = children.get(&comment.comment_id) {
    node.replies = direct
      .iter()
      .map(|c| expand(c, children, by_id, viewer, own_votes))
      .collect();
    // Each direct reply contributes itself plus its own descendants.
    node.reply_count = node.replies.iter().map(|n| n.reply_count + 1).sum();
  }

  node
}

/// Convert a flat, creation-ordered comment list into an ordered forest.
///
/// A single pass partitions comments into roots and a parent-id → children
/// index; each root is then expanded depth-first. O(n) in the list length
/// regardless of tree shape.
pub fn build_tree(
  comments:  &[Comment],
  viewer:    Option<Uuid>,
  own_votes: &HashMap<Uuid, VoteKind>,
) -> Vec<CommentNode> {
  let mut by_id: HashMap<Uuid, &Comment> = HashMap::with_capacity(comments.len());
  let mut children: HashMap<Uuid, Vec<&Comment>> = HashMap::new();
  let mut roots: Vec<&Comment> = Vec::new();

  for c in comments {
    by_id.insert(c.comment_id, c);
    match c.parent_id {
      Some(parent_id) => children.entry(parent_id).or_default().push(c),
      None => roots.push(c),
    }
  }

  roots
    .iter()
    .map(|c| expand(c, &children, &by_id, viewer, own_votes))
    .collect()
}

// ─── Tests ───────────────────────────────────────────────────────────────────
