//! The comment engine — the public-facing orchestrator.
//!
//! Combines the store, the moderation gate, the tree builder, and the
//! notification sink into the five operations the web layer calls. All
//! authorization and depth validation happens here, before any write reaches
//! the store; counter mutation happens only inside the store's transactional
//! operations.

use std::collections::HashMap;

use uuid::Uuid;

use crate::{
  Error, Result,
  comment::{Comment, DELETED_PLACEHOLDER, MAX_DEPTH, NewComment},
  mention::mention_tokens,
  moderation::{Caller, can_modify},
  notify::{NotificationEvent, NotificationSink},
  store::CommentStore,
  tree::{CommentNode, build_tree},
  vote::{VoteKind, VoteOutcome},
};

/// Input to [`CommentEngine::create`].
#[derive(Debug, Clone)]
pub struct CreateComment {
  pub bookmark_id: Uuid,
  pub parent_id:   Option<Uuid>,
  pub content:     String,
}

/// The public-facing comment service.
pub struct CommentEngine<S, N> {
  store: S,
  sink:  N,
}

impl<S, N> CommentEngine<S, N>
where
  S: CommentStore,
  N: NotificationSink,
{
  pub fn new(store: S, sink: N) -> Self {
    Self { store, sink }
  }

  /// Direct access to the underlying store, for wiring and tests.
  pub fn store(&self) -> &S {
    &self.store
  }

  // ── Reads ─────────────────────────────────────────────────────────────

  /// The full comment forest for a bookmark, annotated for `viewer`.
  pub async fn list_tree(
    &self,
    bookmark_id: Uuid,
    viewer: Option<&Caller>,
  ) -> Result<Vec<CommentNode>> {
    self
      .store
      .get_bookmark(bookmark_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::BookmarkNotFound(bookmark_id))?;

    let comments = self
      .store
      .list_comments(bookmark_id)
      .await
      .map_err(Error::store)?;

    let own_votes = match viewer {
      Some(caller) => self
        .store
        .votes_by_user(bookmark_id, caller.user_id)
        .await
        .map_err(Error::store)?,
      None => HashMap::new(),
    };

    Ok(build_tree(&comments, viewer.map(|c| c.user_id), &own_votes))
  }

  // ── Writes ────────────────────────────────────────────────────────────

  /// Post a new comment (top-level or reply) and fire the resulting
  /// notifications.
  pub async fn create(&self, caller: &Caller, input: CreateComment) -> Result<CommentNode> {
    let bookmark = self
      .store
      .get_bookmark(input.bookmark_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::BookmarkNotFound(input.bookmark_id))?;

    let parent = match input.parent_id {
      Some(parent_id) => Some(
        self
          .store
          .get_comment(parent_id)
          .await
          .map_err(Error::store)?
          .ok_or(Error::CommentNotFound(parent_id))?,
      ),
      None => None,
    };

    let depth = match &parent {
      Some(p) => p.depth + 1,
      None => 0,
    };
    if depth > MAX_DEPTH {
      return Err(Error::DepthExceeded { max: MAX_DEPTH });
    }

    // The caller's identity row must exist before the author FK is written.
    self
      .store
      .upsert_user(caller.user_id, &caller.username)
      .await
      .map_err(Error::store)?;

    let comment = self
      .store
      .create_comment(NewComment {
        bookmark_id: input.bookmark_id,
        author_id:   caller.user_id,
        parent_id:   input.parent_id,
        content:     input.content,
        depth,
      })
      .await
      .map_err(Error::store)?;

    match &parent {
      // Replies notify the parent author, unless the parent is deleted.
      Some(p) if !p.deleted => {
        self
          .dispatch(p.author_id, caller.user_id, NotificationEvent::Replied {
            bookmark_id: comment.bookmark_id,
            comment_id:  comment.comment_id,
          })
          .await;
      }
      Some(_) => {}
      // Top-level comments notify the bookmark owner.
      None => {
        self
          .dispatch(bookmark.owner_id, caller.user_id, NotificationEvent::Commented {
            bookmark_id: comment.bookmark_id,
            comment_id:  comment.comment_id,
          })
          .await;
      }
    }

    self.notify_mentions(caller, &comment).await;

    let parent_username = parent.as_ref().map(parent_label);
    Ok(CommentNode::single(
      &comment,
      Some(caller.user_id),
      None,
      parent_username,
    ))
  }

  /// Edit a comment's content. Authors and moderators only; deleted
  /// comments are not editable.
  pub async fn update(&self, caller: &Caller, id: Uuid, content: &str) -> Result<CommentNode> {
    let existing = self.require_comment(id).await?;
    if !can_modify(caller, &existing) {
      return Err(Error::Forbidden(id));
    }
    if existing.deleted {
      return Err(Error::CommentDeleted(id));
    }

    let updated = self
      .store
      .update_comment(id, content)
      .await
      .map_err(Error::store)?;

    self.node_for(caller, updated).await
  }

  /// Soft-delete a comment. Authors and moderators only. Replies stay in
  /// place and render under the placeholder.
  pub async fn delete(&self, caller: &Caller, id: Uuid) -> Result<()> {
    let existing = self.require_comment(id).await?;
    if !can_modify(caller, &existing) {
      return Err(Error::Forbidden(id));
    }
    if existing.deleted {
      return Err(Error::CommentDeleted(id));
    }

    self
      .store
      .soft_delete_comment(id)
      .await
      .map_err(Error::store)
  }

  /// Undo a soft delete. Administrative path: moderators only, regardless
  /// of authorship.
  pub async fn restore(&self, caller: &Caller, id: Uuid) -> Result<CommentNode> {
    if !caller.moderator {
      return Err(Error::Forbidden(id));
    }
    let existing = self.require_comment(id).await?;
    if !existing.deleted {
      return Err(Error::NotDeleted(id));
    }

    let restored = self
      .store
      .restore_comment(id)
      .await
      .map_err(Error::store)?;

    self.node_for(caller, restored).await
  }

  /// Cast, toggle off, or flip the caller's vote on a comment. A fresh like
  /// notifies the comment author; toggles and flips never do.
  pub async fn vote(&self, caller: &Caller, id: Uuid, kind: VoteKind) -> Result<VoteOutcome> {
    let comment = self.require_comment(id).await?;

    self
      .store
      .upsert_user(caller.user_id, &caller.username)
      .await
      .map_err(Error::store)?;

    let delta = self
      .store
      .cast_vote(id, caller.user_id, kind)
      .await
      .map_err(Error::store)?;

    if delta.previous.is_none() && delta.current == Some(VoteKind::Like) {
      self
        .dispatch(comment.author_id, caller.user_id, NotificationEvent::Liked {
          comment_id: id,
        })
        .await;
    }

    Ok(VoteOutcome::from(delta))
  }

  // ── Internals ─────────────────────────────────────────────────────────

  async fn require_comment(&self, id: Uuid) -> Result<Comment> {
    self
      .store
      .get_comment(id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::CommentNotFound(id))
  }

  /// Build the single-node response shape for a freshly written comment.
  async fn node_for(&self, caller: &Caller, comment: Comment) -> Result<CommentNode> {
    let parent_username = match comment.parent_id {
      Some(parent_id) => self
        .store
        .get_comment(parent_id)
        .await
        .map_err(Error::store)?
        .as_ref()
        .map(parent_label),
      None => None,
    };

    let user_vote = self
      .store
      .get_vote(comment.comment_id, caller.user_id)
      .await
      .map_err(Error::store)?;

    Ok(CommentNode::single(
      &comment,
      Some(caller.user_id),
      user_vote,
      parent_username,
    ))
  }

  /// Resolve `@username` tokens and notify each mentioned user. Unknown
  /// usernames are skipped; self-mentions die in [`Self::dispatch`]. The
  /// comment is already committed when this runs, so resolution failures
  /// are logged and swallowed like any other notification failure.
  async fn notify_mentions(&self, caller: &Caller, comment: &Comment) {
    for token in mention_tokens(&comment.content) {
      let user = match self.store.resolve_username(token).await {
        Ok(Some(user)) => user,
        Ok(None) => continue,
        Err(e) => {
          tracing::warn!(token, error = %e, "mention resolution failed");
          continue;
        }
      };
      self
        .dispatch(user.user_id, caller.user_id, NotificationEvent::Mentioned {
          bookmark_id: comment.bookmark_id,
          comment_id:  comment.comment_id,
        })
        .await;
    }
  }

  /// Fire one notification. Self-notification is suppressed here, for every
  /// trigger; sink failures are logged and swallowed so they never roll
  /// back the primary write.
  async fn dispatch(&self, recipient: Uuid, actor: Uuid, event: NotificationEvent) {
    if recipient == actor {
      return;
    }
    if let Err(e) = self.sink.notify(recipient, actor, event).await {
      tracing::warn!(%recipient, error = %e, ?event, "notification dispatch failed");
    }
  }
}

/// The parent-author label shown on single-node responses: the username, or
/// the placeholder if the parent is soft-deleted.
fn parent_label(parent: &Comment) -> String {
  if parent.deleted {
    DELETED_PLACEHOLDER.to_string()
  } else {
    parent.author_name.clone()
  }
}
