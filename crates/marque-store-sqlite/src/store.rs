//! [`SqliteStore`] — the SQLite implementation of [`CommentStore`].

use std::{collections::HashMap, path::Path};

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use marque_core::{
  comment::{Bookmark, Comment, DELETED_PLACEHOLDER, NewComment, UserRef},
  store::CommentStore,
  vote::{VoteDelta, VoteKind},
};

use crate::{
  Error, Result,
  encode::{
    RawBookmark, RawComment, decode_uuid, decode_vote_kind, encode_dt, encode_uuid,
    encode_vote_kind,
  },
  schema::SCHEMA,
};

/// Columns of a comment row, with the author's username joined in.
const COMMENT_SELECT: &str = "
  SELECT c.comment_id, c.bookmark_id, c.author_id, u.username, c.parent_id,
         c.content, c.original_content, c.depth, c.like_count, c.dislike_count,
         c.deleted, c.edited, c.created_at, c.updated_at
  FROM comments c
  JOIN users u ON u.user_id = c.author_id";

fn raw_comment(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawComment> {
  Ok(RawComment {
    comment_id:       row.get(0)?,
    bookmark_id:      row.get(1)?,
    author_id:        row.get(2)?,
    author_name:      row.get(3)?,
    parent_id:        row.get(4)?,
    content:          row.get(5)?,
    original_content: row.get(6)?,
    depth:            row.get(7)?,
    like_count:       row.get(8)?,
    dislike_count:    row.get(9)?,
    deleted:          row.get(10)?,
    edited:           row.get(11)?,
    created_at:       row.get(12)?,
    updated_at:       row.get(13)?,
  })
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Marque comment store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Fetch one comment row by id.
  async fn select_comment(&self, id: Uuid) -> Result<Option<Comment>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawComment> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("{COMMENT_SELECT} WHERE c.comment_id = ?1"),
              rusqlite::params![id_str],
              raw_comment,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawComment::into_comment).transpose()
  }
}

// ─── CommentStore impl ───────────────────────────────────────────────────────

impl CommentStore for SqliteStore {
  type Error = Error;

  // ── Identity / container mirrors ──────────────────────────────────────────

  async fn upsert_user(&self, user_id: Uuid, username: &str) -> Result<UserRef> {
    let id_str = encode_uuid(user_id);
    let name = username.to_owned();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO users (user_id, username) VALUES (?1, ?2)
           ON CONFLICT(user_id) DO UPDATE SET username = excluded.username",
          rusqlite::params![id_str, name],
        )?;
        Ok(())
      })
      .await?;

    Ok(UserRef { user_id, username: username.to_owned() })
  }

  async fn resolve_username(&self, username: &str) -> Result<Option<UserRef>> {
    let name = username.to_owned();

    let id_str: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT user_id FROM users WHERE username = ?1",
              rusqlite::params![name],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;

    Ok(match id_str {
      Some(s) => Some(UserRef {
        user_id:  decode_uuid(&s)?,
        username: username.to_owned(),
      }),
      None => None,
    })
  }

  async fn add_bookmark(&self, owner_id: Uuid) -> Result<Bookmark> {
    let bookmark = Bookmark {
      bookmark_id:   Uuid::new_v4(),
      owner_id,
      comment_count: 0,
      created_at:    Utc::now(),
    };

    let id_str    = encode_uuid(bookmark.bookmark_id);
    let owner_str = encode_uuid(owner_id);
    let at_str    = encode_dt(bookmark.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO bookmarks (bookmark_id, owner_id, comment_count, created_at)
           VALUES (?1, ?2, 0, ?3)",
          rusqlite::params![id_str, owner_str, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(bookmark)
  }

  async fn get_bookmark(&self, id: Uuid) -> Result<Option<Bookmark>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawBookmark> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT bookmark_id, owner_id, comment_count, created_at
               FROM bookmarks WHERE bookmark_id = ?1",
              rusqlite::params![id_str],
              |row| {
                Ok(RawBookmark {
                  bookmark_id:   row.get(0)?,
                  owner_id:      row.get(1)?,
                  comment_count: row.get(2)?,
                  created_at:    row.get(3)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawBookmark::into_bookmark).transpose()
  }

  // ── Comments ──────────────────────────────────────────────────────────────

  async fn get_comment(&self, id: Uuid) -> Result<Option<Comment>> {
    self.select_comment(id).await
  }

  async fn list_comments(&self, bookmark_id: Uuid) -> Result<Vec<Comment>> {
    let id_str = encode_uuid(bookmark_id);

    let raws: Vec<RawComment> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          // rowid breaks creation-time ties so insertion order is stable.
          "{COMMENT_SELECT} WHERE c.bookmark_id = ?1
           ORDER BY c.created_at ASC, c.rowid ASC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], raw_comment)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawComment::into_comment).collect()
  }

  async fn create_comment(&self, input: NewComment) -> Result<Comment> {
    let comment_id = Uuid::new_v4();
    let created_at = Utc::now();

    let id_str       = encode_uuid(comment_id);
    let bookmark_str = encode_uuid(input.bookmark_id);
    let author_str   = encode_uuid(input.author_id);
    let parent_str   = input.parent_id.map(encode_uuid);
    let content      = input.content.clone();
    let depth        = input.depth as i64;
    let at_str       = encode_dt(created_at);

    let author_name: String = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO comments (
             comment_id, bookmark_id, author_id, parent_id, content,
             depth, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![id_str, bookmark_str, author_str, parent_str, content, depth, at_str],
        )?;
        tx.execute(
          "UPDATE bookmarks SET comment_count = comment_count + 1 WHERE bookmark_id = ?1",
          rusqlite::params![bookmark_str],
        )?;
        let author_name: String = tx.query_row(
          "SELECT username FROM users WHERE user_id = ?1",
          rusqlite::params![author_str],
          |row| row.get(0),
        )?;
        tx.commit()?;
        Ok(author_name)
      })
      .await?;

    Ok(Comment {
      comment_id,
      bookmark_id:      input.bookmark_id,
      author_id:        input.author_id,
      author_name,
      parent_id:        input.parent_id,
      content:          input.content,
      original_content: None,
      depth:            input.depth,
      like_count:       0,
      dislike_count:    0,
      deleted:          false,
      edited:           false,
      created_at,
      updated_at:       None,
    })
  }

  async fn update_comment(&self, id: Uuid, content: &str) -> Result<Comment> {
    let id_str      = encode_uuid(id);
    let new_content = content.to_owned();
    let at_str      = encode_dt(Utc::now());

    // Some(true) = row updated; Some(false) = row exists but is deleted;
    // None = no such row. The deleted guard lives in the UPDATE itself so a
    // concurrent soft delete can never be overwritten.
    let updated: Option<bool> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let changed = tx.execute(
          "UPDATE comments SET content = ?2, edited = 1, updated_at = ?3
           WHERE comment_id = ?1 AND deleted = 0",
          rusqlite::params![id_str, new_content, at_str],
        )?;
        let state = if changed > 0 {
          Some(true)
        } else {
          tx.query_row(
              "SELECT 1 FROM comments WHERE comment_id = ?1",
              rusqlite::params![id_str],
              |_| Ok(false),
            )
            .optional()?
        };
        tx.commit()?;
        Ok(state)
      })
      .await?;

    match updated {
      Some(true) => {}
      Some(false) => return Err(Error::CommentDeleted(id)),
      None => return Err(Error::CommentNotFound(id)),
    }

    self
      .select_comment(id)
      .await?
      .ok_or(Error::CommentNotFound(id))
  }

  async fn soft_delete_comment(&self, id: Uuid) -> Result<()> {
    let id_str = encode_uuid(id);

    let deleted: bool = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let updated = tx.execute(
          "UPDATE comments
           SET original_content = content, content = ?2, deleted = 1
           WHERE comment_id = ?1 AND deleted = 0",
          rusqlite::params![id_str, DELETED_PLACEHOLDER],
        )?;
        if updated == 0 {
          return Ok(false);
        }
        tx.execute(
          "UPDATE bookmarks SET comment_count = MAX(comment_count - 1, 0)
           WHERE bookmark_id = (SELECT bookmark_id FROM comments WHERE comment_id = ?1)",
          rusqlite::params![id_str],
        )?;
        tx.commit()?;
        Ok(true)
      })
      .await?;

    if !deleted {
      return Err(Error::CommentNotFound(id));
    }
    Ok(())
  }

  async fn restore_comment(&self, id: Uuid) -> Result<Comment> {
    let id_str = encode_uuid(id);

    let restored: bool = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let updated = tx.execute(
          "UPDATE comments
           SET content = COALESCE(original_content, content),
               original_content = NULL, deleted = 0
           WHERE comment_id = ?1 AND deleted = 1",
          rusqlite::params![id_str],
        )?;
        if updated == 0 {
          return Ok(false);
        }
        tx.execute(
          "UPDATE bookmarks SET comment_count = comment_count + 1
           WHERE bookmark_id = (SELECT bookmark_id FROM comments WHERE comment_id = ?1)",
          rusqlite::params![id_str],
        )?;
        tx.commit()?;
        Ok(true)
      })
      .await?;

    if !restored {
      return Err(Error::CommentNotFound(id));
    }

    self
      .select_comment(id)
      .await?
      .ok_or(Error::CommentNotFound(id))
  }

  // ── Vote ledger ───────────────────────────────────────────────────────────

  async fn cast_vote(&self, comment_id: Uuid, user_id: Uuid, kind: VoteKind) -> Result<VoteDelta> {
    let comment_str = encode_uuid(comment_id);
    let user_str    = encode_uuid(user_id);
    let kind_str    = encode_vote_kind(kind);
    let at_str      = encode_dt(Utc::now());

    // (previous kind, like_count, dislike_count) after the transition, or
    // None if the comment does not exist.
    let row: Option<(Option<String>, i64, i64)> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let exists: bool = tx
          .query_row(
            "SELECT 1 FROM comments WHERE comment_id = ?1",
            rusqlite::params![comment_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if !exists {
          return Ok(None);
        }

        let previous: Option<String> = tx
          .query_row(
            "SELECT kind FROM votes WHERE user_id = ?1 AND comment_id = ?2",
            rusqlite::params![user_str, comment_str],
            |row| row.get(0),
          )
          .optional()?;

        let bump = |tx: &rusqlite::Transaction<'_>, kind: &str, delta: i64| {
          let sql = match kind {
            "like" => "UPDATE comments SET like_count = like_count + ?2 WHERE comment_id = ?1",
            _ => "UPDATE comments SET dislike_count = dislike_count + ?2 WHERE comment_id = ?1",
          };
          tx.execute(sql, rusqlite::params![comment_str, delta])
        };

        match previous.as_deref() {
          // First vote: record it and bump the matching counter.
          None => {
            tx.execute(
              "INSERT INTO votes (user_id, comment_id, kind, created_at)
               VALUES (?1, ?2, ?3, ?4)",
              rusqlite::params![user_str, comment_str, kind_str, at_str],
            )?;
            bump(&tx, kind_str, 1)?;
          }
          // Same kind again: toggle off.
          Some(prev) if prev == kind_str => {
            tx.execute(
              "DELETE FROM votes WHERE user_id = ?1 AND comment_id = ?2",
              rusqlite::params![user_str, comment_str],
            )?;
            bump(&tx, kind_str, -1)?;
          }
          // Opposite kind: flip in place; the counter sum is unchanged.
          Some(prev) => {
            let prev = prev.to_owned();
            tx.execute(
              "UPDATE votes SET kind = ?3 WHERE user_id = ?1 AND comment_id = ?2",
              rusqlite::params![user_str, comment_str, kind_str],
            )?;
            bump(&tx, &prev, -1)?;
            bump(&tx, kind_str, 1)?;
          }
        }

        let (like_count, dislike_count): (i64, i64) = tx.query_row(
          "SELECT like_count, dislike_count FROM comments WHERE comment_id = ?1",
          rusqlite::params![comment_str],
          |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        tx.commit()?;
        Ok(Some((previous, like_count, dislike_count)))
      })
      .await?;

    let (previous_str, like_count, dislike_count) =
      row.ok_or(Error::CommentNotFound(comment_id))?;

    let previous = previous_str.as_deref().map(decode_vote_kind).transpose()?;
    let current = match previous {
      Some(prev) if prev == kind => None, // toggled off
      _ => Some(kind),
    };

    Ok(VoteDelta { previous, current, like_count, dislike_count })
  }

  async fn get_vote(&self, comment_id: Uuid, user_id: Uuid) -> Result<Option<VoteKind>> {
    let comment_str = encode_uuid(comment_id);
    let user_str    = encode_uuid(user_id);

    let kind_str: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT kind FROM votes WHERE user_id = ?1 AND comment_id = ?2",
              rusqlite::params![user_str, comment_str],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;

    kind_str.as_deref().map(decode_vote_kind).transpose()
  }

  async fn votes_by_user(
    &self,
    bookmark_id: Uuid,
    user_id: Uuid,
  ) -> Result<HashMap<Uuid, VoteKind>> {
    let bookmark_str = encode_uuid(bookmark_id);
    let user_str     = encode_uuid(user_id);

    let rows: Vec<(String, String)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT v.comment_id, v.kind
           FROM votes v
           JOIN comments c ON c.comment_id = v.comment_id
           WHERE c.bookmark_id = ?1 AND v.user_id = ?2",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![bookmark_str, user_str], |row| {
            Ok((row.get(0)?, row.get(1)?))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    rows
      .into_iter()
      .map(|(id, kind)| Ok((decode_uuid(&id)?, decode_vote_kind(&kind)?)))
      .collect()
  }
}
