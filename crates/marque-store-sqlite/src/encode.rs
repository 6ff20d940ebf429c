//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. UUIDs are stored as
//! hyphenated lowercase strings. Vote kinds are stored as their lowercase
//! names.

use chrono::{DateTime, Utc};
use marque_core::{
  comment::{Bookmark, Comment},
  vote::VoteKind,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── VoteKind ─────────────────────────────────────────────────────────────────

pub fn encode_vote_kind(k: VoteKind) -> &'static str {
  match k {
    VoteKind::Like => "like",
    VoteKind::Dislike => "dislike",
  }
}

pub fn decode_vote_kind(s: &str) -> Result<VoteKind> {
  match s {
    "like" => Ok(VoteKind::Like),
    "dislike" => Ok(VoteKind::Dislike),
    other => Err(Error::UnknownVoteKind(other.to_string())),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `comments` row joined with the author's
/// `users` row.
pub struct RawComment {
  pub comment_id:       String,
  pub bookmark_id:      String,
  pub author_id:        String,
  pub author_name:      String,
  pub parent_id:        Option<String>,
  pub content:          String,
  pub original_content: Option<String>,
  pub depth:            i64,
  pub like_count:       i64,
  pub dislike_count:    i64,
  pub deleted:          bool,
  pub edited:           bool,
  pub created_at:       String,
  pub updated_at:       Option<String>,
}

impl RawComment {
  pub fn into_comment(self) -> Result<Comment> {
    Ok(Comment {
      comment_id:       decode_uuid(&self.comment_id)?,
      bookmark_id:      decode_uuid(&self.bookmark_id)?,
      author_id:        decode_uuid(&self.author_id)?,
      author_name:      self.author_name,
      parent_id:        self.parent_id.as_deref().map(decode_uuid).transpose()?,
      content:          self.content,
      original_content: self.original_content,
      depth:            self.depth as u32,
      like_count:       self.like_count,
      dislike_count:    self.dislike_count,
      deleted:          self.deleted,
      edited:           self.edited,
      created_at:       decode_dt(&self.created_at)?,
      updated_at:       self.updated_at.as_deref().map(decode_dt).transpose()?,
    })
  }
}

/// Raw strings read directly from a `bookmarks` row.
pub struct RawBookmark {
  pub bookmark_id:   String,
  pub owner_id:      String,
  pub comment_count: i64,
  pub created_at:    String,
}

impl RawBookmark {
  pub fn into_bookmark(self) -> Result<Bookmark> {
    Ok(Bookmark {
      bookmark_id:   decode_uuid(&self.bookmark_id)?,
      owner_id:      decode_uuid(&self.owner_id)?,
      comment_count: self.comment_count,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}
