//! Handlers for the comment endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/bookmarks/:id/comments` | Full forest; anonymous allowed |
//! | `POST`   | `/comments` | Body: [`CreateBody`]; returns 201 + node |
//! | `PUT`    | `/comments/:id` | Body: [`UpdateBody`]; author or moderator |
//! | `DELETE` | `/comments/:id` | Soft delete; returns 204 |
//! | `POST`   | `/comments/:id/restore` | Moderator only |
//! | `POST`   | `/comments/:id/vote` | Body: `{"kind":"LIKE"\|"DISLIKE"}` |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use marque_core::{
  engine::{CommentEngine, CreateComment},
  notify::NotificationSink,
  store::CommentStore,
  tree::CommentNode,
  vote::{VoteKind, VoteOutcome},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  error::ApiError,
  identity::{MaybeCaller, RequireCaller},
};

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /bookmarks/:id/comments`
pub async fn list_tree<S, N>(
  State(engine): State<Arc<CommentEngine<S, N>>>,
  Path(bookmark_id): Path<Uuid>,
  MaybeCaller(viewer): MaybeCaller,
) -> Result<Json<Vec<CommentNode>>, ApiError>
where
  S: CommentStore,
  N: NotificationSink,
{
  let forest = engine.list_tree(bookmark_id, viewer.as_ref()).await?;
  Ok(Json(forest))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /comments`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBody {
  pub content:     String,
  pub bookmark_id: Uuid,
  pub parent_id:   Option<Uuid>,
}

/// `POST /comments` — returns 201 + the created node.
pub async fn create<S, N>(
  State(engine): State<Arc<CommentEngine<S, N>>>,
  RequireCaller(caller): RequireCaller,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CommentStore,
  N: NotificationSink,
{
  let node = engine
    .create(&caller, CreateComment {
      bookmark_id: body.bookmark_id,
      parent_id:   body.parent_id,
      content:     body.content,
    })
    .await?;
  Ok((StatusCode::CREATED, Json(node)))
}

// ─── Update ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UpdateBody {
  pub content: String,
}

/// `PUT /comments/:id`
pub async fn update<S, N>(
  State(engine): State<Arc<CommentEngine<S, N>>>,
  Path(id): Path<Uuid>,
  RequireCaller(caller): RequireCaller,
  Json(body): Json<UpdateBody>,
) -> Result<Json<CommentNode>, ApiError>
where
  S: CommentStore,
  N: NotificationSink,
{
  let node = engine.update(&caller, id, &body.content).await?;
  Ok(Json(node))
}

// ─── Delete / restore ─────────────────────────────────────────────────────────

/// `DELETE /comments/:id` — soft delete; returns 204.
pub async fn delete<S, N>(
  State(engine): State<Arc<CommentEngine<S, N>>>,
  Path(id): Path<Uuid>,
  RequireCaller(caller): RequireCaller,
) -> Result<StatusCode, ApiError>
where
  S: CommentStore,
  N: NotificationSink,
{
  engine.delete(&caller, id).await?;
  Ok(StatusCode::NO_CONTENT)
}

/// `POST /comments/:id/restore` — moderator-only administrative path.
pub async fn restore<S, N>(
  State(engine): State<Arc<CommentEngine<S, N>>>,
  Path(id): Path<Uuid>,
  RequireCaller(caller): RequireCaller,
) -> Result<Json<CommentNode>, ApiError>
where
  S: CommentStore,
  N: NotificationSink,
{
  let node = engine.restore(&caller, id).await?;
  Ok(Json(node))
}

// ─── Vote ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct VoteBody {
  pub kind: VoteKind,
}

/// `POST /comments/:id/vote` — body: `{"kind":"LIKE"}` or `{"kind":"DISLIKE"}`.
pub async fn vote<S, N>(
  State(engine): State<Arc<CommentEngine<S, N>>>,
  Path(id): Path<Uuid>,
  RequireCaller(caller): RequireCaller,
  Json(body): Json<VoteBody>,
) -> Result<Json<VoteOutcome>, ApiError>
where
  S: CommentStore,
  N: NotificationSink,
{
  let outcome = engine.vote(&caller, id, body.kind).await?;
  Ok(Json(outcome))
}
