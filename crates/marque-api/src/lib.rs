//! JSON REST API for the Marque comment engine.
//!
//! Exposes an axum [`Router`] backed by a [`CommentEngine`] over any
//! [`CommentStore`]. Authentication, TLS, and transport concerns are the
//! caller's responsibility; the resolved identity arrives as trusted headers
//! (see [`identity`]).
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", marque_api::api_router(engine.clone()))
//! ```

pub mod comments;
pub mod error;
pub mod identity;
pub mod sink;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{delete, get, post, put},
};
use marque_core::{engine::CommentEngine, notify::NotificationSink, store::CommentStore};
use serde::Deserialize;

pub use error::ApiError;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `engine`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, N>(engine: Arc<CommentEngine<S, N>>) -> Router<()>
where
  S: CommentStore + 'static,
  N: NotificationSink + 'static,
{
  Router::new()
    .route("/bookmarks/{id}/comments", get(comments::list_tree::<S, N>))
    .route("/comments", post(comments::create::<S, N>))
    .route("/comments/{id}", put(comments::update::<S, N>))
    .route("/comments/{id}", delete(comments::delete::<S, N>))
    .route("/comments/{id}/restore", post(comments::restore::<S, N>))
    .route("/comments/{id}/vote", post(comments::vote::<S, N>))
    .with_state(engine)
}

// ─── Integration tests ────────────────────────────────────────────────────────
