//! SQLite backend for the Marque comment store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! pool without blocking the async runtime. Multi-row writes (create, soft
//! delete, restore, vote transitions) run inside a single SQLite transaction
//! on the store's one connection, which also serialises concurrent callers.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
