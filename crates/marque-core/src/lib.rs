//! Core types and trait definitions for the Marque comment engine.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod comment;
pub mod engine;
pub mod error;
pub mod mention;
pub mod moderation;
pub mod notify;
pub mod store;
pub mod tree;
pub mod vote;

pub use error::{Error, Result};
