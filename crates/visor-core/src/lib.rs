//! Core types and trait definitions for the Visor visibility engine.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod association;
pub mod config;
pub mod error;
pub mod fact;
pub mod keyword;
pub mod prompt;
pub mod report;
pub mod store;

pub use config::EngineConfig;
pub use error::{Error, Result};
