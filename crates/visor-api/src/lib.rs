//! JSON REST API for Visor.
//!
//! Exposes an axum [`Router`] backed by any
//! [`visor_core::store::VisibilityStore`]. All computation is delegated to
//! `visor-engine`; all I/O to the store. Auth, TLS, and transport concerns
//! are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", visor_api::api_router(context.clone()))
//! ```

pub mod associations;
pub mod error;
pub mod facts;
pub mod prompts;
pub mod reports;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post, put},
};
use visor_core::{EngineConfig, store::VisibilityStore};
use visor_engine::MentionExtractor;

pub use error::ApiError;

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
pub struct ApiContext<S> {
  pub store:     Arc<S>,
  pub engine:    EngineConfig,
  /// Compiled mention patterns, built once and reused across requests.
  pub extractor: MentionExtractor,
}

impl<S> ApiContext<S> {
  pub fn new(store: Arc<S>, engine: EngineConfig) -> Self {
    Self { store, engine, extractor: MentionExtractor::new() }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `context`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(context: Arc<ApiContext<S>>) -> Router<()>
where
  S: VisibilityStore + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  Router::new()
    // Prompt ingest
    .route("/prompts", post(prompts::upsert::<S>))
    // SERP keywords
    .route(
      "/projects/{id}/serp/keywords",
      get(associations::list_keywords::<S>)
        .post(associations::import_keywords::<S>),
    )
    .route("/projects/{id}/serp/summary", get(reports::serp_summary::<S>))
    // Associations
    .route("/projects/{id}/associations", get(associations::list::<S>))
    .route(
      "/projects/{id}/associations/resolve",
      post(associations::resolve_project::<S>),
    )
    .route(
      "/projects/{id}/associations/accept-high",
      post(associations::accept_high::<S>),
    )
    .route("/prompts/{id}/association", put(associations::set_manual::<S>))
    // Answer facts
    .route("/facts/extract", post(facts::extract::<S>))
    .route("/facts", post(facts::create::<S>))
    // Derived reports
    .route("/projects/{id}/gaps", get(reports::gaps::<S>))
    .route("/projects/{id}/correlation", post(reports::correlation::<S>))
    .with_state(context)
}

// ─── Integration tests ────────────────────────────────────────────────────────
