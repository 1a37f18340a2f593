//! The `VisibilityStore` trait and supporting types.
//!
//! The engine itself owns no durable storage: it reads prompts, keywords,
//! and facts through this abstraction and hands intended writes back to it.
//! Implemented by storage backends (e.g. `visor-store-sqlite`); higher
//! layers depend on this trait, not on any concrete backend.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  association::{Association, NewAssociation},
  fact::{AiAnswerFact, NewAnswerFact},
  keyword::{NewSerpKeyword, SerpKeyword},
  prompt::Prompt,
};

/// Abstraction over a Visor storage backend.
///
/// Facts are append-only; keyword imports supersede the previous generation
/// rather than mutating it; association writes are atomic upserts keyed by
/// `prompt_id` (this is the single-writer guarantee the resolver relies on —
/// two concurrent resolution passes cannot both claim a prompt).
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait VisibilityStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Prompts ───────────────────────────────────────────────────────────

  /// Create or replace a prompt, keyed by `prompt_id`.
  fn upsert_prompt(
    &self,
    prompt: Prompt,
  ) -> impl Future<Output = Result<Prompt, Self::Error>> + Send + '_;

  /// Retrieve a prompt by id. Returns `None` if not found.
  fn get_prompt(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Prompt>, Self::Error>> + Send + '_;

  /// List all prompts belonging to a project.
  fn list_prompts(
    &self,
    project_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Prompt>, Self::Error>> + Send + '_;

  // ── SERP keywords ─────────────────────────────────────────────────────

  /// Import a keyword batch for a project, superseding the previous
  /// generation atomically. Ids and timestamps are store-assigned.
  fn import_keywords(
    &self,
    project_id: Uuid,
    batch: Vec<NewSerpKeyword>,
  ) -> impl Future<Output = Result<Vec<SerpKeyword>, Self::Error>> + Send + '_;

  /// List the active keyword generation for a project.
  fn list_keywords(
    &self,
    project_id: Uuid,
  ) -> impl Future<Output = Result<Vec<SerpKeyword>, Self::Error>> + Send + '_;

  // ── Associations ──────────────────────────────────────────────────────

  /// Atomically create or replace the association for
  /// `association.prompt_id` and return the persisted row.
  fn upsert_association(
    &self,
    association: NewAssociation,
  ) -> impl Future<Output = Result<Association, Self::Error>> + Send + '_;

  /// Remove a prompt's association. Returns `true` if one existed.
  fn delete_association(
    &self,
    prompt_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// List all associations for a project's prompts.
  fn list_associations(
    &self,
    project_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Association>, Self::Error>> + Send + '_;

  // ── Answer facts — append-only writes ─────────────────────────────────

  /// Record a new answer fact and return it with its assigned id and
  /// timestamp. Facts are never updated or deleted.
  fn record_fact(
    &self,
    input: NewAnswerFact,
  ) -> impl Future<Output = Result<AiAnswerFact, Self::Error>> + Send + '_;

  /// List a project's facts, oldest first, optionally bounded below by
  /// `since`.
  fn list_facts(
    &self,
    project_id: Uuid,
    since: Option<DateTime<Utc>>,
  ) -> impl Future<Output = Result<Vec<AiAnswerFact>, Self::Error>> + Send + '_;
}
