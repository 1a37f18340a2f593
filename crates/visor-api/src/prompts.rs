//! Handler for `POST /prompts`.
//!
//! The minimal ingest surface for prompt templates. The surrounding
//! application owns the rest of the prompt lifecycle; the engine only needs
//! templates to exist before it can match them.

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Deserialize;
use uuid::Uuid;
use visor_core::{prompt::Prompt, store::VisibilityStore};

use crate::{ApiContext, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct UpsertPromptBody {
  /// Omit to create with a fresh id; provide to replace an existing prompt.
  pub prompt_id:  Option<Uuid>,
  pub project_id: Uuid,
  pub name:       String,
  pub template:   String,
  #[serde(default)]
  pub tags:       Vec<String>,
  #[serde(default = "default_active")]
  pub active:     bool,
}

fn default_active() -> bool { true }

/// `POST /prompts` — returns 201 + the stored [`Prompt`].
pub async fn upsert<S>(
  State(ctx): State<Arc<ApiContext<S>>>,
  Json(body): Json<UpsertPromptBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: VisibilityStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  if body.template.trim().is_empty() {
    return Err(ApiError::BadRequest("template must not be empty".into()));
  }

  let prompt = Prompt {
    prompt_id:  body.prompt_id.unwrap_or_else(Uuid::new_v4),
    project_id: body.project_id,
    name:       body.name,
    template:   body.template,
    tags:       body.tags,
    active:     body.active,
  };

  let stored = ctx
    .store
    .upsert_prompt(prompt)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok((StatusCode::CREATED, Json(stored)))
}
