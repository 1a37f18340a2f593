//! Handlers for `/facts` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/facts/extract` | Pure extraction, nothing persisted |
//! | `POST` | `/facts` | Extract and record one answer fact; 201 + fact |

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Deserialize;
use uuid::Uuid;
use visor_core::{
  fact::{EntityConfig, MentionFacts, NewAnswerFact},
  store::VisibilityStore,
};

use crate::{ApiContext, error::ApiError};

// ─── Extract (pure) ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ExtractBody {
  pub response: String,
  pub entities: EntityConfig,
}

/// `POST /facts/extract` — run the mention extractor without recording
/// anything. Same body twice, same facts twice.
pub async fn extract<S>(
  State(ctx): State<Arc<ApiContext<S>>>,
  Json(body): Json<ExtractBody>,
) -> Result<Json<MentionFacts>, ApiError>
where
  S: VisibilityStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  Ok(Json(ctx.extractor.extract(&body.response, &body.entities)))
}

// ─── Record ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RecordFactBody {
  pub prompt_id:  Uuid,
  pub project_id: Uuid,
  /// Identifier of the model that produced the response.
  pub model:      String,
  pub response:   String,
  pub entities:   EntityConfig,
}

/// `POST /facts` — extract mention facts from the response and append them
/// to the fact table. Returns 201 + the stored fact.
pub async fn create<S>(
  State(ctx): State<Arc<ApiContext<S>>>,
  Json(body): Json<RecordFactBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: VisibilityStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  ctx
    .store
    .get_prompt(body.prompt_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| {
      ApiError::NotFound(format!("prompt {} not found", body.prompt_id))
    })?;

  let facts = ctx.extractor.extract(&body.response, &body.entities);
  let fact = ctx
    .store
    .record_fact(NewAnswerFact::from_extraction(
      body.prompt_id,
      body.project_id,
      body.model,
      body.response,
      facts,
    ))
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  Ok((StatusCode::CREATED, Json(fact)))
}
