//! Handlers for the derived-report endpoints: gap worklist, correlation,
//! and the SERP coverage summary.
//!
//! Everything here is computed on read. "Not enough data" renders as
//! explicit `null`s — a different statement than a zero result.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use visor_core::{
  EngineConfig,
  association::AssociationOrigin,
  report::{
    CorrelationRecord, CorrelationSummary, GapRecord, SerpPositionPoint,
  },
  store::VisibilityStore,
};
use visor_engine::{correlate, gap};

use crate::{ApiContext, error::ApiError};

// ─── Gap worklist ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct GapParams {
  /// Override the configured rolling-window size for this request.
  pub window: Option<usize>,
}

/// `GET /projects/:id/gaps[?window=N]`
pub async fn gaps<S>(
  State(ctx): State<Arc<ApiContext<S>>>,
  Path(project_id): Path<Uuid>,
  Query(params): Query<GapParams>,
) -> Result<Json<Vec<GapRecord>>, ApiError>
where
  S: VisibilityStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let config = match params.window {
    None => ctx.engine.clone(),
    Some(window) if window >= 1 => {
      EngineConfig { window_size: window, ..ctx.engine.clone() }
    }
    Some(_) => {
      return Err(ApiError::BadRequest(
        "window must be at least 1".into(),
      ));
    }
  };

  let store = &ctx.store;
  let facts = store
    .list_facts(project_id, None)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  let associations = store
    .list_associations(project_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  let keywords = store
    .list_keywords(project_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  Ok(Json(gap::compute_gaps(&facts, &associations, &keywords, &config)))
}

// ─── Correlation ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CorrelationBody {
  /// SERP position history per keyword, e.g. from a rank tracker. The AI
  /// visibility side is derived from the stored answer facts.
  pub serp_history: Vec<SerpPositionPoint>,
}

#[derive(Debug, Serialize)]
pub struct CorrelationResponse {
  pub records: Vec<CorrelationRecord>,
  pub summary: CorrelationSummary,
}

/// `POST /projects/:id/correlation`
pub async fn correlation<S>(
  State(ctx): State<Arc<ApiContext<S>>>,
  Path(project_id): Path<Uuid>,
  Json(body): Json<CorrelationBody>,
) -> Result<Json<CorrelationResponse>, ApiError>
where
  S: VisibilityStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let store = &ctx.store;
  let associations = store
    .list_associations(project_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  let facts = store
    .list_facts(project_id, None)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  let visibility = correlate::visibility_history(&facts);
  let records =
    correlate::correlate(&associations, &visibility, &body.serp_history);
  let summary = correlate::summarize(&records);

  Ok(Json(CorrelationResponse { records, summary }))
}

// ─── SERP summary ────────────────────────────────────────────────────────────

#[derive(Debug, Default, Serialize)]
pub struct SerpSummary {
  pub has_serp_data:           bool,
  pub total_keywords:          usize,
  /// Mean SERP position, rounded to one decimal at this presentation
  /// boundary. `None` without imported keywords.
  pub average_position:        Option<f64>,
  pub top_3_keywords:          usize,
  pub top_10_keywords:         usize,
  pub auto_associations:       usize,
  pub manual_associations:     usize,
  pub suggested_associations:  usize,
  pub unassociated_prompts:    usize,
  /// Share of active prompts with an association, in percent, one decimal.
  pub association_rate:        Option<f64>,
}

/// `GET /projects/:id/serp/summary`
pub async fn serp_summary<S>(
  State(ctx): State<Arc<ApiContext<S>>>,
  Path(project_id): Path<Uuid>,
) -> Result<Json<SerpSummary>, ApiError>
where
  S: VisibilityStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let store = &ctx.store;
  let keywords = store
    .list_keywords(project_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  if keywords.is_empty() {
    return Ok(Json(SerpSummary::default()));
  }

  let prompts = store
    .list_prompts(project_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  let associations = store
    .list_associations(project_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  let total_keywords = keywords.len();
  let average_position = keywords
    .iter()
    .map(|k| f64::from(k.position))
    .sum::<f64>()
    / total_keywords as f64;

  let count_origin = |origin: AssociationOrigin| {
    associations.iter().filter(|a| a.origin == origin).count()
  };

  let active_prompts: Vec<_> = prompts.iter().filter(|p| p.active).collect();
  let associated = active_prompts
    .iter()
    .filter(|p| associations.iter().any(|a| a.prompt_id == p.prompt_id))
    .count();
  let association_rate = if active_prompts.is_empty() {
    None
  } else {
    Some(round1(100.0 * associated as f64 / active_prompts.len() as f64))
  };

  Ok(Json(SerpSummary {
    has_serp_data: true,
    total_keywords,
    average_position: Some(round1(average_position)),
    top_3_keywords: keywords.iter().filter(|k| k.position <= 3).count(),
    top_10_keywords: keywords.iter().filter(|k| k.position <= 10).count(),
    auto_associations: count_origin(AssociationOrigin::Auto),
    manual_associations: count_origin(AssociationOrigin::Manual),
    suggested_associations: count_origin(AssociationOrigin::Suggested),
    unassociated_prompts: active_prompts.len() - associated,
    association_rate,
  }))
}

fn round1(value: f64) -> f64 {
  (value * 10.0).round() / 10.0
}
