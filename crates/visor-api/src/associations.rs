//! Handlers for keyword import and association endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/projects/:id/serp/keywords` | Import a keyword batch (supersedes the previous one) |
//! | `GET`  | `/projects/:id/serp/keywords` | Active keyword generation |
//! | `POST` | `/projects/:id/associations/resolve` | Run the resolver; persist auto-matches only |
//! | `POST` | `/projects/:id/associations/accept-high` | Batch-accept high-tier suggestions |
//! | `GET`  | `/projects/:id/associations` | Associations with keyword detail |
//! | `PUT`  | `/prompts/:id/association` | Manual set/clear |

use std::{collections::HashMap, sync::Arc};

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use visor_core::{
  association::{
    Association, AssociationOrigin, ConfidenceTier, NewAssociation,
    Suggestion,
  },
  keyword::{NewSerpKeyword, SerpKeyword},
  store::VisibilityStore,
};
use visor_engine::{classify, normalize::Normalizer, resolve, score};

use crate::{ApiContext, error::ApiError};

// ─── Keyword import ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ImportKeyword {
  pub keyword:  String,
  pub volume:   Option<u32>,
  /// Organic SERP position, 1-based.
  pub position: u32,
  pub url:      Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ImportBody {
  pub keywords: Vec<ImportKeyword>,
}

/// `POST /projects/:id/serp/keywords` — returns 201 + the new generation.
pub async fn import_keywords<S>(
  State(ctx): State<Arc<ApiContext<S>>>,
  Path(project_id): Path<Uuid>,
  Json(body): Json<ImportBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: VisibilityStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  if body.keywords.is_empty() {
    return Err(ApiError::BadRequest("keyword batch is empty".into()));
  }

  let normalizer = Normalizer::from_config(&ctx.engine);
  let mut batch = Vec::with_capacity(body.keywords.len());
  for (index, entry) in body.keywords.into_iter().enumerate() {
    if entry.keyword.trim().is_empty() {
      return Err(ApiError::BadRequest(format!(
        "entry {index}: keyword text is empty"
      )));
    }
    if entry.position == 0 {
      return Err(ApiError::BadRequest(format!(
        "entry {index}: position is 1-based"
      )));
    }
    batch.push(NewSerpKeyword {
      normalized: normalizer.normalize(&entry.keyword).joined(),
      keyword:    entry.keyword,
      volume:     entry.volume,
      position:   entry.position,
      url:        entry.url,
    });
  }

  let imported = ctx
    .store
    .import_keywords(project_id, batch)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok((StatusCode::CREATED, Json(imported)))
}

/// `GET /projects/:id/serp/keywords`
pub async fn list_keywords<S>(
  State(ctx): State<Arc<ApiContext<S>>>,
  Path(project_id): Path<Uuid>,
) -> Result<Json<Vec<SerpKeyword>>, ApiError>
where
  S: VisibilityStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let keywords = ctx
    .store
    .list_keywords(project_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(keywords))
}

// ─── Resolution ──────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ResolveResponse {
  /// Auto-accepted pairs, already persisted with origin `auto`.
  pub auto_matches: Vec<Association>,
  /// Pending pairs; persisted only when a human accepts them.
  pub suggestions:  Vec<Suggestion>,
}

/// `POST /projects/:id/associations/resolve`
///
/// Runs the resolver over the project's current prompts, keywords, and
/// associations. Auto-matches are persisted through the store's atomic
/// upsert; suggestions are returned for review only. A 409 carries the
/// conflicting pairs when the persisted association state is stale.
pub async fn resolve_project<S>(
  State(ctx): State<Arc<ApiContext<S>>>,
  Path(project_id): Path<Uuid>,
) -> Result<Json<ResolveResponse>, ApiError>
where
  S: VisibilityStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let store = &ctx.store;
  let prompts = store
    .list_prompts(project_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  let keywords = store
    .list_keywords(project_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  let existing = store
    .list_associations(project_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  let resolution = resolve(&prompts, &keywords, &existing, &ctx.engine)?;

  let mut auto_matches = Vec::with_capacity(resolution.auto_matches.len());
  for intended in resolution.auto_matches {
    let persisted = store
      .upsert_association(intended)
      .await
      .map_err(|e| ApiError::Store(Box::new(e)))?;
    auto_matches.push(persisted);
  }

  tracing::info!(
    %project_id,
    auto_matches = auto_matches.len(),
    suggestions = resolution.suggestions.len(),
    "association resolution complete"
  );

  Ok(Json(ResolveResponse {
    auto_matches,
    suggestions: resolution.suggestions,
  }))
}

/// `POST /projects/:id/associations/accept-high`
///
/// Batch-accepts every current high-tier suggestion, persisting them with
/// origin `suggested`. Auto-accept pairs are untouched (use `resolve`).
pub async fn accept_high<S>(
  State(ctx): State<Arc<ApiContext<S>>>,
  Path(project_id): Path<Uuid>,
) -> Result<Json<Vec<Association>>, ApiError>
where
  S: VisibilityStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let store = &ctx.store;
  let prompts = store
    .list_prompts(project_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  let keywords = store
    .list_keywords(project_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  let existing = store
    .list_associations(project_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  let resolution = resolve(&prompts, &keywords, &existing, &ctx.engine)?;

  let mut accepted = Vec::new();
  for suggestion in resolution
    .suggestions
    .into_iter()
    .filter(|s| s.tier == ConfidenceTier::High)
  {
    let persisted = store
      .upsert_association(NewAssociation {
        prompt_id:  suggestion.prompt_id,
        keyword_id: suggestion.keyword_id,
        score:      suggestion.score,
        tier:       suggestion.tier,
        origin:     AssociationOrigin::Suggested,
      })
      .await
      .map_err(|e| ApiError::Store(Box::new(e)))?;
    accepted.push(persisted);
  }

  Ok(Json(accepted))
}

// ─── Manual association ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SetAssociationBody {
  /// `null` clears the prompt's association.
  pub keyword_id: Option<Uuid>,
  /// Omit to have the similarity score computed from the current texts.
  pub score:      Option<f64>,
}

/// `PUT /prompts/:id/association`
pub async fn set_manual<S>(
  State(ctx): State<Arc<ApiContext<S>>>,
  Path(prompt_id): Path<Uuid>,
  Json(body): Json<SetAssociationBody>,
) -> Result<Json<Option<Association>>, ApiError>
where
  S: VisibilityStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let store = &ctx.store;
  let prompt = store
    .get_prompt(prompt_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| {
      ApiError::NotFound(format!("prompt {prompt_id} not found"))
    })?;

  let Some(keyword_id) = body.keyword_id else {
    store
      .delete_association(prompt_id)
      .await
      .map_err(|e| ApiError::Store(Box::new(e)))?;
    return Ok(Json(None));
  };

  let keywords = store
    .list_keywords(prompt.project_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  let keyword = keywords
    .iter()
    .find(|k| k.keyword_id == keyword_id)
    .ok_or_else(|| {
      ApiError::NotFound(format!(
        "keyword {keyword_id} not in the active import"
      ))
    })?;

  let score = match body.score {
    Some(score) if (0.0..=1.0).contains(&score) => score,
    Some(score) => {
      return Err(ApiError::BadRequest(format!(
        "score {score} outside [0,1]"
      )));
    }
    None => {
      let normalizer = Normalizer::from_config(&ctx.engine);
      score::similarity(
        &normalizer.normalize(&prompt.template),
        &normalizer.normalize(&keyword.keyword),
        &ctx.engine,
      )
    }
  };

  let association = store
    .upsert_association(NewAssociation {
      prompt_id,
      keyword_id,
      score,
      tier: classify(score, &ctx.engine).tier,
      origin: AssociationOrigin::Manual,
    })
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(Some(association)))
}

// ─── Listing ─────────────────────────────────────────────────────────────────

/// One association joined with its prompt and keyword detail. Keyword
/// fields are absent when the keyword belongs to a superseded import.
#[derive(Debug, Serialize)]
pub struct AssociationView {
  pub prompt_id:     Uuid,
  pub prompt_name:   Option<String>,
  pub keyword_id:    Uuid,
  pub keyword:       Option<String>,
  pub serp_position: Option<u32>,
  pub volume:        Option<u32>,
  pub url:           Option<String>,
  pub score:         f64,
  pub tier:          ConfidenceTier,
  pub origin:        AssociationOrigin,
}

/// `GET /projects/:id/associations`
pub async fn list<S>(
  State(ctx): State<Arc<ApiContext<S>>>,
  Path(project_id): Path<Uuid>,
) -> Result<Json<Vec<AssociationView>>, ApiError>
where
  S: VisibilityStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let store = &ctx.store;
  let associations = store
    .list_associations(project_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  let prompts = store
    .list_prompts(project_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  let keywords = store
    .list_keywords(project_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  let prompt_names: HashMap<Uuid, &str> = prompts
    .iter()
    .map(|p| (p.prompt_id, p.name.as_str()))
    .collect();
  let keywords_by_id: HashMap<Uuid, &SerpKeyword> =
    keywords.iter().map(|k| (k.keyword_id, k)).collect();

  let views = associations
    .into_iter()
    .map(|a| {
      let keyword = keywords_by_id.get(&a.keyword_id).copied();
      AssociationView {
        prompt_id:     a.prompt_id,
        prompt_name:   prompt_names
          .get(&a.prompt_id)
          .map(|n| n.to_string()),
        keyword_id:    a.keyword_id,
        keyword:       keyword.map(|k| k.keyword.clone()),
        serp_position: keyword.map(|k| k.position),
        volume:        keyword.and_then(|k| k.volume),
        url:           keyword.and_then(|k| k.url.clone()),
        score:         a.score,
        tier:          a.tier,
        origin:        a.origin,
      }
    })
    .collect();

  Ok(Json(views))
}
