//! Answer facts — what one AI response said about the tracked entities.
//!
//! Facts are append-only. Once recorded they are never updated; the gap
//! engine recomputes its aggregates from them on every request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Entity configuration ────────────────────────────────────────────────────

/// The entities the mention extractor looks for in a response.
///
/// Owned by the surrounding application (project settings); passed in per
/// call so extraction stays a pure function of its arguments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityConfig {
  /// The tracked brand's primary name.
  pub brand:         String,
  /// Alternative spellings and product names that count as brand mentions.
  #[serde(default)]
  pub brand_aliases: Vec<String>,
  /// The brand's website domain, for link detection. Accepts a bare domain
  /// or a full URL.
  #[serde(default)]
  pub brand_domain:  Option<String>,
  /// Competitor names to track alongside the brand.
  #[serde(default)]
  pub competitors:   Vec<String>,
}

// ─── Extraction output ───────────────────────────────────────────────────────

/// What one response said about one competitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompetitorMention {
  pub name:      String,
  pub mentioned: bool,
  /// Position in a ranked list within the answer, when one names the
  /// competitor.
  pub position:  Option<u32>,
}

/// The raw facts extracted from a single response text.
///
/// Pure data — identity, model, and timestamp are attached when the caller
/// records the fact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MentionFacts {
  pub brand_mentioned: bool,
  /// A hyperlink to the brand's own domain appears in the answer.
  pub brand_linked:    bool,
  /// Position in a ranked list within the answer, when one names the brand.
  pub brand_position:  Option<u32>,
  pub competitors:     Vec<CompetitorMention>,
}

// ─── Persisted fact ──────────────────────────────────────────────────────────

/// One recorded prompt-against-model run. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiAnswerFact {
  pub fact_id:         Uuid,
  pub prompt_id:       Uuid,
  pub project_id:      Uuid,
  /// Identifier of the model that produced the response.
  pub model:           String,
  /// The raw response text the facts were extracted from.
  pub response:        String,
  pub brand_mentioned: bool,
  pub brand_linked:    bool,
  pub brand_position:  Option<u32>,
  pub competitors:     Vec<CompetitorMention>,
  /// Server-assigned timestamp; never changes after creation.
  pub recorded_at:     DateTime<Utc>,
}

/// Input to [`crate::store::VisibilityStore::record_fact`].
/// `fact_id` and `recorded_at` are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewAnswerFact {
  pub prompt_id:       Uuid,
  pub project_id:      Uuid,
  pub model:           String,
  pub response:        String,
  pub brand_mentioned: bool,
  pub brand_linked:    bool,
  pub brand_position:  Option<u32>,
  pub competitors:     Vec<CompetitorMention>,
}

impl NewAnswerFact {
  /// Combine extraction output with run identity into a storable fact.
  pub fn from_extraction(
    prompt_id: Uuid,
    project_id: Uuid,
    model: impl Into<String>,
    response: impl Into<String>,
    facts: MentionFacts,
  ) -> Self {
    Self {
      prompt_id,
      project_id,
      model: model.into(),
      response: response.into(),
      brand_mentioned: facts.brand_mentioned,
      brand_linked: facts.brand_linked,
      brand_position: facts.brand_position,
      competitors: facts.competitors,
    }
  }
}
