//! Association — the link between one prompt and one SERP keyword.
//!
//! A prompt carries at most one active association (keyed by `prompt_id`).
//! Whether a keyword may back more than one prompt is configurable; the
//! default is one keyword, one prompt.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

// ─── Vocabulary ──────────────────────────────────────────────────────────────

/// Discrete bucket summarising a similarity score.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display,
  EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ConfidenceTier {
  High,
  Medium,
  Low,
}

/// How an association came to exist.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display,
  EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AssociationOrigin {
  /// Set directly by a user, or a suggestion a user accepted.
  Manual,
  /// Accepted by the resolver without review (score cleared auto-accept).
  Auto,
  /// Persisted through a batch "accept all high-confidence" action.
  Suggested,
}

// ─── Records ─────────────────────────────────────────────────────────────────

/// A persisted prompt↔keyword link.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Association {
  pub prompt_id:  Uuid,
  pub keyword_id: Uuid,
  pub score:      f64,
  pub tier:       ConfidenceTier,
  pub origin:     AssociationOrigin,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// An intended association write, computed by the resolver and handed to the
/// persistence collaborator. Timestamps are assigned by the store, which
/// upserts atomically on `prompt_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAssociation {
  pub prompt_id:  Uuid,
  pub keyword_id: Uuid,
  pub score:      f64,
  pub tier:       ConfidenceTier,
  pub origin:     AssociationOrigin,
}

/// A candidate pairing awaiting human review. Never persisted as such;
/// rejecting one simply leaves the prompt unassociated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
  pub prompt_id:   Uuid,
  pub prompt_name: String,
  pub keyword_id:  Uuid,
  pub keyword:     String,
  pub score:       f64,
  pub tier:        ConfidenceTier,
}
