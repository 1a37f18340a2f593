//! Error types for `visor-core`.
//!
//! Malformed or empty input text is deliberately NOT an error anywhere in the
//! engine: normalization yields empty token sets and scoring yields 0.0, so
//! matching degrades to "no match" instead of failing.

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

// ─── Conflicts ───────────────────────────────────────────────────────────────

/// Why a persisted association pair conflicts with the resolver's invariants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictReason {
  /// The prompt already has another active association.
  PromptAlreadyAssociated,
  /// The keyword is already claimed by another prompt (unique-keyword mode).
  KeywordAlreadyClaimed,
}

/// One conflicting pair, surfaced to the caller instead of being applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssociationConflict {
  pub prompt_id:  Uuid,
  pub keyword_id: Uuid,
  pub reason:     ConflictReason,
}

// ─── Error ───────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum Error {
  /// The `existing` associations handed to the resolver are internally
  /// inconsistent (stale reads). Nothing was applied; the caller decides
  /// whether to reload or force-overwrite.
  #[error("association invariants violated by {} existing pair(s)", .conflicts.len())]
  InvariantViolation { conflicts: Vec<AssociationConflict> },

  /// A derived value could not be computed from the samples at hand.
  /// Callers must render this distinctly from a zero result.
  #[error("insufficient data: needed {needed} samples, got {got}")]
  InsufficientData { needed: usize, got: usize },

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
