//! Confidence classification of similarity scores.

use visor_core::{EngineConfig, association::ConfidenceTier};

/// The tier a score falls into, and whether it clears auto-accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
  pub tier:        ConfidenceTier,
  pub auto_accept: bool,
}

/// Map a similarity score to a confidence tier and an auto-accept decision.
///
/// Boundaries are inclusive-lower: a score exactly on a threshold belongs to
/// the higher bucket. Auto-accept is a stricter super-threshold within the
/// `high` tier — a high-confidence suggestion is not automatically an
/// accepted association.
pub fn classify(score: f64, config: &EngineConfig) -> Classification {
  if score >= config.auto_accept_threshold {
    Classification { tier: ConfidenceTier::High, auto_accept: true }
  } else if score >= config.high_threshold {
    Classification { tier: ConfidenceTier::High, auto_accept: false }
  } else if score >= config.medium_threshold {
    Classification { tier: ConfidenceTier::Medium, auto_accept: false }
  } else {
    Classification { tier: ConfidenceTier::Low, auto_accept: false }
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
