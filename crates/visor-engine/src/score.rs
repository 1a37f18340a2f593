//! Similarity scoring between a prompt and a SERP keyword.
//!
//! The score is a weighted blend of token-set Jaccard overlap and a
//! keyword-containment bonus, clamped to [0,1]. Containment is asymmetric
//! on purpose: a keyword fully contained in a longer prompt is a strong
//! match, the reverse is not. Weights come from [`EngineConfig`]
//! (`jaccard_weight`, `containment_weight`), never from literals here.
//!
//! Everything is computed in double precision; rounding happens only at
//! presentation boundaries, never inside scoring.

use std::collections::BTreeSet;

use visor_core::EngineConfig;

use crate::normalize::NormalizedText;

/// Score how well `keyword` matches `prompt`, in [0,1].
///
/// A keyword that is empty after normalization scores 0.0 — it can never be
/// matched.
pub fn similarity(
  prompt: &NormalizedText,
  keyword: &NormalizedText,
  config: &EngineConfig,
) -> f64 {
  if keyword.is_empty() {
    return 0.0;
  }
  let blended = config.jaccard_weight * jaccard(&prompt.set, &keyword.set)
    + config.containment_weight * containment(prompt, keyword);
  blended.clamp(0.0, 1.0)
}

/// Intersection over union of the two token sets.
fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
  let union = a.union(b).count();
  if union == 0 {
    return 0.0;
  }
  let intersection = a.intersection(b).count();
  intersection as f64 / union as f64
}

/// Fraction of keyword tokens present in the prompt. 1.0 when the keyword
/// is fully contained, regardless of how many extra tokens the prompt has.
fn containment(prompt: &NormalizedText, keyword: &NormalizedText) -> f64 {
  let covered = keyword
    .set
    .iter()
    .filter(|token| prompt.set.contains(*token))
    .count();
  covered as f64 / keyword.set.len() as f64
}

// ─── Tests ───────────────────────────────────────────────────────────────────
