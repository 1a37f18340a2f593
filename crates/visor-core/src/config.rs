//! Engine configuration.
//!
//! Every business threshold lives in this one struct, with documented
//! defaults, so the engine is tunable without code changes. Nothing in the
//! engine reads a threshold from anywhere else.

use serde::{Deserialize, Serialize};

/// Tunable weights and thresholds for the matching and gap engines.
///
/// The defaults are a starting configuration inferred from observed
/// behavior, not a frozen contract — validate against labeled data before
/// trusting them for a new corpus.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
  /// Weight of token-set Jaccard overlap in the similarity blend.
  pub jaccard_weight:         f64,
  /// Weight of the keyword-containment bonus in the similarity blend.
  pub containment_weight:     f64,
  /// Scores at or above this are associated without human review.
  pub auto_accept_threshold:  f64,
  /// Lower bound (inclusive) of the `high` confidence tier.
  pub high_threshold:         f64,
  /// Lower bound (inclusive) of the `medium` confidence tier.
  pub medium_threshold:       f64,
  /// Number of most-recent answer facts considered per query.
  pub window_size:            usize,
  /// Gap scores at or above this are `critical`.
  pub critical_gap_threshold: u8,
  /// Gap scores at or above this (and below critical) are `medium`.
  pub medium_gap_threshold:   u8,
  /// Monthly search volume at or above which a keyword counts as
  /// high-value for business relevance.
  pub high_volume_threshold:  u32,
  /// When true (the default), a keyword may back at most one prompt.
  pub unique_keywords:        bool,
  /// Words removed during normalization. Matched after canonicalisation,
  /// so plural and accented variants need not be listed separately.
  pub stop_words:             Vec<String>,
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      jaccard_weight:         0.6,
      containment_weight:     0.4,
      auto_accept_threshold:  0.85,
      high_threshold:         0.70,
      medium_threshold:       0.40,
      window_size:            10,
      critical_gap_threshold: 60,
      medium_gap_threshold:   30,
      high_volume_threshold:  1000,
      unique_keywords:        true,
      stop_words:             default_stop_words(),
    }
  }
}

/// Interrogative and marketing filler words, French and English.
///
/// Prompts in this domain are question-shaped ("Quels sont les meilleurs …",
/// "What are the best …") while SERP keywords are bare noun phrases; the
/// filler has to go for the two to compare cleanly.
fn default_stop_words() -> Vec<String> {
  [
    // French
    "le", "la", "les", "de", "des", "du", "un", "une", "et", "ou", "en",
    "pour", "avec", "sans", "sur", "dans", "est", "sont", "que", "qui",
    "quoi", "quel", "quelle", "quels", "quelles", "comment", "pourquoi",
    "meilleur", "meilleure", "meilleurs", "meilleures", "plus", "tres",
    // English
    "the", "a", "an", "of", "to", "in", "on", "for", "with", "and", "or",
    "is", "are", "what", "which", "who", "how", "why", "best", "top",
    "most", "more",
  ]
  .iter()
  .map(|w| w.to_string())
  .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_match_documented_values() {
    let config = EngineConfig::default();
    assert_eq!(config.jaccard_weight, 0.6);
    assert_eq!(config.containment_weight, 0.4);
    assert_eq!(config.auto_accept_threshold, 0.85);
    assert_eq!(config.high_threshold, 0.70);
    assert_eq!(config.medium_threshold, 0.40);
    assert_eq!(config.window_size, 10);
    assert_eq!(config.critical_gap_threshold, 60);
    assert_eq!(config.medium_gap_threshold, 30);
    assert!(config.unique_keywords);
  }

  #[test]
  fn partial_toml_falls_back_to_defaults() {
    let config: EngineConfig =
      serde_json::from_str(r#"{ "window_size": 25 }"#).unwrap();
    assert_eq!(config.window_size, 25);
    assert_eq!(config.auto_accept_threshold, 0.85);
    assert!(!config.stop_words.is_empty());
  }
}
