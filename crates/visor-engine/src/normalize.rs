//! Text canonicalisation for similarity scoring.
//!
//! Pipeline:
//!   raw &str
//!     └─ lowercase
//!          └─ NFD decompose, drop combining marks (é → e)
//!               └─ punctuation → whitespace, split
//!                    └─ strip plural suffix, drop short tokens
//!                         └─ drop stop words → NormalizedText

use std::collections::BTreeSet;

use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};
use visor_core::EngineConfig;

// ─── Normalized form ─────────────────────────────────────────────────────────

/// The canonical form of a piece of free text: the surviving tokens in their
/// original order, plus the same tokens as a set for set-based similarity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedText {
  pub tokens: Vec<String>,
  pub set:    BTreeSet<String>,
}

impl NormalizedText {
  pub fn is_empty(&self) -> bool { self.tokens.is_empty() }

  /// Tokens re-joined with single spaces. Used for keyword-length
  /// tie-breaking and for storage of the canonical keyword form.
  pub fn joined(&self) -> String { self.tokens.join(" ") }
}

// ─── Normalizer ──────────────────────────────────────────────────────────────

/// Canonicalises free text into comparable tokens.
///
/// Deterministic: the same input and stop-word list always produce the same
/// output. Empty or punctuation-only input yields empty output, never an
/// error.
#[derive(Debug, Clone)]
pub struct Normalizer {
  stop_words: BTreeSet<String>,
}

impl Normalizer {
  /// Build a normalizer from a raw stop-word list. Stop words go through
  /// the same canonicalisation as input text, so accented and plural forms
  /// ("meilleurs") match without being listed separately.
  pub fn new(stop_words: &[String]) -> Self {
    let mut canonical = BTreeSet::new();
    for word in stop_words {
      canonical.extend(tokenize(word));
    }
    Self { stop_words: canonical }
  }

  pub fn from_config(config: &EngineConfig) -> Self {
    Self::new(&config.stop_words)
  }

  pub fn normalize(&self, text: &str) -> NormalizedText {
    let tokens: Vec<String> = tokenize(text)
      .into_iter()
      .filter(|t| !self.stop_words.contains(t))
      .collect();
    let set = tokens.iter().cloned().collect();
    NormalizedText { tokens, set }
  }
}

// ─── Token pipeline ──────────────────────────────────────────────────────────

/// Lowercase, strip accents and punctuation, reduce plurals, and drop tokens
/// shorter than three characters (articles and other low-signal fragments).
fn tokenize(text: &str) -> Vec<String> {
  text
    .to_lowercase()
    .nfd()
    .filter(|c| !is_combining_mark(*c))
    .map(|c| if c.is_alphanumeric() { c } else { ' ' })
    .collect::<String>()
    .split_whitespace()
    .map(strip_plural)
    .filter(|t| t.chars().count() > 2)
    .collect()
}

/// French-oriented plural reduction: one trailing `s`, `x`, or `z` is
/// dropped ("casques" → "casque", "chevaux" → "chevau"). Imperfect stemming
/// is fine here; both sides of every comparison pass through it.
fn strip_plural(token: &str) -> String {
  match token.strip_suffix(['s', 'x', 'z']) {
    Some(stem) if !stem.is_empty() => stem.to_string(),
    _ => token.to_string(),
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  fn default_normalizer() -> Normalizer {
    Normalizer::from_config(&EngineConfig::default())
  }

  #[test]
  fn empty_input_yields_empty_output() {
    let n = default_normalizer();
    assert!(n.normalize("").is_empty());
    assert!(n.normalize("   \t\n").is_empty());
    assert!(n.normalize("?!,;").is_empty());
  }

  #[test]
  fn lowercases_and_strips_accents() {
    let n = Normalizer::new(&[]);
    let out = n.normalize("Référencement Naturel");
    assert_eq!(out.tokens, vec!["referencement", "naturel"]);
  }

  #[test]
  fn strips_punctuation_and_collapses_whitespace() {
    let n = Normalizer::new(&[]);
    let out = n.normalize("casque   gaming, sans-fil !");
    assert_eq!(out.tokens, vec!["casque", "gaming", "san", "fil"]);
  }

  #[test]
  fn reduces_simple_plurals() {
    let n = Normalizer::new(&[]);
    assert_eq!(n.normalize("casques").tokens, vec!["casque"]);
    assert_eq!(n.normalize("chevaux").tokens, vec!["chevau"]);
    assert_eq!(n.normalize("gaming").tokens, vec!["gaming"]);
  }

  #[test]
  fn drops_short_tokens() {
    let n = Normalizer::new(&[]);
    // "le" survives plural-stripping of "les" but dies on length.
    let out = n.normalize("les casques de vr");
    assert_eq!(out.tokens, vec!["casque"]);
  }

  #[test]
  fn stop_words_match_after_canonicalisation() {
    let n = default_normalizer();
    // "meilleurs" must be removed even though the configured stop word is
    // the singular form.
    let out = n.normalize("Quels sont les meilleurs casques gaming ?");
    assert_eq!(out.tokens, vec!["casque", "gaming"]);
  }

  #[test]
  fn deterministic() {
    let n = default_normalizer();
    let a = n.normalize("Comparatif des casques gaming 2024");
    let b = n.normalize("Comparatif des casques gaming 2024");
    assert_eq!(a, b);
  }

  #[test]
  fn set_matches_tokens() {
    let n = Normalizer::new(&[]);
    let out = n.normalize("gaming casque gaming");
    assert_eq!(out.tokens, vec!["gaming", "casque", "gaming"]);
    assert_eq!(out.set.len(), 2);
  }
}
