//! Derived reports — gap records and correlation records.
//!
//! Nothing in this module is persisted. Both record types are recomputed
//! from the fact table on every request, so a re-import or late fact never
//! leaves a stale aggregate behind.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

// ─── Query identity ──────────────────────────────────────────────────────────

/// The unit of analysis: a prompt, optionally paired with its associated
/// SERP keyword. Ordering is total and deterministic (prompt id, then
/// keyword id), which the gap worklist relies on for stable tie-breaking.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct QueryId {
  pub prompt_id:  Uuid,
  pub keyword_id: Option<Uuid>,
}

// ─── Gap records ─────────────────────────────────────────────────────────────

/// How urgently a visibility gap needs attention.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display,
  EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum GapSeverity {
  Critical,
  Medium,
  Low,
}

/// How much the underlying query matters to the business, judged from SERP
/// volume and position alone — independent of the AI gap itself.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display,
  EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BusinessRelevance {
  High,
  Medium,
  Low,
}

/// Where a frequency estimate came from. Either way it is an estimate, not
/// a guarantee, and output must label it as such.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrequencyBasis {
  /// Projected from the associated keyword's monthly search volume.
  SearchVolume,
  /// Extrapolated from how often the prompt was actually executed.
  ExecutionCadence,
}

/// One entry in the competitive-gap worklist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GapRecord {
  pub query:               QueryId,
  /// The competitor with the highest mention rate over the window.
  pub leading_competitor:  String,
  /// That competitor's mention rate, in [0,1].
  pub competitor_rate:     f64,
  /// The tracked brand's mention rate, in [0,1].
  pub own_rate:            f64,
  /// `round(100 · max(0, competitor_rate − own_rate))`. Being ahead of
  /// every competitor scores 0, never negative.
  pub gap_score:           u8,
  /// Estimated monthly occurrences of this query pattern.
  pub estimated_monthly_frequency: u32,
  pub frequency_basis:     FrequencyBasis,
  pub severity:            GapSeverity,
  pub relevance:           BusinessRelevance,
  /// Templated next step; presentational, not part of the scoring contract.
  pub suggested_action:    String,
  /// The site already ranks with a page for this query.
  pub content_exists:      bool,
  /// How many facts fell inside the window.
  pub sample_count:        usize,
}

// ─── Correlation records ─────────────────────────────────────────────────────

/// One day's AI visibility for a prompt: the fraction of that day's answers
/// mentioning the brand, in [0,1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VisibilityPoint {
  pub prompt_id: Uuid,
  pub date:      NaiveDate,
  pub rate:      f64,
}

/// One day's organic SERP position for a keyword (1-based, lower is better).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerpPositionPoint {
  pub keyword_id: Uuid,
  pub date:       NaiveDate,
  pub position:   u32,
}

/// SERP-vs-AI correlation for one associated pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelationRecord {
  pub prompt_id:     Uuid,
  pub keyword_id:    Uuid,
  /// Most recent known SERP position among the aligned days.
  pub serp_position: Option<u32>,
  /// Mean AI visibility rate over the aligned days.
  pub ai_visibility: Option<f64>,
  /// Pearson coefficient of visibility vs inverted position. `None` when
  /// fewer than three aligned points exist or either series is constant —
  /// "not computable" is a different statement than "no correlation".
  pub correlation:   Option<f64>,
  pub sample_count:  usize,
}

/// Project-level rollup of [`CorrelationRecord`]s.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelationSummary {
  pub total_pairs:         usize,
  pub computable_pairs:    usize,
  /// Mean coefficient over computable pairs; `None` when there are none.
  pub average_correlation: Option<f64>,
  /// Pairs where SERP strength and AI visibility move together (≥ 0.5).
  pub aligned_pairs:       usize,
  /// Pairs where they move against each other (≤ −0.5).
  pub diverging_pairs:     usize,
}
