//! Competitive gap scoring over answer-fact windows.
//!
//! For each query (prompt, optionally with its associated keyword) the last
//! N facts form a rolling window; the gap score measures how far the
//! tracked brand's mention rate trails its best-performing competitor's.
//! Everything here is recomputed per call — nothing is cached or persisted,
//! so re-imports and late facts can never leave a stale worklist behind.

use std::collections::{BTreeMap, HashMap};

use uuid::Uuid;
use visor_core::{
  EngineConfig,
  association::Association,
  fact::AiAnswerFact,
  keyword::SerpKeyword,
  report::{
    BusinessRelevance, FrequencyBasis, GapRecord, GapSeverity, QueryId,
  },
};

/// Compute the ranked gap worklist for a set of facts.
///
/// Facts are grouped by prompt; each group contributes at most one record,
/// built from its `window_size` most recent facts (ties on the timestamp
/// broken by fact id, so the window is deterministic). Queries with no
/// tracked competitors are skipped — there is nothing to gap against, and a
/// zeroed record would read as "no gap" rather than "not measurable".
///
/// Output ordering: gap score descending, then estimated frequency
/// descending, then query id — a total order, so identical inputs always
/// produce the identical worklist.
pub fn compute_gaps(
  facts: &[AiAnswerFact],
  associations: &[Association],
  keywords: &[SerpKeyword],
  config: &EngineConfig,
) -> Vec<GapRecord> {
  let association_by_prompt: HashMap<Uuid, &Association> =
    associations.iter().map(|a| (a.prompt_id, a)).collect();
  let keyword_by_id: HashMap<Uuid, &SerpKeyword> =
    keywords.iter().map(|k| (k.keyword_id, k)).collect();

  let mut facts_by_prompt: BTreeMap<Uuid, Vec<&AiAnswerFact>> =
    BTreeMap::new();
  for fact in facts {
    facts_by_prompt.entry(fact.prompt_id).or_default().push(fact);
  }

  let mut records = Vec::new();
  for (prompt_id, mut group) in facts_by_prompt {
    group.sort_by(|a, b| {
      a.recorded_at
        .cmp(&b.recorded_at)
        .then_with(|| a.fact_id.cmp(&b.fact_id))
    });
    let start = group.len().saturating_sub(config.window_size.max(1));
    let window = &group[start..];
    let total = window.len() as f64;

    let own_rate =
      window.iter().filter(|f| f.brand_mentioned).count() as f64 / total;

    // Mention counts per competitor over the window. Every tracked name
    // gets an entry so a never-mentioned competitor still counts as 0%.
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for fact in window {
      for mention in &fact.competitors {
        let slot = counts.entry(mention.name.as_str()).or_insert(0);
        if mention.mentioned {
          *slot += 1;
        }
      }
    }

    // Leading competitor: highest mention count; ties go to the lexically
    // first name so reruns agree.
    let mut leading: Option<(&str, usize)> = None;
    for (name, count) in &counts {
      match leading {
        Some((_, best)) if *count <= best => {}
        _ => leading = Some((*name, *count)),
      }
    }
    let Some((leading_name, leading_count)) = leading else {
      continue;
    };

    let competitor_rate = leading_count as f64 / total;
    let gap_score = gap_score(own_rate, competitor_rate);
    let severity = severity(gap_score, config);

    let association = association_by_prompt.get(&prompt_id).copied();
    let keyword = association
      .and_then(|a| keyword_by_id.get(&a.keyword_id))
      .copied();

    let (frequency, basis) = match keyword.and_then(|k| k.volume) {
      Some(volume) => (volume, FrequencyBasis::SearchVolume),
      None => (execution_cadence(window), FrequencyBasis::ExecutionCadence),
    };

    let content_exists = keyword.is_some_and(|k| k.url.is_some());

    records.push(GapRecord {
      query: QueryId {
        prompt_id,
        keyword_id: association.map(|a| a.keyword_id),
      },
      leading_competitor: leading_name.to_string(),
      competitor_rate,
      own_rate,
      gap_score,
      estimated_monthly_frequency: frequency,
      frequency_basis: basis,
      severity,
      relevance: business_relevance(keyword, config),
      suggested_action: suggested_action(severity, content_exists)
        .to_string(),
      content_exists,
      sample_count: window.len(),
    });
  }

  records.sort_by(|a, b| {
    b.gap_score
      .cmp(&a.gap_score)
      .then_with(|| {
        b.estimated_monthly_frequency.cmp(&a.estimated_monthly_frequency)
      })
      .then_with(|| a.query.cmp(&b.query))
  });
  records
}

// ─── Scoring pieces ──────────────────────────────────────────────────────────

/// `round(100 · max(0, competitor − own))`, clamped to [0,100].
///
/// Only being behind is penalised: a brand outperforming every competitor
/// scores 0, never negative. Monotonic in the rate difference.
pub fn gap_score(own_rate: f64, competitor_rate: f64) -> u8 {
  let gap = (100.0 * (competitor_rate - own_rate).max(0.0)).round();
  gap.clamp(0.0, 100.0) as u8
}

/// Severity bucket for a gap score; boundaries are inclusive-lower.
pub fn severity(gap_score: u8, config: &EngineConfig) -> GapSeverity {
  if gap_score >= config.critical_gap_threshold {
    GapSeverity::Critical
  } else if gap_score >= config.medium_gap_threshold {
    GapSeverity::Medium
  } else {
    GapSeverity::Low
  }
}

/// Business value of the underlying query, judged from SERP data alone.
/// Without an associated keyword there is nothing to judge it by.
pub fn business_relevance(
  keyword: Option<&SerpKeyword>,
  config: &EngineConfig,
) -> BusinessRelevance {
  let Some(keyword) = keyword else {
    return BusinessRelevance::Low;
  };
  let volume = keyword.volume.unwrap_or(0);
  if volume >= config.high_volume_threshold && keyword.position <= 10 {
    BusinessRelevance::High
  } else if volume >= config.high_volume_threshold / 2
    || keyword.position <= 20
  {
    BusinessRelevance::Medium
  } else {
    BusinessRelevance::Low
  }
}

/// Facts per month, extrapolated from the window's span. A window recorded
/// within a single day projects its count over thirty days.
fn execution_cadence(window: &[&AiAnswerFact]) -> u32 {
  let (Some(first), Some(last)) = (window.first(), window.last()) else {
    return 0;
  };
  let span_days = (last.recorded_at - first.recorded_at).num_days().max(1);
  ((window.len() as f64 * 30.0) / span_days as f64).round() as u32
}

/// Templated next step for the worklist. Presentational only — nothing
/// downstream branches on this text.
fn suggested_action(
  severity: GapSeverity,
  content_exists: bool,
) -> &'static str {
  match (severity, content_exists) {
    (GapSeverity::Critical, false) => {
      "Create dedicated content for this query; competitors own the answer \
       today."
    }
    (GapSeverity::Critical, true) => {
      "Overhaul the ranking page for AI citation; it is being outcited \
       despite ranking."
    }
    (GapSeverity::Medium, false) => {
      "Draft supporting content for this query to close the visibility gap."
    }
    (GapSeverity::Medium, true) => {
      "Refresh the ranking page and strengthen its entity signals."
    }
    (GapSeverity::Low, false) => {
      "Monitor; consider lightweight content if the gap widens."
    }
    (GapSeverity::Low, true) => {
      "Keep the ranking page current; the position is defensible."
    }
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use chrono::{Duration, TimeZone, Utc};
  use visor_core::{
    association::{AssociationOrigin, ConfidenceTier},
    fact::CompetitorMention,
  };

  use super::*;

  fn fact(
    prompt_id: Uuid,
    brand: bool,
    competitors: &[(&str, bool)],
    day: i64,
  ) -> AiAnswerFact {
    let base = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    AiAnswerFact {
      fact_id: Uuid::new_v4(),
      prompt_id,
      project_id: Uuid::nil(),
      model: "gpt-test".to_string(),
      response: String::new(),
      brand_mentioned: brand,
      brand_linked: false,
      brand_position: None,
      competitors: competitors
        .iter()
        .map(|(name, mentioned)| CompetitorMention {
          name:      name.to_string(),
          mentioned: *mentioned,
          position:  None,
        })
        .collect(),
      recorded_at: base + Duration::days(day),
    }
  }

  fn keyword_with(
    volume: Option<u32>,
    position: u32,
    url: Option<&str>,
  ) -> SerpKeyword {
    SerpKeyword {
      keyword_id:  Uuid::new_v4(),
      project_id:  Uuid::nil(),
      keyword:     "casque gaming".to_string(),
      normalized:  "casque gaming".to_string(),
      volume,
      position,
      url:         url.map(str::to_string),
      imported_at: Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
    }
  }

  fn association_for(prompt_id: Uuid, keyword_id: Uuid) -> Association {
    Association {
      prompt_id,
      keyword_id,
      score: 0.9,
      tier: ConfidenceTier::High,
      origin: AssociationOrigin::Auto,
      created_at: Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
      updated_at: Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
    }
  }

  /// 7/10 brand vs 9/10 competitor → own 70%, competitor 90%, gap 20, low.
  #[test]
  fn moderate_gap_scores_low() {
    let prompt_id = Uuid::new_v4();
    let facts: Vec<AiAnswerFact> = (0..10)
      .map(|i| fact(prompt_id, i < 7, &[("Amazon", i < 9)], i))
      .collect();

    let records =
      compute_gaps(&facts, &[], &[], &EngineConfig::default());
    assert_eq!(records.len(), 1);
    let r = &records[0];
    assert_eq!(r.leading_competitor, "Amazon");
    assert_eq!(r.own_rate, 0.7);
    assert_eq!(r.competitor_rate, 0.9);
    assert_eq!(r.gap_score, 20);
    assert_eq!(r.severity, GapSeverity::Low);
    assert_eq!(r.sample_count, 10);
  }

  /// 10% own vs 80% competitor → gap 70, critical.
  #[test]
  fn wide_gap_scores_critical() {
    let prompt_id = Uuid::new_v4();
    let facts: Vec<AiAnswerFact> = (0..10)
      .map(|i| fact(prompt_id, i < 1, &[("Amazon", i < 8)], i))
      .collect();

    let records =
      compute_gaps(&facts, &[], &[], &EngineConfig::default());
    assert_eq!(records[0].gap_score, 70);
    assert_eq!(records[0].severity, GapSeverity::Critical);
  }

  #[test]
  fn gap_is_floored_at_zero_when_ahead() {
    assert_eq!(gap_score(0.9, 0.3), 0);
    assert_eq!(gap_score(0.5, 0.5), 0);
  }

  #[test]
  fn gap_is_monotonic_in_competitor_rate() {
    let own = 0.4;
    let mut previous = 0;
    for step in 0..=10 {
      let competitor = f64::from(step) / 10.0;
      let score = gap_score(own, competitor);
      assert!(score >= previous, "dropped at competitor={competitor}");
      previous = score;
    }
  }

  #[test]
  fn severity_boundaries_are_inclusive_lower() {
    let config = EngineConfig::default();
    assert_eq!(severity(60, &config), GapSeverity::Critical);
    assert_eq!(severity(59, &config), GapSeverity::Medium);
    assert_eq!(severity(30, &config), GapSeverity::Medium);
    assert_eq!(severity(29, &config), GapSeverity::Low);
    assert_eq!(severity(100, &config), GapSeverity::Critical);
    assert_eq!(severity(0, &config), GapSeverity::Low);
  }

  #[test]
  fn window_keeps_only_most_recent_facts() {
    let prompt_id = Uuid::new_v4();
    // Five old facts where the brand showed up, then ten where it never
    // does; only the recent ten may count.
    let mut facts: Vec<AiAnswerFact> = (0..5)
      .map(|i| fact(prompt_id, true, &[("Amazon", false)], i))
      .collect();
    facts.extend(
      (5..15).map(|i| fact(prompt_id, false, &[("Amazon", true)], i)),
    );

    let records =
      compute_gaps(&facts, &[], &[], &EngineConfig::default());
    let r = &records[0];
    assert_eq!(r.sample_count, 10);
    assert_eq!(r.own_rate, 0.0);
    assert_eq!(r.competitor_rate, 1.0);
    assert_eq!(r.gap_score, 100);
  }

  #[test]
  fn leading_competitor_has_highest_rate() {
    let prompt_id = Uuid::new_v4();
    let facts: Vec<AiAnswerFact> = (0..10)
      .map(|i| {
        fact(prompt_id, false, &[("Amazon", i < 4), ("Fnac", i < 8)], i)
      })
      .collect();

    let records =
      compute_gaps(&facts, &[], &[], &EngineConfig::default());
    assert_eq!(records[0].leading_competitor, "Fnac");
    assert_eq!(records[0].competitor_rate, 0.8);
  }

  #[test]
  fn no_tracked_competitors_yields_no_record() {
    let prompt_id = Uuid::new_v4();
    let facts: Vec<AiAnswerFact> =
      (0..5).map(|i| fact(prompt_id, true, &[], i)).collect();

    let records =
      compute_gaps(&facts, &[], &[], &EngineConfig::default());
    assert!(records.is_empty());
  }

  #[test]
  fn frequency_comes_from_keyword_volume_when_associated() {
    let prompt_id = Uuid::new_v4();
    let keyword = keyword_with(Some(5000), 2, Some("https://example.fr/p"));
    let association = association_for(prompt_id, keyword.keyword_id);
    let facts: Vec<AiAnswerFact> = (0..10)
      .map(|i| fact(prompt_id, i < 7, &[("Amazon", i < 9)], i))
      .collect();

    let records = compute_gaps(
      &facts,
      &[association],
      std::slice::from_ref(&keyword),
      &EngineConfig::default(),
    );
    let r = &records[0];
    assert_eq!(r.estimated_monthly_frequency, 5000);
    assert_eq!(r.frequency_basis, FrequencyBasis::SearchVolume);
    assert_eq!(r.query.keyword_id, Some(keyword.keyword_id));
    assert!(r.content_exists);
    assert_eq!(r.relevance, BusinessRelevance::High);
  }

  #[test]
  fn frequency_falls_back_to_execution_cadence() {
    let prompt_id = Uuid::new_v4();
    // Ten facts across nine days → ten runs per nine days ≈ 33/month.
    let facts: Vec<AiAnswerFact> = (0..10)
      .map(|i| fact(prompt_id, false, &[("Amazon", true)], i))
      .collect();

    let records =
      compute_gaps(&facts, &[], &[], &EngineConfig::default());
    let r = &records[0];
    assert_eq!(r.frequency_basis, FrequencyBasis::ExecutionCadence);
    assert_eq!(r.estimated_monthly_frequency, 33);
    assert!(!r.content_exists);
    assert_eq!(r.relevance, BusinessRelevance::Low);
  }

  #[test]
  fn relevance_tracks_volume_and_position() {
    let config = EngineConfig::default();
    let high = keyword_with(Some(2000), 3, None);
    let medium_by_volume = keyword_with(Some(600), 40, None);
    let medium_by_position = keyword_with(None, 15, None);
    let low = keyword_with(Some(100), 50, None);

    assert_eq!(business_relevance(Some(&high), &config), BusinessRelevance::High);
    assert_eq!(
      business_relevance(Some(&medium_by_volume), &config),
      BusinessRelevance::Medium
    );
    assert_eq!(
      business_relevance(Some(&medium_by_position), &config),
      BusinessRelevance::Medium
    );
    assert_eq!(business_relevance(Some(&low), &config), BusinessRelevance::Low);
    assert_eq!(business_relevance(None, &config), BusinessRelevance::Low);
  }

  #[test]
  fn worklist_orders_by_gap_then_frequency_then_query() {
    let prompt_a = Uuid::new_v4();
    let prompt_b = Uuid::new_v4();
    let prompt_c = Uuid::new_v4();

    let mut facts = Vec::new();
    // A: gap 50.
    facts.extend(
      (0..10).map(|i| fact(prompt_a, i < 3, &[("Amazon", i < 8)], i)),
    );
    // B: gap 80.
    facts.extend(
      (0..10).map(|i| fact(prompt_b, i < 1, &[("Amazon", i < 9)], i)),
    );
    // C: gap 50, same as A.
    facts.extend(
      (0..10).map(|i| fact(prompt_c, i < 3, &[("Amazon", i < 8)], i)),
    );

    let records =
      compute_gaps(&facts, &[], &[], &EngineConfig::default());
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].gap_score, 80);
    assert_eq!(records[1].gap_score, 50);
    assert_eq!(records[2].gap_score, 50);
    // Equal gap and frequency → query id ascending.
    assert!(records[1].query <= records[2].query);
  }

  #[test]
  fn recomputation_is_idempotent() {
    let prompt_id = Uuid::new_v4();
    let facts: Vec<AiAnswerFact> = (0..10)
      .map(|i| fact(prompt_id, i < 4, &[("Amazon", i < 7)], i))
      .collect();
    let config = EngineConfig::default();

    let first = compute_gaps(&facts, &[], &[], &config);
    let second = compute_gaps(&facts, &[], &[], &config);
    assert_eq!(first.len(), second.len());
    assert_eq!(first[0].gap_score, second[0].gap_score);
    assert_eq!(first[0].suggested_action, second[0].suggested_action);
  }
}
