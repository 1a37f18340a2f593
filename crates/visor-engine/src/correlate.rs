//! SERP ↔ AI-visibility correlation.
//!
//! For each associated (prompt, keyword) pair, Pearson correlation between
//! the AI visibility rate series and the inverted SERP position series.
//! Positions are inverted (lower number = better rank) so "higher is
//! better" holds on both axes before correlating.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use uuid::Uuid;
use visor_core::{
  association::Association,
  fact::AiAnswerFact,
  report::{
    CorrelationRecord, CorrelationSummary, SerpPositionPoint,
    VisibilityPoint,
  },
};

/// Minimum aligned samples before a coefficient is reported. Below this,
/// the record says "not computable" rather than risking a misleading value.
const MIN_ALIGNED_POINTS: usize = 3;

/// SERP positions are subtracted from this base (position 1 → 100) to flip
/// their direction.
const POSITION_INVERSION_BASE: f64 = 101.0;

// ─── Correlation ─────────────────────────────────────────────────────────────

/// Correlate AI visibility with SERP position for every associated pair.
///
/// Series are aligned by calendar day; only days present in both series
/// contribute. Pairs with fewer than [`MIN_ALIGNED_POINTS`] aligned days,
/// or with a constant series on either axis, carry `correlation: None`,
/// never a silent 0.
pub fn correlate(
  associations: &[Association],
  visibility: &[VisibilityPoint],
  serp: &[SerpPositionPoint],
) -> Vec<CorrelationRecord> {
  associations
    .iter()
    .map(|assoc| {
      let rates: BTreeMap<NaiveDate, f64> = visibility
        .iter()
        .filter(|p| p.prompt_id == assoc.prompt_id)
        .map(|p| (p.date, p.rate))
        .collect();
      let positions: BTreeMap<NaiveDate, u32> = serp
        .iter()
        .filter(|p| p.keyword_id == assoc.keyword_id)
        .map(|p| (p.date, p.position))
        .collect();

      // Date-ascending thanks to the BTreeMap iteration order.
      let aligned: Vec<(f64, u32)> = rates
        .iter()
        .filter_map(|(date, rate)| {
          positions.get(date).map(|position| (*rate, *position))
        })
        .collect();

      let sample_count = aligned.len();
      let correlation = if sample_count < MIN_ALIGNED_POINTS {
        None
      } else {
        let xs: Vec<f64> = aligned.iter().map(|(rate, _)| *rate).collect();
        let ys: Vec<f64> = aligned
          .iter()
          .map(|(_, position)| {
            POSITION_INVERSION_BASE - f64::from(*position)
          })
          .collect();
        pearson(&xs, &ys)
      };

      CorrelationRecord {
        prompt_id: assoc.prompt_id,
        keyword_id: assoc.keyword_id,
        serp_position: aligned.last().map(|(_, position)| *position),
        ai_visibility: if aligned.is_empty() {
          None
        } else {
          Some(
            aligned.iter().map(|(rate, _)| rate).sum::<f64>()
              / sample_count as f64,
          )
        },
        correlation,
        sample_count,
      }
    })
    .collect()
}

/// Roll correlation records up to a project-level summary.
pub fn summarize(records: &[CorrelationRecord]) -> CorrelationSummary {
  let coefficients: Vec<f64> =
    records.iter().filter_map(|r| r.correlation).collect();
  let computable_pairs = coefficients.len();
  CorrelationSummary {
    total_pairs: records.len(),
    computable_pairs,
    average_correlation: if coefficients.is_empty() {
      None
    } else {
      Some(coefficients.iter().sum::<f64>() / computable_pairs as f64)
    },
    aligned_pairs: coefficients.iter().filter(|c| **c >= 0.5).count(),
    diverging_pairs: coefficients.iter().filter(|c| **c <= -0.5).count(),
  }
}

/// Collapse raw facts into one visibility point per (prompt, day): the
/// share of that day's answers that mentioned the brand.
pub fn visibility_history(facts: &[AiAnswerFact]) -> Vec<VisibilityPoint> {
  let mut buckets: BTreeMap<(Uuid, NaiveDate), (usize, usize)> =
    BTreeMap::new();
  for fact in facts {
    let key = (fact.prompt_id, fact.recorded_at.date_naive());
    let (mentioned, total) = buckets.entry(key).or_insert((0, 0));
    if fact.brand_mentioned {
      *mentioned += 1;
    }
    *total += 1;
  }
  buckets
    .into_iter()
    .map(|((prompt_id, date), (mentioned, total))| VisibilityPoint {
      prompt_id,
      date,
      rate: mentioned as f64 / total as f64,
    })
    .collect()
}

// ─── Pearson ─────────────────────────────────────────────────────────────────

/// Pearson coefficient of two equal-length series. `None` when either
/// series is constant: a zero-variance series has no defined correlation,
/// and 0 would read as "no relationship" instead of "not computable".
fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
  let n = xs.len() as f64;
  let mean_x = xs.iter().sum::<f64>() / n;
  let mean_y = ys.iter().sum::<f64>() / n;

  let mut covariance = 0.0;
  let mut variance_x = 0.0;
  let mut variance_y = 0.0;
  for (x, y) in xs.iter().zip(ys) {
    let dx = x - mean_x;
    let dy = y - mean_y;
    covariance += dx * dy;
    variance_x += dx * dx;
    variance_y += dy * dy;
  }

  if variance_x == 0.0 || variance_y == 0.0 {
    return None;
  }
  Some(covariance / (variance_x.sqrt() * variance_y.sqrt()))
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use chrono::{Duration, TimeZone, Utc};
  use visor_core::association::{AssociationOrigin, ConfidenceTier};

  use super::*;

  fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, day).unwrap()
  }

  fn association() -> Association {
    Association {
      prompt_id:  Uuid::new_v4(),
      keyword_id: Uuid::new_v4(),
      score:      0.9,
      tier:       ConfidenceTier::High,
      origin:     AssociationOrigin::Auto,
      created_at: Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
      updated_at: Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
    }
  }

  fn series(
    assoc: &Association,
    points: &[(u32, f64, u32)],
  ) -> (Vec<VisibilityPoint>, Vec<SerpPositionPoint>) {
    let visibility = points
      .iter()
      .map(|(day, rate, _)| VisibilityPoint {
        prompt_id: assoc.prompt_id,
        date:      date(*day),
        rate:      *rate,
      })
      .collect();
    let serp = points
      .iter()
      .map(|(day, _, position)| SerpPositionPoint {
        keyword_id: assoc.keyword_id,
        date:       date(*day),
        position:   *position,
      })
      .collect();
    (visibility, serp)
  }

  #[test]
  fn fewer_than_three_aligned_points_is_not_computable() {
    let assoc = association();
    let (visibility, serp) =
      series(&assoc, &[(1, 0.2, 8), (2, 0.5, 4)]);

    let records =
      correlate(std::slice::from_ref(&assoc), &visibility, &serp);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].sample_count, 2);
    assert_eq!(records[0].correlation, None);
  }

  #[test]
  fn improving_rank_with_rising_visibility_correlates_positively() {
    let assoc = association();
    // Position climbs 9 → 1 while visibility climbs 0.1 → 0.9.
    let (visibility, serp) = series(
      &assoc,
      &[(1, 0.1, 9), (2, 0.3, 7), (3, 0.5, 5), (4, 0.7, 3), (5, 0.9, 1)],
    );

    let records =
      correlate(std::slice::from_ref(&assoc), &visibility, &serp);
    let c = records[0].correlation.unwrap();
    assert!((c - 1.0).abs() < 1e-9, "expected ~1.0, got {c}");
  }

  #[test]
  fn worsening_rank_with_rising_visibility_correlates_negatively() {
    let assoc = association();
    let (visibility, serp) = series(
      &assoc,
      &[(1, 0.1, 1), (2, 0.4, 4), (3, 0.7, 7), (4, 0.9, 9)],
    );

    let records =
      correlate(std::slice::from_ref(&assoc), &visibility, &serp);
    let c = records[0].correlation.unwrap();
    assert!(c < -0.9, "expected strongly negative, got {c}");
  }

  #[test]
  fn constant_series_is_not_computable() {
    let assoc = association();
    let (visibility, serp) = series(
      &assoc,
      &[(1, 0.5, 3), (2, 0.5, 5), (3, 0.5, 7), (4, 0.5, 2)],
    );

    let records =
      correlate(std::slice::from_ref(&assoc), &visibility, &serp);
    assert_eq!(records[0].sample_count, 4);
    assert_eq!(records[0].correlation, None);
  }

  #[test]
  fn only_shared_dates_are_aligned() {
    let assoc = association();
    let visibility = vec![
      VisibilityPoint { prompt_id: assoc.prompt_id, date: date(1), rate: 0.2 },
      VisibilityPoint { prompt_id: assoc.prompt_id, date: date(2), rate: 0.4 },
      VisibilityPoint { prompt_id: assoc.prompt_id, date: date(9), rate: 0.9 },
    ];
    let serp = vec![
      SerpPositionPoint { keyword_id: assoc.keyword_id, date: date(1), position: 5 },
      SerpPositionPoint { keyword_id: assoc.keyword_id, date: date(2), position: 4 },
      SerpPositionPoint { keyword_id: assoc.keyword_id, date: date(3), position: 3 },
    ];

    let records =
      correlate(std::slice::from_ref(&assoc), &visibility, &serp);
    assert_eq!(records[0].sample_count, 2);
    assert_eq!(records[0].correlation, None);
    assert_eq!(records[0].serp_position, Some(4));
  }

  #[test]
  fn other_pairs_series_do_not_leak_in() {
    let assoc_a = association();
    let assoc_b = association();
    let (mut visibility, mut serp) = series(
      &assoc_a,
      &[(1, 0.1, 9), (2, 0.5, 5), (3, 0.9, 1)],
    );
    let (visibility_b, serp_b) =
      series(&assoc_b, &[(1, 0.9, 1), (2, 0.5, 5), (3, 0.1, 9)]);
    visibility.extend(visibility_b);
    serp.extend(serp_b);

    let records =
      correlate(&[assoc_a, assoc_b], &visibility, &serp);
    assert!(records[0].correlation.unwrap() > 0.99);
    assert!(records[1].correlation.unwrap() > 0.99);
  }

  #[test]
  fn summary_averages_only_computable_pairs() {
    let assoc_a = association();
    let assoc_b = association();
    let (mut visibility, mut serp) =
      series(&assoc_a, &[(1, 0.1, 9), (2, 0.5, 5), (3, 0.9, 1)]);
    // Pair B has too few points to compute.
    let (visibility_b, serp_b) = series(&assoc_b, &[(1, 0.4, 3)]);
    visibility.extend(visibility_b);
    serp.extend(serp_b);

    let records = correlate(&[assoc_a, assoc_b], &visibility, &serp);
    let summary = summarize(&records);
    assert_eq!(summary.total_pairs, 2);
    assert_eq!(summary.computable_pairs, 1);
    assert_eq!(summary.aligned_pairs, 1);
    assert_eq!(summary.diverging_pairs, 0);
    assert!(summary.average_correlation.unwrap() > 0.99);
  }

  #[test]
  fn summary_of_nothing_computable_is_none_not_zero() {
    let summary = summarize(&[]);
    assert_eq!(summary.average_correlation, None);
    assert_eq!(summary.computable_pairs, 0);
  }

  #[test]
  fn visibility_history_buckets_by_prompt_and_day() {
    let prompt_a = Uuid::new_v4();
    let prompt_b = Uuid::new_v4();
    let base = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();

    let fact = |prompt_id, mentioned, at| AiAnswerFact {
      fact_id: Uuid::new_v4(),
      prompt_id,
      project_id: Uuid::nil(),
      model: "gpt-test".to_string(),
      response: String::new(),
      brand_mentioned: mentioned,
      brand_linked: false,
      brand_position: None,
      competitors: vec![],
      recorded_at: at,
    };

    let facts = vec![
      fact(prompt_a, true, base),
      fact(prompt_a, false, base + Duration::hours(4)),
      fact(prompt_a, true, base + Duration::days(1)),
      fact(prompt_b, false, base),
    ];

    let mut history = visibility_history(&facts);
    history.sort_by_key(|p| (p.prompt_id, p.date));

    assert_eq!(history.len(), 3);
    let day_one_a = history
      .iter()
      .find(|p| p.prompt_id == prompt_a && p.date == date(1))
      .unwrap();
    assert_eq!(day_one_a.rate, 0.5);
    let day_two_a = history
      .iter()
      .find(|p| p.prompt_id == prompt_a && p.date == date(2))
      .unwrap();
    assert_eq!(day_two_a.rate, 1.0);
  }
}
