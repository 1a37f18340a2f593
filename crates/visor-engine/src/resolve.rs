//! Association resolution — prompts × keywords → auto-matches + suggestions.
//!
//! The resolver is a greedy, deterministic heuristic, not an optimal
//! bipartite matcher. Greedy keeps every individual assignment explainable
//! ("this pair scored highest and nothing had claimed either side yet"); a
//! globally-optimal variant could replace this module without touching the
//! scorer or classifier.

use std::{cmp::Ordering, collections::BTreeSet};

use serde::Serialize;
use uuid::Uuid;
use visor_core::{
  EngineConfig, Error, Result,
  association::{Association, AssociationOrigin, NewAssociation, Suggestion},
  error::{AssociationConflict, ConflictReason},
  keyword::SerpKeyword,
  prompt::Prompt,
};

use crate::{
  classify::classify,
  normalize::{NormalizedText, Normalizer},
  score::similarity,
};

// ─── Output ──────────────────────────────────────────────────────────────────

/// The outcome of one resolution pass.
///
/// `auto_matches` are intended writes for the persistence collaborator;
/// `suggestions` await human confirmation and are not persisted here.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution {
  pub auto_matches: Vec<NewAssociation>,
  pub suggestions:  Vec<Suggestion>,
}

// ─── Candidate bookkeeping ───────────────────────────────────────────────────

struct Candidate<'a> {
  prompt:      &'a Prompt,
  keyword:     &'a SerpKeyword,
  /// Length of the normalized keyword, for the "more specific wins" tie.
  keyword_len: usize,
  score:       f64,
}

/// Ordering used both for best-keyword-per-prompt selection and as a
/// secondary key in the global greedy sort: higher score first, then
/// shorter (more specific) keyword, then keyword id for a stable last
/// resort.
fn beats(challenger: &Candidate, current: &Candidate) -> bool {
  match challenger.score.total_cmp(&current.score) {
    Ordering::Greater => true,
    Ordering::Less => false,
    Ordering::Equal => match challenger.keyword_len.cmp(&current.keyword_len) {
      Ordering::Less => true,
      Ordering::Greater => false,
      Ordering::Equal => {
        challenger.keyword.keyword_id.to_string()
          < current.keyword.keyword_id.to_string()
      }
    },
  }
}

// ─── Resolution ──────────────────────────────────────────────────────────────

/// Resolve associations for every unassociated active prompt.
///
/// Scores every eligible prompt × keyword pair (O(P·K), accepted for P and
/// K in the thousands), takes each prompt's best keyword, then assigns
/// greedily in a total deterministic order: score descending, shorter
/// normalized keyword first, then prompt id. A pair is skipped when either
/// side was already claimed earlier in the pass, so no prompt or keyword is
/// assigned twice in one run.
///
/// Pairs that clear the auto-accept threshold become `auto_matches`; every
/// other assigned pair becomes a suggestion. Rejecting a suggestion is not
/// remembered anywhere — the same pair may be suggested again on the next
/// run.
///
/// If `existing` is internally inconsistent (stale reads: a prompt claimed
/// twice, or a keyword claimed twice in unique-keyword mode), nothing is
/// computed and the conflicting pairs are returned in
/// [`Error::InvariantViolation`] for the caller to settle.
pub fn resolve(
  prompts: &[Prompt],
  keywords: &[SerpKeyword],
  existing: &[Association],
  config: &EngineConfig,
) -> Result<Resolution> {
  check_existing(existing, config)?;

  let associated_prompts: BTreeSet<Uuid> =
    existing.iter().map(|a| a.prompt_id).collect();
  let used_keywords: BTreeSet<Uuid> = if config.unique_keywords {
    existing.iter().map(|a| a.keyword_id).collect()
  } else {
    BTreeSet::new()
  };

  // Normalized-text memo, scoped to this pass and discarded with it. A
  // process-wide cache would serve stale entries after a keyword re-import.
  let normalizer = Normalizer::from_config(config);
  let candidate_prompts: Vec<(&Prompt, NormalizedText)> = prompts
    .iter()
    .filter(|p| p.active && !associated_prompts.contains(&p.prompt_id))
    .map(|p| (p, normalizer.normalize(&p.template)))
    .collect();
  let candidate_keywords: Vec<(&SerpKeyword, NormalizedText)> = keywords
    .iter()
    .filter(|k| !used_keywords.contains(&k.keyword_id))
    .map(|k| (k, normalizer.normalize(&k.keyword)))
    .collect();

  // Best-scoring keyword per prompt. Zero scores are never candidates.
  let mut candidates: Vec<Candidate> = Vec::new();
  for (prompt, prompt_norm) in &candidate_prompts {
    let mut best: Option<Candidate> = None;
    for (keyword, keyword_norm) in &candidate_keywords {
      let score = similarity(prompt_norm, keyword_norm, config);
      if score <= 0.0 {
        continue;
      }
      let challenger = Candidate {
        prompt:      *prompt,
        keyword:     *keyword,
        keyword_len: keyword_norm.joined().chars().count(),
        score,
      };
      best = match best {
        Some(current) if !beats(&challenger, &current) => Some(current),
        _ => Some(challenger),
      };
    }
    candidates.extend(best);
  }

  candidates.sort_by(|a, b| {
    b.score
      .total_cmp(&a.score)
      .then_with(|| a.keyword_len.cmp(&b.keyword_len))
      .then_with(|| {
        a.prompt
          .prompt_id
          .to_string()
          .cmp(&b.prompt.prompt_id.to_string())
      })
  });

  // "Already assigned" tracking lives and dies with this invocation.
  let mut claimed_prompts: BTreeSet<Uuid> = BTreeSet::new();
  let mut claimed_keywords: BTreeSet<Uuid> = BTreeSet::new();
  let mut auto_matches = Vec::new();
  let mut suggestions = Vec::new();

  for candidate in candidates {
    if claimed_prompts.contains(&candidate.prompt.prompt_id) {
      continue;
    }
    if config.unique_keywords
      && claimed_keywords.contains(&candidate.keyword.keyword_id)
    {
      continue;
    }
    claimed_prompts.insert(candidate.prompt.prompt_id);
    claimed_keywords.insert(candidate.keyword.keyword_id);

    let class = classify(candidate.score, config);
    if class.auto_accept {
      auto_matches.push(NewAssociation {
        prompt_id:  candidate.prompt.prompt_id,
        keyword_id: candidate.keyword.keyword_id,
        score:      candidate.score,
        tier:       class.tier,
        origin:     AssociationOrigin::Auto,
      });
    } else {
      suggestions.push(Suggestion {
        prompt_id:   candidate.prompt.prompt_id,
        prompt_name: candidate.prompt.name.clone(),
        keyword_id:  candidate.keyword.keyword_id,
        keyword:     candidate.keyword.keyword.clone(),
        score:       candidate.score,
        tier:        class.tier,
      });
    }
  }

  Ok(Resolution { auto_matches, suggestions })
}

/// Reject stale `existing` state up front: at most one association per
/// prompt, and per keyword in unique-keyword mode.
fn check_existing(
  existing: &[Association],
  config: &EngineConfig,
) -> Result<()> {
  let mut seen_prompts = BTreeSet::new();
  let mut seen_keywords = BTreeSet::new();
  let mut conflicts = Vec::new();

  for assoc in existing {
    let prompt_fresh = seen_prompts.insert(assoc.prompt_id);
    let keyword_fresh = seen_keywords.insert(assoc.keyword_id);
    if !prompt_fresh {
      conflicts.push(AssociationConflict {
        prompt_id:  assoc.prompt_id,
        keyword_id: assoc.keyword_id,
        reason:     ConflictReason::PromptAlreadyAssociated,
      });
    } else if config.unique_keywords && !keyword_fresh {
      conflicts.push(AssociationConflict {
        prompt_id:  assoc.prompt_id,
        keyword_id: assoc.keyword_id,
        reason:     ConflictReason::KeywordAlreadyClaimed,
      });
    }
  }

  if conflicts.is_empty() {
    Ok(())
  } else {
    Err(Error::InvariantViolation { conflicts })
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
