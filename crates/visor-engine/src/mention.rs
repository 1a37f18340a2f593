//! Mention extraction from raw AI answers.
//!
//! Pure: the same response text and entity configuration always yield the
//! same facts, with no dependence on call order or external state. An empty
//! or unparseable response yields all-false facts, never an error.

use regex::Regex;
use url::Url;
use visor_core::fact::{CompetitorMention, EntityConfig, MentionFacts};

/// Ranked-list positions beyond this are treated as noise (numbered
/// paragraphs, years, step lists) and ignored.
const MAX_RANKED_POSITION: u32 = 10;

// ─── Extractor ───────────────────────────────────────────────────────────────

/// Compiled patterns for mention, ranking, and link detection.
///
/// Stateless after construction; build one and reuse it across calls.
pub struct MentionExtractor {
  url:          Regex,
  ranked_lines: Vec<Regex>,
}

impl Default for MentionExtractor {
  fn default() -> Self { Self::new() }
}

impl MentionExtractor {
  pub fn new() -> Self {
    // Fixed patterns; compilation cannot fail.
    let url = Regex::new(
      r#"https?://[A-Za-z0-9.-]+(?::\d+)?(?:/[^\s<>"')\]]*)?"#,
    )
    .expect("static URL pattern");
    let ranked_lines = [
      // "1. Site", "2) Site", "#3. Site"
      r"^\s*#?(\d{1,3})\s*[.)]\s*(.+)$",
      // "#1: Site"
      r"^\s*#(\d{1,3})\s*:?\s*(.+)$",
      // "Top 3: Site"
      r"(?i)^\s*top\s*(\d{1,3})\s*:\s*(.+)$",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("static ranking pattern"))
    .collect();
    Self { url, ranked_lines }
  }

  /// Extract mention facts for the brand and each competitor.
  pub fn extract(
    &self,
    response: &str,
    entities: &EntityConfig,
  ) -> MentionFacts {
    let haystack = response.to_lowercase();

    let brand_needles = needles(&entities.brand, &entities.brand_aliases);
    let brand_mentioned = contains_any(&haystack, &brand_needles);
    let brand_position = if brand_mentioned {
      self.ranked_position(response, &brand_needles)
    } else {
      None
    };
    let brand_linked = match entities.brand_domain.as_deref() {
      Some(domain) => self.links_to_domain(response, domain),
      None => false,
    };

    let competitors = entities
      .competitors
      .iter()
      .map(|name| {
        let competitor_needles = needles(name, &[]);
        let mentioned = contains_any(&haystack, &competitor_needles);
        let position = if mentioned {
          self.ranked_position(response, &competitor_needles)
        } else {
          None
        };
        CompetitorMention { name: name.clone(), mentioned, position }
      })
      .collect();

    MentionFacts {
      brand_mentioned,
      brand_linked,
      brand_position,
      competitors,
    }
  }

  /// First ranked-list position whose item text names one of `needles`.
  fn ranked_position(
    &self,
    response: &str,
    needles: &[String],
  ) -> Option<u32> {
    for line in response.lines() {
      let Some((rank, item)) = self.parse_ranked_line(line) else {
        continue;
      };
      if rank == 0 || rank > MAX_RANKED_POSITION {
        continue;
      }
      let item = item.to_lowercase();
      if needles.iter().any(|n| item.contains(n.as_str())) {
        return Some(rank);
      }
    }
    None
  }

  fn parse_ranked_line<'a>(&self, line: &'a str) -> Option<(u32, &'a str)> {
    for pattern in &self.ranked_lines {
      if let Some(caps) = pattern.captures(line) {
        let rank = caps.get(1)?.as_str().parse().ok()?;
        let item = caps.get(2)?.as_str();
        return Some((rank, item));
      }
    }
    None
  }

  /// True when any URL in the response resolves to the brand's domain (or a
  /// subdomain of it).
  fn links_to_domain(&self, response: &str, domain: &str) -> bool {
    let Some(target) = canonical_host(domain) else {
      return false;
    };
    self.url.find_iter(response).any(|m| {
      let raw = m.as_str().trim_end_matches(['.', ',', ';', '!', '?']);
      Url::parse(raw)
        .ok()
        .and_then(|u| {
          u.host_str()
            .map(|h| hosts_match(strip_www(&h.to_lowercase()), &target))
        })
        .unwrap_or(false)
    })
  }
}

/// One-shot extraction with a freshly-built extractor. Callers in a loop
/// should hold a [`MentionExtractor`] to reuse the compiled patterns.
pub fn extract_facts(response: &str, entities: &EntityConfig) -> MentionFacts {
  MentionExtractor::new().extract(response, entities)
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Lowercased, trimmed, non-empty search needles for one entity.
fn needles(primary: &str, aliases: &[String]) -> Vec<String> {
  std::iter::once(primary)
    .chain(aliases.iter().map(String::as_str))
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .map(str::to_lowercase)
    .collect()
}

fn contains_any(haystack: &str, needles: &[String]) -> bool {
  needles.iter().any(|n| haystack.contains(n.as_str()))
}

/// Canonical host for comparison. Accepts "example.com",
/// "www.example.com", or a full URL.
fn canonical_host(domain: &str) -> Option<String> {
  let trimmed = domain.trim();
  if trimmed.is_empty() {
    return None;
  }
  let candidate = if trimmed.contains("://") {
    trimmed.to_string()
  } else {
    format!("https://{trimmed}")
  };
  let url = Url::parse(&candidate).ok()?;
  url
    .host_str()
    .map(|h| strip_www(&h.to_lowercase()).to_string())
}

fn strip_www(host: &str) -> &str {
  host.strip_prefix("www.").unwrap_or(host)
}

/// Equal hosts, or one a subdomain of the other.
fn hosts_match(host: &str, target: &str) -> bool {
  host == target
    || host.ends_with(&format!(".{target}"))
    || target.ends_with(&format!(".{host}"))
}

// ─── Tests ───────────────────────────────────────────────────────────────────
