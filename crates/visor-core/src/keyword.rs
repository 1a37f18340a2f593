//! SERP keyword — one imported search-ranking record.
//!
//! Keywords are immutable once imported. A re-import supersedes the previous
//! generation wholesale; nothing is mutated in place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A search keyword with its organic ranking data, as imported.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerpKeyword {
  pub keyword_id:  Uuid,
  pub project_id:  Uuid,
  /// The keyword exactly as imported.
  pub keyword:     String,
  /// Canonical form used for matching (lowercased, unaccented, de-pluralised).
  pub normalized:  String,
  /// Monthly search volume, when the import provides it.
  pub volume:      Option<u32>,
  /// Organic SERP position, 1-based.
  pub position:    u32,
  /// The ranking page's URL, when known.
  pub url:         Option<String>,
  pub imported_at: DateTime<Utc>,
}

/// Input to [`crate::store::VisibilityStore::import_keywords`].
/// `keyword_id` and `imported_at` are assigned by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSerpKeyword {
  pub keyword:    String,
  pub normalized: String,
  pub volume:     Option<u32>,
  pub position:   u32,
  pub url:        Option<String>,
}
