//! Row ↔ domain-type codecs for the SQLite store.
//!
//! Columns are read into raw string structs inside the connection closure
//! and decoded into domain types outside it, so decode failures surface as
//! this crate's [`Error`] rather than being squeezed through rusqlite's.

use chrono::{DateTime, Utc};
use uuid::Uuid;
use visor_core::{
  association::{Association, AssociationOrigin, ConfidenceTier},
  fact::{AiAnswerFact, CompetitorMention},
  keyword::SerpKeyword,
  prompt::Prompt,
};

use crate::{Error, Result};

// ─── Scalar codecs ───────────────────────────────────────────────────────────

pub(crate) fn encode_uuid(id: Uuid) -> String { id.to_string() }

pub(crate) fn parse_uuid(s: &str) -> Result<Uuid> {
  Uuid::parse_str(s).map_err(Error::Uuid)
}

pub(crate) fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub(crate) fn parse_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

pub(crate) fn parse_tier(s: &str) -> Result<ConfidenceTier> {
  s.parse()
    .map_err(|_| Error::Decode(format!("unknown confidence tier {s:?}")))
}

pub(crate) fn parse_origin(s: &str) -> Result<AssociationOrigin> {
  s.parse()
    .map_err(|_| Error::Decode(format!("unknown association origin {s:?}")))
}

// ─── Raw rows ────────────────────────────────────────────────────────────────

pub(crate) struct RawPrompt {
  pub prompt_id:  String,
  pub project_id: String,
  pub name:       String,
  pub template:   String,
  pub tags:       String,
  pub active:     bool,
}

impl RawPrompt {
  pub(crate) fn into_prompt(self) -> Result<Prompt> {
    Ok(Prompt {
      prompt_id:  parse_uuid(&self.prompt_id)?,
      project_id: parse_uuid(&self.project_id)?,
      name:       self.name,
      template:   self.template,
      tags:       serde_json::from_str(&self.tags)?,
      active:     self.active,
    })
  }
}

pub(crate) struct RawKeyword {
  pub keyword_id:  String,
  pub project_id:  String,
  pub keyword:     String,
  pub normalized:  String,
  pub volume:      Option<u32>,
  pub position:    u32,
  pub url:         Option<String>,
  pub imported_at: String,
}

impl RawKeyword {
  pub(crate) fn into_keyword(self) -> Result<SerpKeyword> {
    Ok(SerpKeyword {
      keyword_id:  parse_uuid(&self.keyword_id)?,
      project_id:  parse_uuid(&self.project_id)?,
      keyword:     self.keyword,
      normalized:  self.normalized,
      volume:      self.volume,
      position:    self.position,
      url:         self.url,
      imported_at: parse_dt(&self.imported_at)?,
    })
  }
}

pub(crate) struct RawAssociation {
  pub prompt_id:  String,
  pub keyword_id: String,
  pub score:      f64,
  pub tier:       String,
  pub origin:     String,
  pub created_at: String,
  pub updated_at: String,
}

impl RawAssociation {
  pub(crate) fn into_association(self) -> Result<Association> {
    Ok(Association {
      prompt_id:  parse_uuid(&self.prompt_id)?,
      keyword_id: parse_uuid(&self.keyword_id)?,
      score:      self.score,
      tier:       parse_tier(&self.tier)?,
      origin:     parse_origin(&self.origin)?,
      created_at: parse_dt(&self.created_at)?,
      updated_at: parse_dt(&self.updated_at)?,
    })
  }
}

pub(crate) struct RawFact {
  pub fact_id:         String,
  pub prompt_id:       String,
  pub project_id:      String,
  pub model:           String,
  pub response:        String,
  pub brand_mentioned: bool,
  pub brand_linked:    bool,
  pub brand_position:  Option<u32>,
  pub competitors:     String,
  pub recorded_at:     String,
}

impl RawFact {
  pub(crate) fn into_fact(self) -> Result<AiAnswerFact> {
    let competitors: Vec<CompetitorMention> =
      serde_json::from_str(&self.competitors)?;
    Ok(AiAnswerFact {
      fact_id:         parse_uuid(&self.fact_id)?,
      prompt_id:       parse_uuid(&self.prompt_id)?,
      project_id:      parse_uuid(&self.project_id)?,
      model:           self.model,
      response:        self.response,
      brand_mentioned: self.brand_mentioned,
      brand_linked:    self.brand_linked,
      brand_position:  self.brand_position,
      competitors,
      recorded_at:     parse_dt(&self.recorded_at)?,
    })
  }
}
