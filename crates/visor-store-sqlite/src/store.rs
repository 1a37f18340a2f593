//! [`SqliteStore`] — the SQLite implementation of [`VisibilityStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use visor_core::{
  association::{Association, NewAssociation},
  fact::{AiAnswerFact, NewAnswerFact},
  keyword::{NewSerpKeyword, SerpKeyword},
  prompt::Prompt,
  store::VisibilityStore,
};

use crate::{
  Error, Result,
  encode::{
    RawAssociation, RawFact, RawKeyword, RawPrompt, encode_dt, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Visor store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn prompt_exists(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);
    let exists = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT 1 FROM prompts WHERE prompt_id = ?1",
              rusqlite::params![id_str],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false),
        )
      })
      .await?;
    Ok(exists)
  }

  async fn keyword_exists(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);
    let exists = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT 1 FROM serp_keywords WHERE keyword_id = ?1",
              rusqlite::params![id_str],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false),
        )
      })
      .await?;
    Ok(exists)
  }
}

// ─── VisibilityStore impl ────────────────────────────────────────────────────

impl VisibilityStore for SqliteStore {
  type Error = Error;

  // ── Prompts ───────────────────────────────────────────────────────────────

  async fn upsert_prompt(&self, prompt: Prompt) -> Result<Prompt> {
    let prompt_id_str  = encode_uuid(prompt.prompt_id);
    let project_id_str = encode_uuid(prompt.project_id);
    let name           = prompt.name.clone();
    let template       = prompt.template.clone();
    let tags_str       = serde_json::to_string(&prompt.tags)?;
    let active         = prompt.active;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO prompts (prompt_id, project_id, name, template, tags, active)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)
           ON CONFLICT(prompt_id) DO UPDATE SET
             project_id = excluded.project_id,
             name       = excluded.name,
             template   = excluded.template,
             tags       = excluded.tags,
             active     = excluded.active",
          rusqlite::params![
            prompt_id_str,
            project_id_str,
            name,
            template,
            tags_str,
            active,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(prompt)
  }

  async fn get_prompt(&self, id: Uuid) -> Result<Option<Prompt>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawPrompt> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT prompt_id, project_id, name, template, tags, active
               FROM prompts WHERE prompt_id = ?1",
              rusqlite::params![id_str],
              |row| {
                Ok(RawPrompt {
                  prompt_id:  row.get(0)?,
                  project_id: row.get(1)?,
                  name:       row.get(2)?,
                  template:   row.get(3)?,
                  tags:       row.get(4)?,
                  active:     row.get(5)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawPrompt::into_prompt).transpose()
  }

  async fn list_prompts(&self, project_id: Uuid) -> Result<Vec<Prompt>> {
    let project_str = encode_uuid(project_id);

    let raws: Vec<RawPrompt> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT prompt_id, project_id, name, template, tags, active
           FROM prompts WHERE project_id = ?1 ORDER BY name, prompt_id",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![project_str], |row| {
            Ok(RawPrompt {
              prompt_id:  row.get(0)?,
              project_id: row.get(1)?,
              name:       row.get(2)?,
              template:   row.get(3)?,
              tags:       row.get(4)?,
              active:     row.get(5)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPrompt::into_prompt).collect()
  }

  // ── SERP keywords ─────────────────────────────────────────────────────────

  async fn import_keywords(
    &self,
    project_id: Uuid,
    batch: Vec<NewSerpKeyword>,
  ) -> Result<Vec<SerpKeyword>> {
    let imported_at = Utc::now();
    let keywords: Vec<SerpKeyword> = batch
      .into_iter()
      .map(|k| SerpKeyword {
        keyword_id: Uuid::new_v4(),
        project_id,
        keyword: k.keyword,
        normalized: k.normalized,
        volume: k.volume,
        position: k.position,
        url: k.url,
        imported_at,
      })
      .collect();

    let project_str = encode_uuid(project_id);
    let at_str = encode_dt(imported_at);
    let rows: Vec<(String, String, String, Option<u32>, u32, Option<String>)> =
      keywords
        .iter()
        .map(|k| {
          (
            encode_uuid(k.keyword_id),
            k.keyword.clone(),
            k.normalized.clone(),
            k.volume,
            k.position,
            k.url.clone(),
          )
        })
        .collect();

    // Deactivating the previous generation and inserting the new one is one
    // transaction; a reader never sees a half-imported state.
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "UPDATE serp_keywords SET active = 0
           WHERE project_id = ?1 AND active = 1",
          rusqlite::params![project_str],
        )?;
        for (keyword_id, keyword, normalized, volume, position, url) in &rows
        {
          tx.execute(
            "INSERT INTO serp_keywords (
               keyword_id, project_id, keyword, normalized,
               volume, position, url, imported_at, active
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 1)",
            rusqlite::params![
              keyword_id,
              project_str,
              keyword,
              normalized,
              volume,
              position,
              url,
              at_str,
            ],
          )?;
        }
        tx.commit()?;
        Ok(())
      })
      .await?;

    Ok(keywords)
  }

  async fn list_keywords(&self, project_id: Uuid) -> Result<Vec<SerpKeyword>> {
    let project_str = encode_uuid(project_id);

    let raws: Vec<RawKeyword> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT keyword_id, project_id, keyword, normalized,
                  volume, position, url, imported_at
           FROM serp_keywords
           WHERE project_id = ?1 AND active = 1
           ORDER BY position, keyword_id",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![project_str], |row| {
            Ok(RawKeyword {
              keyword_id:  row.get(0)?,
              project_id:  row.get(1)?,
              keyword:     row.get(2)?,
              normalized:  row.get(3)?,
              volume:      row.get(4)?,
              position:    row.get(5)?,
              url:         row.get(6)?,
              imported_at: row.get(7)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawKeyword::into_keyword).collect()
  }

  // ── Associations ──────────────────────────────────────────────────────────

  async fn upsert_association(
    &self,
    association: NewAssociation,
  ) -> Result<Association> {
    if !self.prompt_exists(association.prompt_id).await? {
      return Err(Error::PromptNotFound(association.prompt_id));
    }
    if !self.keyword_exists(association.keyword_id).await? {
      return Err(Error::KeywordNotFound(association.keyword_id));
    }

    let now = Utc::now();
    let prompt_id_str  = encode_uuid(association.prompt_id);
    let keyword_id_str = encode_uuid(association.keyword_id);
    let score          = association.score;
    let tier_str       = association.tier.to_string();
    let origin_str     = association.origin.to_string();
    let now_str        = encode_dt(now);

    // One atomic statement keyed by prompt_id; `created_at` survives a
    // replace so the row remembers when the prompt was first associated.
    let raw: RawAssociation = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO associations (
             prompt_id, keyword_id, score, tier, origin, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
           ON CONFLICT(prompt_id) DO UPDATE SET
             keyword_id = excluded.keyword_id,
             score      = excluded.score,
             tier       = excluded.tier,
             origin     = excluded.origin,
             updated_at = excluded.updated_at",
          rusqlite::params![
            prompt_id_str,
            keyword_id_str,
            score,
            tier_str,
            origin_str,
            now_str,
          ],
        )?;
        conn.query_row(
          "SELECT prompt_id, keyword_id, score, tier, origin,
                  created_at, updated_at
           FROM associations WHERE prompt_id = ?1",
          rusqlite::params![prompt_id_str],
          |row| {
            Ok(RawAssociation {
              prompt_id:  row.get(0)?,
              keyword_id: row.get(1)?,
              score:      row.get(2)?,
              tier:       row.get(3)?,
              origin:     row.get(4)?,
              created_at: row.get(5)?,
              updated_at: row.get(6)?,
            })
          },
        )
        .map_err(Into::into)
      })
      .await?;

    raw.into_association()
  }

  async fn delete_association(&self, prompt_id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(prompt_id);
    let deleted = self
      .conn
      .call(move |conn| {
        let n = conn.execute(
          "DELETE FROM associations WHERE prompt_id = ?1",
          rusqlite::params![id_str],
        )?;
        Ok(n > 0)
      })
      .await?;
    Ok(deleted)
  }

  async fn list_associations(
    &self,
    project_id: Uuid,
  ) -> Result<Vec<Association>> {
    let project_str = encode_uuid(project_id);

    let raws: Vec<RawAssociation> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT a.prompt_id, a.keyword_id, a.score, a.tier, a.origin,
                  a.created_at, a.updated_at
           FROM associations a
           JOIN prompts p ON p.prompt_id = a.prompt_id
           WHERE p.project_id = ?1
           ORDER BY a.prompt_id",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![project_str], |row| {
            Ok(RawAssociation {
              prompt_id:  row.get(0)?,
              keyword_id: row.get(1)?,
              score:      row.get(2)?,
              tier:       row.get(3)?,
              origin:     row.get(4)?,
              created_at: row.get(5)?,
              updated_at: row.get(6)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(RawAssociation::into_association)
      .collect()
  }

  // ── Answer facts — append-only writes ─────────────────────────────────────

  async fn record_fact(&self, input: NewAnswerFact) -> Result<AiAnswerFact> {
    let fact = AiAnswerFact {
      fact_id:         Uuid::new_v4(),
      prompt_id:       input.prompt_id,
      project_id:      input.project_id,
      model:           input.model,
      response:        input.response,
      brand_mentioned: input.brand_mentioned,
      brand_linked:    input.brand_linked,
      brand_position:  input.brand_position,
      competitors:     input.competitors,
      recorded_at:     Utc::now(),
    };

    let fact_id_str     = encode_uuid(fact.fact_id);
    let prompt_id_str   = encode_uuid(fact.prompt_id);
    let project_id_str  = encode_uuid(fact.project_id);
    let model           = fact.model.clone();
    let response        = fact.response.clone();
    let brand_mentioned = fact.brand_mentioned;
    let brand_linked    = fact.brand_linked;
    let brand_position  = fact.brand_position;
    let competitors_str = serde_json::to_string(&fact.competitors)?;
    let recorded_at_str = encode_dt(fact.recorded_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO answer_facts (
             fact_id, prompt_id, project_id, model, response,
             brand_mentioned, brand_linked, brand_position,
             competitors, recorded_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
          rusqlite::params![
            fact_id_str,
            prompt_id_str,
            project_id_str,
            model,
            response,
            brand_mentioned,
            brand_linked,
            brand_position,
            competitors_str,
            recorded_at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(fact)
  }

  async fn list_facts(
    &self,
    project_id: Uuid,
    since: Option<DateTime<Utc>>,
  ) -> Result<Vec<AiAnswerFact>> {
    let project_str = encode_uuid(project_id);
    let since_str = since.map(encode_dt);

    let raws: Vec<RawFact> = self
      .conn
      .call(move |conn| {
        let map_row = |row: &rusqlite::Row<'_>| {
          Ok(RawFact {
            fact_id:         row.get(0)?,
            prompt_id:       row.get(1)?,
            project_id:      row.get(2)?,
            model:           row.get(3)?,
            response:        row.get(4)?,
            brand_mentioned: row.get(5)?,
            brand_linked:    row.get(6)?,
            brand_position:  row.get(7)?,
            competitors:     row.get(8)?,
            recorded_at:     row.get(9)?,
          })
        };
        const COLUMNS: &str = "fact_id, prompt_id, project_id, model, \
                               response, brand_mentioned, brand_linked, \
                               brand_position, competitors, recorded_at";
        let rows = if let Some(since) = since_str {
          let mut stmt = conn.prepare(&format!(
            "SELECT {COLUMNS} FROM answer_facts
             WHERE project_id = ?1 AND recorded_at >= ?2
             ORDER BY recorded_at, fact_id",
          ))?;
          stmt
            .query_map(rusqlite::params![project_str, since], map_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        } else {
          let mut stmt = conn.prepare(&format!(
            "SELECT {COLUMNS} FROM answer_facts
             WHERE project_id = ?1
             ORDER BY recorded_at, fact_id",
          ))?;
          stmt
            .query_map(rusqlite::params![project_str], map_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawFact::into_fact).collect()
  }
}
