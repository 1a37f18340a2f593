//! SQL schema for the Visor SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! the `PRAGMA user_version` number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS prompts (
    prompt_id   TEXT PRIMARY KEY,
    project_id  TEXT NOT NULL,
    name        TEXT NOT NULL,
    template    TEXT NOT NULL,
    tags        TEXT NOT NULL DEFAULT '[]',   -- JSON string list
    active      INTEGER NOT NULL DEFAULT 1
);

-- Keyword imports are append-only. A re-import inserts a new generation and
-- flips `active` off on the previous one; rows are never updated otherwise.
CREATE TABLE IF NOT EXISTS serp_keywords (
    keyword_id  TEXT PRIMARY KEY,
    project_id  TEXT NOT NULL,
    keyword     TEXT NOT NULL,
    normalized  TEXT NOT NULL,   -- canonical form used for matching
    volume      INTEGER,
    position    INTEGER NOT NULL,
    url         TEXT,
    imported_at TEXT NOT NULL,   -- ISO 8601 UTC; store-assigned
    active      INTEGER NOT NULL DEFAULT 1
);

-- At most one association per prompt; the upsert on prompt_id is the
-- single-writer guarantee the resolver relies on.
CREATE TABLE IF NOT EXISTS associations (
    prompt_id   TEXT PRIMARY KEY REFERENCES prompts(prompt_id),
    keyword_id  TEXT NOT NULL REFERENCES serp_keywords(keyword_id),
    score       REAL NOT NULL,
    tier        TEXT NOT NULL,   -- 'high' | 'medium' | 'low'
    origin      TEXT NOT NULL,   -- 'manual' | 'auto' | 'suggested'
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

-- Answer facts are strictly append-only.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS answer_facts (
    fact_id         TEXT PRIMARY KEY,
    prompt_id       TEXT NOT NULL REFERENCES prompts(prompt_id),
    project_id      TEXT NOT NULL,
    model           TEXT NOT NULL,
    response        TEXT NOT NULL,
    brand_mentioned INTEGER NOT NULL,
    brand_linked    INTEGER NOT NULL,
    brand_position  INTEGER,
    competitors     TEXT NOT NULL DEFAULT '[]',  -- JSON CompetitorMention list
    recorded_at     TEXT NOT NULL   -- ISO 8601 UTC; store-assigned
);

CREATE INDEX IF NOT EXISTS prompts_project_idx      ON prompts(project_id);
CREATE INDEX IF NOT EXISTS keywords_project_idx     ON serp_keywords(project_id, active);
CREATE INDEX IF NOT EXISTS keywords_normalized_idx  ON serp_keywords(normalized);
CREATE INDEX IF NOT EXISTS associations_keyword_idx ON associations(keyword_id);
CREATE INDEX IF NOT EXISTS facts_project_idx        ON answer_facts(project_id, recorded_at);
CREATE INDEX IF NOT EXISTS facts_prompt_idx         ON answer_facts(prompt_id, recorded_at);

PRAGMA user_version = 1;
";
