//! Prompt — a reusable question template tracked against AI models.
//!
//! Prompts are owned by the surrounding application; the engine only reads
//! them. Identity and template text are all the matcher needs.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A free-text prompt template belonging to a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prompt {
  pub prompt_id:  Uuid,
  pub project_id: Uuid,
  /// Short human-readable label, shown alongside suggestions.
  pub name:       String,
  /// The template text executed against AI models.
  pub template:   String,
  pub tags:       Vec<String>,
  /// Inactive prompts are skipped by the resolver.
  pub active:     bool,
}
