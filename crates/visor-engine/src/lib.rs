//! Matching and gap-scoring engine for Visor.
//!
//! Converts free-text prompts, SERP keyword imports, and raw AI answers into
//! associations, mention facts, gap worklists, and correlation reports. Pure
//! and synchronous; no HTTP or database dependencies. All I/O — loading
//! inputs, persisting association writes — belongs to the calling layer,
//! which may wrap these functions in any concurrency model it likes.
//!
//! # Quick start
//!
//! ```no_run
//! use visor_core::EngineConfig;
//! use visor_engine::{normalize::Normalizer, score};
//!
//! let config = EngineConfig::default();
//! let normalizer = Normalizer::from_config(&config);
//! let prompt  = normalizer.normalize("Quels sont les meilleurs casques gaming ?");
//! let keyword = normalizer.normalize("casque gaming");
//! let s = score::similarity(&prompt, &keyword, &config);
//! assert!(s >= config.auto_accept_threshold);
//! ```

pub mod classify;
pub mod correlate;
pub mod gap;
pub mod mention;
pub mod normalize;
pub mod resolve;
pub mod score;

pub use classify::{Classification, classify};
pub use mention::{MentionExtractor, extract_facts};
pub use resolve::{Resolution, resolve};
