//! Core data types used throughout the grounding pipeline.
//!
//! These types represent the documents, chunks, and retrieval hits that
//! flow through ingestion and retrieval.

use serde::Serialize;
use std::fmt;

/// A source document stored in SQLite.
///
/// One row per `(source_kind, source_id)` pair. The stored content is the
/// change-detection fingerprint: re-ingesting compares the sanitized
/// incoming text against `content` verbatim.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: i64,
    pub source_kind: String,
    pub source_id: i64,
    pub title: Option<String>,
    pub content: String,
    pub metadata_json: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Which retrieval path produced a hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HitMode {
    Keyword,
    Semantic,
}

impl fmt::Display for HitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HitMode::Keyword => write!(f, "keyword"),
            HitMode::Semantic => write!(f, "semantic"),
        }
    }
}

/// A transient retrieval result referencing its originating chunk.
///
/// Produced fresh per query, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct Hit {
    pub mode: HitMode,
    pub score: f64,
    pub source_kind: String,
    pub source_id: i64,
    pub chunk_index: i64,
}

/// A hit paired with the chunk text it references; input to the context
/// assembler.
#[derive(Debug, Clone)]
pub struct RetrievedChunk {
    pub hit: Hit,
    pub content: String,
}
