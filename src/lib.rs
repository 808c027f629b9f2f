//! # Grounding
//!
//! A retrieval-augmented grounding core for conversational agents.
//!
//! Grounding turns heterogeneous source documents (a PDF, comment
//! history, chat logs) into searchable chunks, indexes them for keyword
//! and vector search in SQLite, and at query time packs the most relevant
//! chunks into a bounded-size context block for the enclosing chat layer
//! to inject before generation.
//!
//! ```text
//! ┌────────────┐   ┌──────────────────┐   ┌───────────┐
//! │ Extraction │──▶│    Ingestion      │──▶│  SQLite    │
//! │ front-ends │   │ sanitize+chunk    │   │ FTS5+BLOB │
//! └────────────┘   │ +embed (rebuild)  │   └─────┬─────┘
//!                  └──────────────────┘         │
//!                  ┌──────────────────┐         │
//!    question ────▶│    Retrieval      │◀────────┘
//!                  │ keyword → vector  │──▶ (context, hits)
//!                  │ → packing         │
//!                  └──────────────────┘
//! ```
//!
//! Retrieval is hybrid and precision-first: an FTS5/substring keyword
//! match is trusted unconditionally; only an empty keyword result falls
//! back to an exhaustive dot-product scan over stored embeddings.
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and validation |
//! | [`models`] | Core data types |
//! | [`sanitize`] | Ingestion text sanitation |
//! | [`chunk`] | Fixed-window text splitting |
//! | [`embedding`] | Embedding provider trait and vector utilities |
//! | [`ingest`] | Ingestion orchestration |
//! | [`search`] | Keyword search and the linear-scan vector scorer |
//! | [`assemble`] | Budget-constrained context packing |
//! | [`retrieve`] | Retrieval orchestration |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |
//! | [`stats`] | Corpus overview |

pub mod assemble;
pub mod chunk;
pub mod config;
pub mod db;
pub mod embedding;
pub mod ingest;
pub mod migrate;
pub mod models;
pub mod retrieve;
pub mod sanitize;
pub mod search;
pub mod stats;
