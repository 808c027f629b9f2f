//! Retrieval orchestration: keyword first, semantic fallback, then packing.
//!
//! Consumed by the enclosing chat layer, which injects the returned
//! context as an instruction before calling the language model. A
//! connectivity failure propagates as `Err` so the caller can tell it
//! apart from an Ok result with zero hits.

use anyhow::Result;
use sqlx::SqlitePool;
use tracing::debug;

use crate::assemble::assemble_context;
use crate::config::RetrievalConfig;
use crate::embedding::EmbeddingProvider;
use crate::models::Hit;
use crate::search::{keyword_search, semantic_search};

/// The outcome of one retrieval call.
///
/// `used` tells the caller whether any grounding context was assembled;
/// an empty context with `used == false` means "no grounding available",
/// not an error.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Retrieval {
    pub context: String,
    pub hits: Vec<Hit>,
    pub used: bool,
}

impl Retrieval {
    fn empty() -> Self {
        Self {
            context: String::new(),
            hits: Vec::new(),
            used: false,
        }
    }

    fn packed(context: String, hits: Vec<Hit>) -> Self {
        let used = !context.is_empty();
        Self { context, hits, used }
    }
}

/// Produce grounding context for a question.
///
/// Keyword hits are trusted unconditionally: any match, even a single
/// weak substring match, short-circuits the semantic path. The configured
/// `min_score` is deliberately not applied to either tier. Only when
/// keyword search comes back empty is the question embedded and scored
/// against the full chunk corpus.
pub async fn retrieve(
    pool: &SqlitePool,
    provider: &dyn EmbeddingProvider,
    config: &RetrievalConfig,
    question: &str,
) -> Result<Retrieval> {
    let question = question.trim();
    if !config.enabled || question.is_empty() {
        return Ok(Retrieval::empty());
    }

    let keyword_hits = keyword_search(pool, question, config.top_k).await?;
    if !keyword_hits.is_empty() {
        let (context, hits) = assemble_context(&keyword_hits, config.max_context_chars);
        return Ok(Retrieval::packed(context, hits));
    }

    debug!("no keyword hits, falling back to semantic search");
    let query_vec = provider.embed(question).await?;
    let semantic_hits = semantic_search(pool, &query_vec, config.top_k).await?;
    let (context, hits) = assemble_context(&semantic_hits, config.max_context_chars);
    Ok(Retrieval::packed(context, hits))
}
