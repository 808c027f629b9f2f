//! Keyword and semantic retrieval over the chunk store.
//!
//! Keyword search is the cheap primary path: an FTS5 MATCH, falling back
//! to a plain substring scan when the match yields nothing (or the query
//! trips FTS operator syntax). Semantic search is the expensive fallback:
//! an exhaustive dot-product scan over every stored chunk vector. The
//! linear scan is acceptable at this corpus scale; any replacement must
//! keep the ranking contract (descending similarity, stable ties).

use anyhow::Result;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use crate::embedding::{decode_embedding, dot};
use crate::models::{Hit, HitMode, RetrievedChunk};

/// Fixed confidence for a full-text match.
const FULLTEXT_SCORE: f64 = 1.0;
/// Fixed confidence for the substring fallback tier.
const SUBSTRING_SCORE: f64 = 0.9;

/// Return up to `k` chunks whose text matches `query`, tagged
/// `mode = keyword`.
///
/// Two tiers, not a continuous scale: a full-text match scores 1.0, the
/// substring fallback 0.9. Ties keep arrival order. An FTS query-engine
/// error (user questions are passed through verbatim and may contain
/// operator syntax) is treated as zero full-text rows, never surfaced.
pub async fn keyword_search(
    pool: &SqlitePool,
    query: &str,
    k: i64,
) -> Result<Vec<RetrievedChunk>> {
    let fulltext = match fetch_fulltext(pool, query, k).await {
        Ok(rows) => rows,
        Err(e) => {
            debug!(error = %e, "full-text match failed, trying substring scan");
            Vec::new()
        }
    };

    if !fulltext.is_empty() {
        return Ok(fulltext);
    }

    fetch_substring(pool, query, k).await
}

async fn fetch_fulltext(pool: &SqlitePool, query: &str, k: i64) -> Result<Vec<RetrievedChunk>> {
    let rows = sqlx::query(
        r#"
        SELECT d.source_kind, d.source_id, c.chunk_index, c.content
        FROM chunks_fts f
        JOIN chunks c ON c.id = f.chunk_id
        JOIN documents d ON d.id = c.document_id
        WHERE chunks_fts MATCH ?
        LIMIT ?
        "#,
    )
    .bind(query)
    .bind(k)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|row| to_retrieved(row, HitMode::Keyword, FULLTEXT_SCORE))
        .collect())
}

async fn fetch_substring(pool: &SqlitePool, query: &str, k: i64) -> Result<Vec<RetrievedChunk>> {
    let pattern = format!("%{}%", escape_like(query));

    let rows = sqlx::query(
        r#"
        SELECT d.source_kind, d.source_id, c.chunk_index, c.content
        FROM chunks c
        JOIN documents d ON d.id = c.document_id
        WHERE c.content LIKE ? ESCAPE '\'
        LIMIT ?
        "#,
    )
    .bind(&pattern)
    .bind(k)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|row| to_retrieved(row, HitMode::Keyword, SUBSTRING_SCORE))
        .collect())
}

/// Scan every stored chunk vector, score by dot product against
/// `query_vec`, and return the top `k` tagged `mode = semantic`.
///
/// Chunks without a vector and rows whose BLOB does not decode to the
/// query's dimensionality are skipped (counted, never fatal) so one bad
/// row cannot block retrieval. Sorting is stable: equal scores keep the
/// scan order, which is fixed at `(document_id, chunk_index)`.
pub async fn semantic_search(
    pool: &SqlitePool,
    query_vec: &[f32],
    k: i64,
) -> Result<Vec<RetrievedChunk>> {
    let rows = sqlx::query(
        r#"
        SELECT d.source_kind, d.source_id, c.chunk_index, c.content, c.embedding
        FROM chunks c
        JOIN documents d ON d.id = c.document_id
        ORDER BY c.document_id, c.chunk_index
        "#,
    )
    .fetch_all(pool)
    .await?;

    let mut scored: Vec<RetrievedChunk> = Vec::new();
    let mut missing = 0usize;
    let mut undecodable = 0usize;

    for row in &rows {
        let blob: Option<Vec<u8>> = row.get("embedding");
        let Some(blob) = blob else {
            missing += 1;
            continue;
        };

        let vector = match decode_embedding(&blob, query_vec.len()) {
            Ok(v) => v,
            Err(reason) => {
                debug!(%reason, "skipping chunk with undecodable vector");
                undecodable += 1;
                continue;
            }
        };

        let score = dot(query_vec, &vector) as f64;
        scored.push(to_retrieved(row, HitMode::Semantic, score));
    }

    if missing > 0 || undecodable > 0 {
        debug!(missing, undecodable, "semantic scan skipped chunks without usable vectors");
    }

    scored.sort_by(|a, b| {
        b.hit
            .score
            .partial_cmp(&a.hit.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    scored.truncate(k.max(0) as usize);

    Ok(scored)
}

fn to_retrieved(row: &sqlx::sqlite::SqliteRow, mode: HitMode, score: f64) -> RetrievedChunk {
    RetrievedChunk {
        hit: Hit {
            mode,
            score,
            source_kind: row.get("source_kind"),
            source_id: row.get("source_id"),
            chunk_index: row.get("chunk_index"),
        },
        content: row.get("content"),
    }
}

/// Escape LIKE wildcards so the query is matched as a literal substring.
fn escape_like(query: &str) -> String {
    let mut out = String::with_capacity(query.len());
    for ch in query.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}
