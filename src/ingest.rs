//! Ingestion orchestration: sanitation, change detection, chunk rebuild.
//!
//! Re-ingesting a source whose sanitized text matches the stored content
//! is a no-op, which makes scheduled re-ingestion cheap. A content change
//! replaces the document wholly and rebuilds its chunk set from scratch
//! inside one transaction; there is no incremental diffing.

use anyhow::Result;
use sqlx::{Row, SqlitePool};
use tracing::warn;

use crate::chunk::split_text;
use crate::config::Config;
use crate::embedding::{encode_embedding, EmbeddingProvider};
use crate::models::Document;
use crate::sanitize::sanitize_text;

/// Rough chars-per-token ratio for the stored token-count annotation.
const CHARS_PER_TOKEN: usize = 4;

/// One logical source document handed in by an extraction front-end.
#[derive(Debug, Clone)]
pub struct IngestInput {
    pub source_kind: String,
    pub source_id: i64,
    pub title: Option<String>,
    pub text: String,
    pub metadata: serde_json::Value,
}

/// What the orchestrator did with the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestStatus {
    Created,
    Updated,
    Unchanged,
}

impl IngestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IngestStatus::Created => "created",
            IngestStatus::Updated => "updated",
            IngestStatus::Unchanged => "unchanged",
        }
    }
}

/// Summary of a single-document ingest run.
#[derive(Debug, Clone)]
pub struct IngestReport {
    pub status: IngestStatus,
    pub chunks: usize,
    pub embedded: usize,
    pub embed_failures: usize,
}

/// Fetch a stored document by its `(source_kind, source_id)` key.
pub async fn get_document(
    pool: &SqlitePool,
    source_kind: &str,
    source_id: i64,
) -> Result<Option<Document>> {
    let row = sqlx::query(
        r#"
        SELECT id, source_kind, source_id, title, content, metadata_json, created_at, updated_at
        FROM documents
        WHERE source_kind = ? AND source_id = ?
        "#,
    )
    .bind(source_kind)
    .bind(source_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| Document {
        id: r.get("id"),
        source_kind: r.get("source_kind"),
        source_id: r.get("source_id"),
        title: r.get("title"),
        content: r.get("content"),
        metadata_json: r.get("metadata_json"),
        created_at: r.get("created_at"),
        updated_at: r.get("updated_at"),
    }))
}

/// Index one source document: insert it if new, replace content and
/// rebuild all chunks if it changed, do nothing if it is identical.
///
/// A chunk whose embedding fails is still persisted (without a vector) so
/// keyword search keeps covering it; the failure is logged and counted in
/// the report, and the rest of the document proceeds.
pub async fn ingest_document(
    pool: &SqlitePool,
    provider: &dyn EmbeddingProvider,
    config: &Config,
    input: &IngestInput,
) -> Result<IngestReport> {
    let content = sanitize_text(&input.text);
    let metadata_json = serde_json::to_string(&input.metadata)?;

    let existing = get_document(pool, &input.source_kind, input.source_id).await?;

    let status = match &existing {
        Some(doc) if doc.content == content => {
            return Ok(IngestReport {
                status: IngestStatus::Unchanged,
                chunks: 0,
                embedded: 0,
                embed_failures: 0,
            });
        }
        Some(_) => IngestStatus::Updated,
        None => IngestStatus::Created,
    };

    // Split and embed before touching the store, so the write transaction
    // stays short. The embed loop is the slow part of ingestion.
    let pieces = split_text(
        &content,
        config.chunking.window_chars,
        config.chunking.overlap_chars,
    )?;

    let mut rows: Vec<(i64, &str, Option<Vec<u8>>, i64)> = Vec::with_capacity(pieces.len());
    let mut embedded = 0usize;
    let mut embed_failures = 0usize;

    for (idx, piece) in pieces.iter().enumerate() {
        let vector = match provider.embed(piece).await {
            Ok(v) => {
                embedded += 1;
                Some(encode_embedding(&v))
            }
            Err(e) => {
                warn!(
                    source_kind = %input.source_kind,
                    source_id = input.source_id,
                    chunk_index = idx,
                    error = %e,
                    "embedding failed; storing chunk without a vector"
                );
                embed_failures += 1;
                None
            }
        };
        let token_count = (piece.chars().count() / CHARS_PER_TOKEN) as i64;
        rows.push((idx as i64, piece.as_str(), vector, token_count));
    }

    let now = chrono::Utc::now().timestamp();
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO documents (source_kind, source_id, title, content, metadata_json, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(source_kind, source_id) DO UPDATE SET
            title = excluded.title,
            content = excluded.content,
            metadata_json = excluded.metadata_json,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(&input.source_kind)
    .bind(input.source_id)
    .bind(&input.title)
    .bind(&content)
    .bind(&metadata_json)
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    let doc_id: i64 =
        sqlx::query_scalar("SELECT id FROM documents WHERE source_kind = ? AND source_id = ?")
            .bind(&input.source_kind)
            .bind(input.source_id)
            .fetch_one(&mut *tx)
            .await?;

    sqlx::query("DELETE FROM chunks_fts WHERE document_id = ?")
        .bind(doc_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM chunks WHERE document_id = ?")
        .bind(doc_id)
        .execute(&mut *tx)
        .await?;

    for (chunk_index, text, vector, token_count) in &rows {
        let result = sqlx::query(
            r#"
            INSERT INTO chunks (document_id, chunk_index, content, embedding, token_count)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(doc_id)
        .bind(*chunk_index)
        .bind(*text)
        .bind(vector.as_deref())
        .bind(*token_count)
        .execute(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO chunks_fts (content, chunk_id, document_id) VALUES (?, ?, ?)")
            .bind(*text)
            .bind(result.last_insert_rowid())
            .bind(doc_id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    Ok(IngestReport {
        status,
        chunks: rows.len(),
        embedded,
        embed_failures,
    })
}
