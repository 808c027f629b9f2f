//! Corpus overview for the `stats` command.
//!
//! A quick summary of what's indexed: document counts, chunk counts, and
//! embedding coverage, broken down by source kind. Gives confidence that
//! ingestion runs are doing what they should.

use anyhow::Result;
use sqlx::{Row, SqlitePool};
use std::path::Path;

struct KindStats {
    source_kind: String,
    doc_count: i64,
    chunk_count: i64,
    embedded_count: i64,
}

pub async fn run_stats(pool: &SqlitePool, db_path: &Path) -> Result<()> {
    let total_docs: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents")
        .fetch_one(pool)
        .await?;

    let total_chunks: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chunks")
        .fetch_one(pool)
        .await?;

    let total_embedded: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM chunks WHERE embedding IS NOT NULL")
            .fetch_one(pool)
            .await?;

    let db_size = std::fs::metadata(db_path).map(|m| m.len()).unwrap_or(0);

    println!("Grounding — Corpus Stats");
    println!("========================");
    println!();
    println!("  Database:    {}", db_path.display());
    println!("  Size:        {}", format_bytes(db_size));
    println!();
    println!("  Documents:   {}", total_docs);
    println!("  Chunks:      {}", total_chunks);
    println!(
        "  Embedded:    {} / {} ({}%)",
        total_embedded,
        total_chunks,
        if total_chunks > 0 {
            (total_embedded * 100) / total_chunks
        } else {
            0
        }
    );

    let rows = sqlx::query(
        r#"
        SELECT
            d.source_kind,
            COUNT(DISTINCT d.id) AS doc_count,
            COUNT(c.id) AS chunk_count,
            COUNT(c.embedding) AS embedded_count
        FROM documents d
        LEFT JOIN chunks c ON c.document_id = d.id
        GROUP BY d.source_kind
        ORDER BY doc_count DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    let by_kind: Vec<KindStats> = rows
        .iter()
        .map(|row| KindStats {
            source_kind: row.get("source_kind"),
            doc_count: row.get("doc_count"),
            chunk_count: row.get("chunk_count"),
            embedded_count: row.get("embedded_count"),
        })
        .collect();

    if !by_kind.is_empty() {
        println!();
        println!("  By source kind:");
        println!(
            "  {:<20} {:>6} {:>8} {:>10}",
            "KIND", "DOCS", "CHUNKS", "EMBEDDED"
        );
        println!("  {}", "-".repeat(48));
        for s in &by_kind {
            println!(
                "  {:<20} {:>6} {:>8} {:>10}",
                s.source_kind, s.doc_count, s.chunk_count, s.embedded_count
            );
        }
    }

    println!();
    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
