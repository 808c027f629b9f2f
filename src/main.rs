//! # Grounding CLI (`grd`)
//!
//! Operational front-end over the grounding library: initialize the
//! database, ingest source documents, and run retrieval queries.
//!
//! ## Usage
//!
//! ```bash
//! grd --config ./config/grounding.toml <command>
//! ```
//!
//! | Command | Description |
//! |---------|-------------|
//! | `grd init` | Create the SQLite database and run schema migrations |
//! | `grd ingest` | Index one source document from a file or stdin |
//! | `grd ask "<question>"` | Retrieve grounding context for a question |
//! | `grd stats` | Show document, chunk, and embedding counts |
//!
//! ## Examples
//!
//! ```bash
//! grd init
//! grd ingest --kind pdf --id 0 --title whitepaper.pdf --file extracted.txt
//! grd ingest --kind chat-log --id 42 --meta table=chat_log < message.txt
//! grd ask "what does the protocol charge per transfer?"
//! grd ask "fee schedule" --json
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::PathBuf;

use grounding::config::load_config;
use grounding::ingest::{ingest_document, IngestInput};
use grounding::{db, embedding, migrate, retrieve, stats};

/// Grounding — a retrieval-augmented grounding core for conversational
/// agents.
#[derive(Parser)]
#[command(
    name = "grd",
    about = "Grounding — retrieval-augmented context over a private corpus",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/grounding.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema. Idempotent.
    Init,

    /// Ingest one source document.
    ///
    /// Reads the document text from `--file` or stdin, sanitizes it, and
    /// indexes it under (kind, id). Re-running with identical text is a
    /// no-op; changed text replaces the document and rebuilds its chunks.
    Ingest {
        /// Source kind, e.g. `pdf`, `comment-thread`, `chat-log`.
        #[arg(long)]
        kind: String,

        /// Caller-defined numeric source id.
        #[arg(long)]
        id: i64,

        /// Optional document title.
        #[arg(long)]
        title: Option<String>,

        /// Read the document text from this file instead of stdin.
        #[arg(long)]
        file: Option<PathBuf>,

        /// Metadata entries stored with the document.
        #[arg(long = "meta", value_name = "KEY=VALUE")]
        meta: Vec<String>,
    },

    /// Retrieve grounding context for a question.
    Ask {
        /// The question string.
        question: String,

        /// Print the machine-readable result (context, hits, used flag).
        #[arg(long)]
        json: bool,
    },

    /// Show document, chunk, and embedding counts.
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            let pool = db::connect(&config.db.path).await?;
            migrate::run_migrations(&pool).await?;
            println!("initialized {}", config.db.path.display());
            pool.close().await;
        }

        Commands::Ingest {
            kind,
            id,
            title,
            file,
            meta,
        } => {
            let text = match &file {
                Some(path) => std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read {}", path.display()))?,
                None => {
                    let mut buf = String::new();
                    std::io::stdin()
                        .read_to_string(&mut buf)
                        .context("Failed to read document text from stdin")?;
                    buf
                }
            };

            let provider = embedding::create_provider(&config.embedding)?;
            let pool = db::connect(&config.db.path).await?;

            let input = IngestInput {
                source_kind: kind.clone(),
                source_id: id,
                title,
                text,
                metadata: parse_meta(&meta)?,
            };
            let report = ingest_document(&pool, provider.as_ref(), &config, &input).await?;

            println!("ingest {}:{}", kind, id);
            println!("  status: {}", report.status.as_str());
            println!("  chunks: {}", report.chunks);
            if config.embedding.is_enabled() {
                println!("  embedded: {}", report.embedded);
                println!("  embed failures: {}", report.embed_failures);
            }
            pool.close().await;
        }

        Commands::Ask { question, json } => {
            let provider = embedding::create_provider(&config.embedding)?;
            let pool = db::connect(&config.db.path).await?;

            let result =
                retrieve::retrieve(&pool, provider.as_ref(), &config.retrieval, &question).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else if result.used {
                println!("{}", result.context);
                println!();
                for hit in &result.hits {
                    println!(
                        "  [{} {:.4}] {}:{} chunk {}",
                        hit.mode, hit.score, hit.source_kind, hit.source_id, hit.chunk_index
                    );
                }
            } else {
                println!("(no grounding available)");
            }
            pool.close().await;
        }

        Commands::Stats => {
            let pool = db::connect(&config.db.path).await?;
            stats::run_stats(&pool, &config.db.path).await?;
            pool.close().await;
        }
    }

    Ok(())
}

/// Parse repeated `key=value` flags into a JSON object.
fn parse_meta(entries: &[String]) -> Result<serde_json::Value> {
    let mut map = serde_json::Map::new();
    for entry in entries {
        let (key, value) = entry
            .split_once('=')
            .with_context(|| format!("Invalid --meta entry '{}', expected KEY=VALUE", entry))?;
        map.insert(key.to_string(), serde_json::Value::String(value.to_string()));
    }
    Ok(serde_json::Value::Object(map))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_meta_builds_object() {
        let meta = parse_meta(&["table=chat_log".to_string(), "lang=ko".to_string()]).unwrap();
        assert_eq!(meta["table"], "chat_log");
        assert_eq!(meta["lang"], "ko");
    }

    #[test]
    fn parse_meta_rejects_missing_separator() {
        assert!(parse_meta(&["oops".to_string()]).is_err());
    }
}
