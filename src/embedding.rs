//! Embedding provider abstraction and vector utilities.
//!
//! The provider is an explicitly constructed dependency: [`create_provider`]
//! builds it once at process start and callers pass it down. Encode calls
//! are side-effect-free and may be shared across tasks.
//!
//! Two implementations ship here:
//! - [`DisabledProvider`] — returns errors; keyword-only deployments.
//! - [`OpenAiProvider`] — calls the OpenAI embeddings API with retry and
//!   backoff, and L2-normalizes the returned vector so a dot product is
//!   equivalent to cosine similarity.
//!
//! Vector utilities cover the chunk store's BLOB format ([`encode_embedding`],
//! [`decode_embedding`]) and scoring ([`dot`]).

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::config::EmbeddingConfig;

/// Maps text to a fixed-dimension, L2-normalized vector.
///
/// Implementations must be deterministic for identical text under a fixed
/// model identity, and must return vectors of exactly `dims()` length.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Model identifier (e.g. `"text-embedding-3-small"`).
    fn model_name(&self) -> &str;
    /// Vector dimensionality.
    fn dims(&self) -> usize;
    /// Embed one text into a unit-length vector.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Build the configured provider. Called once at startup; the result is
/// shared by ingestion and retrieval.
pub fn create_provider(config: &EmbeddingConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    match config.provider.as_str() {
        "disabled" => Ok(Arc::new(DisabledProvider)),
        "openai" => Ok(Arc::new(OpenAiProvider::new(config)?)),
        other => bail!("Unknown embedding provider: {}", other),
    }
}

/// A no-op provider that always returns errors. Used when
/// `embedding.provider = "disabled"`: keyword search still works, the
/// semantic fallback surfaces a retrieval failure.
pub struct DisabledProvider;

#[async_trait]
impl EmbeddingProvider for DisabledProvider {
    fn model_name(&self) -> &str {
        "disabled"
    }
    fn dims(&self) -> usize {
        0
    }
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        bail!("Embedding provider is disabled")
    }
}

/// Embedding provider backed by the OpenAI embeddings API.
///
/// Requires `OPENAI_API_KEY` in the environment. The HTTP client carries
/// the configured request timeout, so a hung upstream surfaces as an
/// embed error rather than stalling retrieval indefinitely.
pub struct OpenAiProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    dims: usize,
    max_retries: u32,
}

impl OpenAiProvider {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let model = config
            .model
            .clone()
            .context("embedding.model required for OpenAI provider")?;
        let dims = config
            .dims
            .context("embedding.dims required for OpenAI provider")?;
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow::anyhow!("OPENAI_API_KEY environment variable not set"))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_key,
            model,
            dims,
            max_retries: config.max_retries,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiProvider {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn dims(&self) -> usize {
        self.dims
    }

    /// Retry strategy (exponential backoff, capped at 32s):
    /// - HTTP 429 and 5xx → retry
    /// - other 4xx → fail immediately
    /// - network error or timeout → retry
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let body = serde_json::json!({
            "model": self.model,
            "input": [text],
        });

        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                tokio::time::sleep(delay).await;
            }

            let resp = self
                .client
                .post("https://api.openai.com/v1/embeddings")
                .header("Authorization", format!("Bearer {}", self.api_key))
                .json(&body)
                .send()
                .await;

            match resp {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let json: serde_json::Value = response.json().await?;
                        let mut vec = parse_embedding_response(&json)?;
                        if vec.len() != self.dims {
                            bail!(
                                "embedding dimension mismatch: expected {}, got {}",
                                self.dims,
                                vec.len()
                            );
                        }
                        normalize(&mut vec);
                        return Ok(vec);
                    }

                    if status.as_u16() == 429 || status.is_server_error() {
                        let body_text = response.text().await.unwrap_or_default();
                        last_err =
                            Some(anyhow::anyhow!("embedding API error {}: {}", status, body_text));
                        continue;
                    }

                    let body_text = response.text().await.unwrap_or_default();
                    bail!("embedding API error {}: {}", status, body_text);
                }
                Err(e) => {
                    last_err = Some(e.into());
                    continue;
                }
            }
        }

        Err(last_err.unwrap_or_else(|| anyhow::anyhow!("embedding failed after retries")))
    }
}

/// Extract the first `data[].embedding` array from an embeddings API
/// response.
fn parse_embedding_response(json: &serde_json::Value) -> Result<Vec<f32>> {
    let embedding = json
        .get("data")
        .and_then(|d| d.as_array())
        .and_then(|d| d.first())
        .and_then(|item| item.get("embedding"))
        .and_then(|e| e.as_array())
        .ok_or_else(|| anyhow::anyhow!("Invalid embedding response: missing data[0].embedding"))?;

    Ok(embedding
        .iter()
        .map(|v| v.as_f64().unwrap_or(0.0) as f32)
        .collect())
}

/// Scale a vector to unit L2 norm in place. Zero vectors are left as-is.
pub fn normalize(vec: &mut [f32]) {
    let norm: f32 = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        for x in vec.iter_mut() {
            *x /= norm;
        }
    }
}

/// Why a stored vector was skipped during a semantic scan.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VectorDecodeError {
    #[error("embedding blob length {len} is not a multiple of 4")]
    TruncatedBlob { len: usize },
    #[error("embedding has {got} dimensions, expected {expected}")]
    DimensionMismatch { expected: usize, got: usize },
}

/// Encode a vector as little-endian f32 bytes for BLOB storage.
pub fn encode_embedding(vec: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(vec.len() * 4);
    for &v in vec {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes
}

/// Decode a stored BLOB back into a vector, verifying the expected
/// dimensionality when `expected_dims` is non-zero.
pub fn decode_embedding(blob: &[u8], expected_dims: usize) -> Result<Vec<f32>, VectorDecodeError> {
    if blob.len() % 4 != 0 {
        return Err(VectorDecodeError::TruncatedBlob { len: blob.len() });
    }

    let vec: Vec<f32> = blob
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();

    if expected_dims != 0 && vec.len() != expected_dims {
        return Err(VectorDecodeError::DimensionMismatch {
            expected: expected_dims,
            got: vec.len(),
        });
    }

    Ok(vec)
}

/// Dot product of two equal-length vectors. Both sides are expected to be
/// unit-normalized, which makes this equivalent to cosine similarity.
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blob_roundtrip() {
        let vec = vec![1.0f32, -2.5, 3.125, 0.0, -0.001];
        let blob = encode_embedding(&vec);
        assert_eq!(blob.len(), 20);
        assert_eq!(decode_embedding(&blob, 5).unwrap(), vec);
        assert_eq!(decode_embedding(&blob, 0).unwrap(), vec);
    }

    #[test]
    fn truncated_blob_is_reported() {
        let err = decode_embedding(&[1, 2, 3], 0).unwrap_err();
        assert_eq!(err, VectorDecodeError::TruncatedBlob { len: 3 });
    }

    #[test]
    fn dimension_mismatch_is_reported() {
        let blob = encode_embedding(&[1.0, 2.0]);
        let err = decode_embedding(&blob, 3).unwrap_err();
        assert_eq!(err, VectorDecodeError::DimensionMismatch { expected: 3, got: 2 });
    }

    #[test]
    fn normalize_produces_unit_length() {
        let mut v = vec![3.0f32, 4.0];
        normalize(&mut v);
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-6);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn normalize_leaves_zero_vector() {
        let mut v = vec![0.0f32, 0.0];
        normalize(&mut v);
        assert_eq!(v, vec![0.0, 0.0]);
    }

    #[test]
    fn dot_of_identical_unit_vectors_is_one() {
        let mut v = vec![1.0f32, 2.0, 3.0];
        normalize(&mut v);
        assert!((dot(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn dot_of_orthogonal_vectors_is_zero() {
        let a = vec![1.0f32, 0.0];
        let b = vec![0.0f32, 1.0];
        assert_eq!(dot(&a, &b), 0.0);
    }

    #[test]
    fn parse_response_extracts_first_embedding() {
        let json = serde_json::json!({
            "data": [{"embedding": [0.1, 0.2, 0.3]}]
        });
        let vec = parse_embedding_response(&json).unwrap();
        assert_eq!(vec.len(), 3);
        assert!((vec[1] - 0.2).abs() < 1e-6);
    }

    #[test]
    fn parse_response_rejects_missing_data() {
        let json = serde_json::json!({"error": "nope"});
        assert!(parse_embedding_response(&json).is_err());
    }
}
