//! Text embedding and nearest-neighbour lookup.
//!
//! [`Embedder`] abstracts the hosted text-to-vector encoder, and
//! [`EmbeddingIndex`] maintains a flat, id-tagged list of vectors with cosine
//! top-k queries over it. The index is intentionally simple: a linear scan is
//! exact, stable, and more than fast enough for a conversation history that
//! grows by one entry per interaction.
//!
//! Every stored vector carries the [`Uuid`] of the conversation record it was
//! derived from, so lookups join back to records by identifier rather than by
//! array position.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::sync::Arc;
use uuid::Uuid;

use crate::workforce::clients::shared_http_client;

/// A text-to-vector encoder.
///
/// Implementations must be deterministic: the same text yields the same
/// vector. Encoder unavailability at startup is fatal for the whole system;
/// there is no degraded mode without similarity search.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Encode the given text into a fixed-length vector.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, Box<dyn Error + Send + Sync>>;

    /// Length of the vectors produced by [`Embedder::embed`].
    fn dimension(&self) -> usize;
}

/// Hosted embedder backed by OpenAI's embeddings endpoint.
pub struct OpenAiEmbedder {
    http: reqwest::Client,
    api_key: String,
    model: String,
    dimension: usize,
    base_url: String,
}

impl OpenAiEmbedder {
    /// Create an embedder using the default model (`text-embedding-3-small`, 1536 dims).
    pub fn new(secret_key: &str) -> Self {
        Self::new_with_model(secret_key, "text-embedding-3-small", 1536)
    }

    /// Create an embedder for an explicit model name and vector dimension.
    pub fn new_with_model(secret_key: &str, model: &str, dimension: usize) -> Self {
        Self::new_with_base_url(secret_key, model, dimension, "https://api.openai.com/v1")
    }

    /// Create an embedder targeting a custom OpenAI compatible base URL.
    pub fn new_with_base_url(
        secret_key: &str,
        model: &str,
        dimension: usize,
        base_url: &str,
    ) -> Self {
        OpenAiEmbedder {
            http: shared_http_client(),
            api_key: secret_key.to_string(),
            model: model.to_string(),
            dimension,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, Box<dyn Error + Send + Sync>> {
        let response = self
            .http
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({
                "model": self.model,
                "input": text,
            }))
            .send()
            .await
            .map_err(|err| format!("embedding request failed: {}", err))?;

        if !response.status().is_success() {
            return Err(format!(
                "embedding request failed with status {}",
                response.status()
            )
            .into());
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|err| format!("embedding response was not valid JSON: {}", err))?;

        let vector = parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or("embedding response contained no vectors")?;

        if vector.len() != self.dimension {
            log::warn!(
                "embedding dimension mismatch: expected {}, got {}",
                self.dimension,
                vector.len()
            );
        }

        Ok(vector)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// One stored vector, tagged with the id of the record it was derived from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Identifier of the owning conversation record.
    pub id: Uuid,
    /// The encoded vector.
    pub vector: Vec<f32>,
}

/// One result from [`EmbeddingIndex::query`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarityHit {
    /// Identifier of the matched record.
    pub id: Uuid,
    /// Cosine similarity against the query vector, in `[-1.0, 1.0]`.
    pub score: f32,
}

/// Flat in-memory list of id-tagged vectors with exact cosine top-k queries.
pub struct EmbeddingIndex {
    embedder: Arc<dyn Embedder>,
    entries: Vec<IndexEntry>,
}

impl EmbeddingIndex {
    /// Create an empty index over the given encoder.
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self::from_entries(embedder, Vec::new())
    }

    /// Rebuild an index from previously persisted entries.
    pub fn from_entries(embedder: Arc<dyn Embedder>, entries: Vec<IndexEntry>) -> Self {
        Self { embedder, entries }
    }

    /// Number of stored vectors.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index holds no vectors.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Vector length reported by the underlying encoder.
    pub fn dimension(&self) -> usize {
        self.embedder.dimension()
    }

    /// The stored entries, in insertion order. Used for persistence.
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// Encode `text` and append the resulting vector under `id`.
    pub async fn add(
        &mut self,
        id: Uuid,
        text: &str,
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        let vector = self.embedder.embed(text).await?;
        self.entries.push(IndexEntry { id, vector });
        Ok(())
    }

    /// Encode `text` and return the top `k` stored vectors by descending
    /// cosine similarity.
    ///
    /// `k` is clamped to the current store size. Ties keep insertion order
    /// (the sort is stable). Querying an empty index returns an empty list
    /// without calling the encoder.
    pub async fn query(
        &self,
        text: &str,
        k: usize,
    ) -> Result<Vec<SimilarityHit>, Box<dyn Error + Send + Sync>> {
        if self.entries.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let query_vector = self.embedder.embed(text).await?;

        let mut hits: Vec<SimilarityHit> = self
            .entries
            .iter()
            .map(|entry| SimilarityHit {
                id: entry.id,
                score: cosine_similarity(&query_vector, &entry.vector),
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(k);

        Ok(hits)
    }

    /// Drop every stored vector.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Cosine similarity between two vectors.
///
/// Accumulates in `f64` to limit rounding drift on long vectors. Returns
/// `0.0` for mismatched lengths or zero-norm inputs.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (&x, &y) in a.iter().zip(b.iter()) {
        let x64 = f64::from(x);
        let y64 = f64::from(y);
        dot += x64 * y64;
        norm_a += x64 * x64;
        norm_b += y64 * y64;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom <= f64::EPSILON {
        return 0.0;
    }

    (dot / denom) as f32
}
