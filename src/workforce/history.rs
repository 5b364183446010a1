//! Disk-backed conversation history with semantic retrieval.
//!
//! [`HistoryStore`] owns the ordered list of [`ConversationRecord`]s together
//! with the [`EmbeddingIndex`](crate::embedding::EmbeddingIndex) derived from
//! them, and keeps both mirrored to disk. It is the single writer for both
//! sides, which is what maintains the invariant that every record has exactly
//! one vector (checked again when a store is loaded).
//!
//! # Disk Format
//!
//! Two co-located artifacts per collection, loaded and saved together:
//!
//! ```text
//! <dir>/<collection>_records.json   human-readable JSON array of records
//! <dir>/<collection>_vectors.bin    bincode list of id-tagged vectors
//! ```
//!
//! Both files absent means "start empty". Exactly one present, or lists of
//! different lengths, is treated as a corrupt store and reported as an error
//! from [`HistoryStore::open`] rather than silently repaired.
//!
//! Persistence is best-effort on every append: the in-memory state is updated
//! first and a failed flush is logged as a warning without rolling anything
//! back. Callers that need a definite answer can invoke
//! [`HistoryStore::flush`] themselves.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

use crate::workforce::embedding::{Embedder, EmbeddingIndex, IndexEntry};

/// One persisted request/response/route log entry.
///
/// Records are immutable once stored; the only way to remove them is
/// [`HistoryStore::clear`], which empties the whole collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationRecord {
    /// Unique identifier, generated at creation, never reused.
    pub id: Uuid,
    /// Wall-clock creation time.
    pub timestamp: DateTime<Utc>,
    /// The user's request, verbatim.
    pub user_prompt: String,
    /// The manager's full response, verbatim.
    pub response_text: String,
    /// Single specialist name, a multi-step summary string, or `"None"`.
    pub route_label: String,
    /// Free text recorded when no route was found.
    pub suggestion_label: Option<String>,
    /// Character count of `user_prompt`, computed at write time.
    pub prompt_length: usize,
    /// Character count of `response_text`, computed at write time.
    pub response_length: usize,
}

/// One result from [`HistoryStore::similar`].
#[derive(Debug, Clone)]
pub struct SimilarConversation {
    /// Cosine similarity against the query.
    pub score: f32,
    /// The full matched record.
    pub record: ConversationRecord,
}

/// Read-only summary of a store, from [`HistoryStore::stats`].
#[derive(Debug, Clone)]
pub struct StoreStats {
    /// Number of stored conversations.
    pub count: usize,
    /// Embedding vector dimension.
    pub dimension: usize,
    /// Directory holding the persisted files.
    pub location: PathBuf,
}

/// Errors produced by the history store.
#[derive(Debug)]
pub enum HistoryError {
    /// Filesystem failure while loading or saving.
    Io(std::io::Error),
    /// The record list could not be serialized or parsed.
    Records(serde_json::Error),
    /// The vector list could not be encoded or decoded.
    Vectors(String),
    /// The embedding collaborator failed.
    Embedding(Box<dyn Error + Send + Sync>),
    /// The persisted files disagree with each other.
    Corrupt(String),
}

impl fmt::Display for HistoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryError::Io(err) => write!(f, "history store I/O error: {}", err),
            HistoryError::Records(err) => write!(f, "history record list error: {}", err),
            HistoryError::Vectors(msg) => write!(f, "history vector list error: {}", msg),
            HistoryError::Embedding(err) => write!(f, "embedding failed: {}", err),
            HistoryError::Corrupt(msg) => write!(f, "history store is corrupt: {}", msg),
        }
    }
}

impl Error for HistoryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            HistoryError::Io(err) => Some(err),
            HistoryError::Records(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for HistoryError {
    fn from(err: std::io::Error) -> Self {
        HistoryError::Io(err)
    }
}

impl From<serde_json::Error> for HistoryError {
    fn from(err: serde_json::Error) -> Self {
        HistoryError::Records(err)
    }
}

/// Persisted, semantically indexed log of manager interactions.
pub struct HistoryStore {
    dir: PathBuf,
    collection: String,
    records: Vec<ConversationRecord>,
    index: EmbeddingIndex,
}

impl HistoryStore {
    /// Open an existing collection or create an empty one.
    ///
    /// Loads both persisted files when they exist. A half-present pair or a
    /// record/vector length mismatch yields [`HistoryError::Corrupt`].
    pub fn open(
        dir: impl Into<PathBuf>,
        collection: &str,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self, HistoryError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;

        let records_path = Self::records_path_for(&dir, collection);
        let vectors_path = Self::vectors_path_for(&dir, collection);

        let (records, entries) = match (records_path.exists(), vectors_path.exists()) {
            (true, true) => {
                let records: Vec<ConversationRecord> =
                    serde_json::from_str(&fs::read_to_string(&records_path)?)?;
                let bytes = fs::read(&vectors_path)?;
                let (entries, _): (Vec<IndexEntry>, usize) =
                    bincode::serde::decode_from_slice(&bytes, bincode::config::standard())
                        .map_err(|err| HistoryError::Vectors(err.to_string()))?;
                if records.len() != entries.len() {
                    return Err(HistoryError::Corrupt(format!(
                        "{} records but {} vectors in '{}'",
                        records.len(),
                        entries.len(),
                        collection
                    )));
                }
                log::debug!(
                    "loaded history collection '{}' with {} conversations",
                    collection,
                    records.len()
                );
                (records, entries)
            }
            (false, false) => (Vec::new(), Vec::new()),
            (records_present, _) => {
                let (present, missing) = if records_present {
                    (&records_path, &vectors_path)
                } else {
                    (&vectors_path, &records_path)
                };
                return Err(HistoryError::Corrupt(format!(
                    "found {} without {}",
                    present.display(),
                    missing.display()
                )));
            }
        };

        Ok(Self {
            dir,
            collection: collection.to_string(),
            records,
            index: EmbeddingIndex::from_entries(embedder, entries),
        })
    }

    fn records_path_for(dir: &Path, collection: &str) -> PathBuf {
        dir.join(format!("{}_records.json", collection))
    }

    fn vectors_path_for(dir: &Path, collection: &str) -> PathBuf {
        dir.join(format!("{}_vectors.bin", collection))
    }

    fn records_path(&self) -> PathBuf {
        Self::records_path_for(&self.dir, &self.collection)
    }

    fn vectors_path(&self) -> PathBuf {
        Self::vectors_path_for(&self.dir, &self.collection)
    }

    /// Number of stored conversations.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store holds no conversations.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Create and store a record for one completed interaction.
    ///
    /// The embedding is derived from `"User: {prompt}\nManager: {response}"`.
    /// If the encoder fails, nothing is appended and the error is returned;
    /// record and vector are only ever added together. A failed flush after
    /// the in-memory append is logged as a warning, not returned.
    pub async fn append(
        &mut self,
        user_prompt: &str,
        response_text: &str,
        route_label: &str,
        suggestion_label: Option<&str>,
    ) -> Result<Uuid, HistoryError> {
        let record = ConversationRecord {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            user_prompt: user_prompt.to_string(),
            response_text: response_text.to_string(),
            route_label: route_label.to_string(),
            suggestion_label: suggestion_label.map(|s| s.to_string()),
            prompt_length: user_prompt.chars().count(),
            response_length: response_text.chars().count(),
        };
        let id = record.id;

        let combined = format!("User: {}\nManager: {}", user_prompt, response_text);
        self.index
            .add(id, &combined)
            .await
            .map_err(HistoryError::Embedding)?;
        self.records.push(record);

        if let Err(err) = self.flush() {
            log::warn!("failed to persist history store: {}", err);
        }

        log::debug!("stored conversation {} under route '{}'", id, route_label);
        Ok(id)
    }

    /// The most recent records, newest first, truncated to `limit`.
    ///
    /// Ordering is by wall-clock timestamp; records with equal timestamps
    /// keep their insertion order.
    pub fn recent(&self, limit: usize) -> Vec<&ConversationRecord> {
        let mut sorted: Vec<&ConversationRecord> = self.records.iter().collect();
        sorted.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        sorted.truncate(limit);
        sorted
    }

    /// The `k` stored conversations most similar to `query_text`.
    ///
    /// Never returns more than `min(k, len())` results; an empty store yields
    /// an empty list without touching the encoder.
    pub async fn similar(
        &self,
        query_text: &str,
        k: usize,
    ) -> Result<Vec<SimilarConversation>, HistoryError> {
        let hits = self
            .index
            .query(query_text, k)
            .await
            .map_err(HistoryError::Embedding)?;

        hits.into_iter()
            .map(|hit| {
                self.records
                    .iter()
                    .find(|record| record.id == hit.id)
                    .map(|record| SimilarConversation {
                        score: hit.score,
                        record: record.clone(),
                    })
                    .ok_or_else(|| {
                        HistoryError::Corrupt(format!(
                            "vector {} has no matching record",
                            hit.id
                        ))
                    })
            })
            .collect()
    }

    /// Empty the store and remove both persisted files.
    ///
    /// Subsequent appends start a fresh collection.
    pub fn clear(&mut self) -> Result<(), HistoryError> {
        self.records.clear();
        self.index.clear();

        for path in [self.records_path(), self.vectors_path()] {
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => return Err(err.into()),
            }
        }
        log::debug!("cleared history collection '{}'", self.collection);
        Ok(())
    }

    /// Read-only store summary. No side effects.
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            count: self.records.len(),
            dimension: self.index.dimension(),
            location: self.dir.clone(),
        }
    }

    /// Write both persisted files, replacing any previous contents.
    pub fn flush(&self) -> Result<(), HistoryError> {
        fs::create_dir_all(&self.dir)?;

        let json = serde_json::to_string_pretty(&self.records)?;
        fs::write(self.records_path(), json)?;

        let bytes = bincode::serde::encode_to_vec(
            self.index.entries(),
            bincode::config::standard(),
        )
        .map_err(|err| HistoryError::Vectors(err.to_string()))?;
        fs::write(self.vectors_path(), bytes)?;

        Ok(())
    }
}
