use async_trait::async_trait;
use std::error::Error;
use std::sync::Arc;
use workforce::embedding::Embedder;
use workforce::history::{HistoryError, HistoryStore};

/// Deterministic bag-of-bytes encoder: same text, same vector.
struct MockEmbedder {
    dimension: usize,
}

impl MockEmbedder {
    fn shared() -> Arc<dyn Embedder> {
        Arc::new(MockEmbedder { dimension: 16 })
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, Box<dyn Error + Send + Sync>> {
        let mut vector = vec![0.0f32; self.dimension];
        for byte in text.bytes() {
            vector[byte as usize % self.dimension] += 1.0;
        }
        Ok(vector)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Encoder that always fails, for append-failure coverage.
struct FailingEmbedder;

#[async_trait]
impl Embedder for FailingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, Box<dyn Error + Send + Sync>> {
        Err("encoder offline".into())
    }

    fn dimension(&self) -> usize {
        16
    }
}

#[tokio::test]
async fn test_append_then_recent_is_reverse_chronological() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = HistoryStore::open(dir.path(), "chat_history", MockEmbedder::shared()).unwrap();

    store
        .append("first request", "first response", "Web Scraper", None)
        .await
        .unwrap();
    store
        .append("second request", "second response", "Data Analyst", None)
        .await
        .unwrap();
    store
        .append("third request", "third response", "None", Some("no fit"))
        .await
        .unwrap();

    assert_eq!(store.len(), 3);

    let recent = store.recent(10);
    assert_eq!(recent.len(), 3);
    assert_eq!(recent[0].user_prompt, "third request");
    assert_eq!(recent[1].user_prompt, "second request");
    assert_eq!(recent[2].user_prompt, "first request");
    assert_eq!(recent[0].suggestion_label.as_deref(), Some("no fit"));

    let limited = store.recent(2);
    assert_eq!(limited.len(), 2);
    assert_eq!(limited[0].user_prompt, "third request");
}

#[tokio::test]
async fn test_record_derived_fields() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = HistoryStore::open(dir.path(), "chat_history", MockEmbedder::shared()).unwrap();

    store
        .append("hello", "a longer response text", "Content Writer", None)
        .await
        .unwrap();

    let recent = store.recent(1);
    assert_eq!(recent[0].prompt_length, 5);
    assert_eq!(recent[0].response_length, "a longer response text".chars().count());
    assert_eq!(recent[0].route_label, "Content Writer");
}

#[tokio::test]
async fn test_similar_clamps_and_handles_empty_store() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = HistoryStore::open(dir.path(), "chat_history", MockEmbedder::shared()).unwrap();

    let empty = store.similar("anything", 5).await.unwrap();
    assert!(empty.is_empty());

    store
        .append("scrape prices from example.com", "done", "Web Scraper", None)
        .await
        .unwrap();
    store
        .append("write a poem about rust", "done", "Content Writer", None)
        .await
        .unwrap();

    let hits = store.similar("scrape prices", 10).await.unwrap();
    assert_eq!(hits.len(), 2);
    for pair in hits.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
    // Full records are re-attached to every hit.
    assert!(hits.iter().all(|h| !h.record.response_text.is_empty()));
}

#[tokio::test]
async fn test_persistence_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    {
        let mut store =
            HistoryStore::open(dir.path(), "chat_history", MockEmbedder::shared()).unwrap();
        store
            .append("request one", "response one", "Data Analyst", None)
            .await
            .unwrap();
        store
            .append("request two", "response two", "Web Scraper", None)
            .await
            .unwrap();
    }

    let reopened = HistoryStore::open(dir.path(), "chat_history", MockEmbedder::shared()).unwrap();
    assert_eq!(reopened.len(), 2);

    let recent = reopened.recent(10);
    assert_eq!(recent[0].user_prompt, "request two");
    assert_eq!(recent[1].user_prompt, "request one");
    assert_eq!(recent[1].route_label, "Data Analyst");
}

#[tokio::test]
async fn test_similar_works_after_reload() {
    let dir = tempfile::tempdir().unwrap();
    {
        let mut store =
            HistoryStore::open(dir.path(), "chat_history", MockEmbedder::shared()).unwrap();
        store
            .append("alpha beta", "gamma", "Content Writer", None)
            .await
            .unwrap();
    }

    let reopened = HistoryStore::open(dir.path(), "chat_history", MockEmbedder::shared()).unwrap();
    let hits = reopened.similar("alpha beta", 1).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].record.user_prompt, "alpha beta");
}

#[tokio::test]
async fn test_half_present_files_are_corrupt() {
    let dir = tempfile::tempdir().unwrap();
    {
        let mut store =
            HistoryStore::open(dir.path(), "chat_history", MockEmbedder::shared()).unwrap();
        store
            .append("request", "response", "Data Analyst", None)
            .await
            .unwrap();
    }

    std::fs::remove_file(dir.path().join("chat_history_vectors.bin")).unwrap();

    let result = HistoryStore::open(dir.path(), "chat_history", MockEmbedder::shared());
    assert!(matches!(result, Err(HistoryError::Corrupt(_))));
}

#[tokio::test]
async fn test_failed_embedding_appends_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let mut store =
        HistoryStore::open(dir.path(), "chat_history", Arc::new(FailingEmbedder)).unwrap();

    let result = store.append("request", "response", "Data Analyst", None).await;
    assert!(matches!(result, Err(HistoryError::Embedding(_))));
    assert_eq!(store.len(), 0);
    assert!(store.recent(10).is_empty());
}

#[tokio::test]
async fn test_clear_empties_store_and_removes_files() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = HistoryStore::open(dir.path(), "chat_history", MockEmbedder::shared()).unwrap();

    for i in 0..5 {
        store
            .append(&format!("request {}", i), "response", "Data Analyst", None)
            .await
            .unwrap();
    }
    assert_eq!(store.stats().count, 5);

    store.clear().unwrap();
    assert_eq!(store.stats().count, 0);
    assert!(store.recent(10).is_empty());
    assert!(!dir.path().join("chat_history_records.json").exists());
    assert!(!dir.path().join("chat_history_vectors.bin").exists());

    // Appends after a clear start a fresh collection.
    store
        .append("fresh request", "fresh response", "Web Scraper", None)
        .await
        .unwrap();
    assert_eq!(store.stats().count, 1);
}

#[tokio::test]
async fn test_stats_reports_dimension_and_location() {
    let dir = tempfile::tempdir().unwrap();
    let store = HistoryStore::open(dir.path(), "chat_history", MockEmbedder::shared()).unwrap();

    let stats = store.stats();
    assert_eq!(stats.count, 0);
    assert_eq!(stats.dimension, 16);
    assert_eq!(stats.location, dir.path());
}

#[tokio::test]
async fn test_explicit_flush_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = HistoryStore::open(dir.path(), "chat_history", MockEmbedder::shared()).unwrap();
    store
        .append("request", "response", "Data Analyst", None)
        .await
        .unwrap();

    store.flush().unwrap();
    assert!(dir.path().join("chat_history_records.json").exists());
    assert!(dir.path().join("chat_history_vectors.bin").exists());
}
