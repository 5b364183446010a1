//! # Workforce
//!
//! Workforce is a Rust toolkit for routing free-text requests to a roster of
//! specialist LLM prompt templates, running single or chained specialist
//! calls against a hosted model, and keeping a semantically searchable log of
//! every interaction.
//!
//! The crate provides layered abstractions for:
//!
//! * **Specialist routing**: a [`SpecialistRoster`](specialist::SpecialistRoster)
//!   of named prompt templates, a classification call that picks one, and a
//!   tolerant [`DecisionParser`](decision::DecisionParser) that turns the
//!   classifier's free-text reply into a structured routing decision
//! * **Workflow orchestration**: the [`orchestrator`] module executes single
//!   dispatches and sequential multi-step chains where each step sees every
//!   prior step's output, aggregating one composite report
//! * **Semantic history**: the [`history`] module persists every
//!   request/response pair together with an embedding, supporting both
//!   recency and similarity retrieval; recent conversations are injected into
//!   specialist prompts as advisory context
//! * **Document production**: the document-producing route hands cleaned
//!   content to a pluggable [`DocumentRenderer`](document::DocumentRenderer)
//!   instead of returning model text
//! * **Provider flexibility**: hosted models sit behind the
//!   [`ClientWrapper`](client_wrapper::ClientWrapper) and
//!   [`Embedder`](embedding::Embedder) traits; OpenAI-backed implementations
//!   ship in the box
//!
//! ## Getting Started
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use workforce::clients::openai::{Model, OpenAIClient};
//! use workforce::document::TextFileRenderer;
//! use workforce::embedding::OpenAiEmbedder;
//! use workforce::history::HistoryStore;
//! use workforce::{Manager, SpecialistRoster};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     workforce::init_logger();
//!
//!     let key = std::env::var("OPENAI_API_KEY")?;
//!     let client = Arc::new(OpenAIClient::new_with_model_enum(&key, Model::GPT4oMini));
//!     let embedder = Arc::new(OpenAiEmbedder::new(&key));
//!     let history = HistoryStore::open("vector_db", "chat_history", embedder)?;
//!     let renderer = Arc::new(TextFileRenderer::new("documents"));
//!
//!     let mut manager = Manager::new(
//!         SpecialistRoster::default_roster(),
//!         client,
//!         renderer,
//!         history,
//!     );
//!
//!     let response = manager.handle("Write a blog post about renewable energy").await;
//!     println!("{}", response);
//!     Ok(())
//! }
//! ```
//!
//! Continue exploring the modules re-exported from the crate root for the
//! individual pieces.

use std::sync::Once;

static INIT_LOGGER: Once = Once::new();

/// Initialise the global [`env_logger`] subscriber exactly once.
///
/// The helper is intentionally lightweight so that applications embedding the
/// crate can opt in to simple `RUST_LOG` driven diagnostics without choosing
/// a logging backend upfront.
///
/// ```rust
/// workforce::init_logger();
/// log::info!("Logger is ready");
/// ```
pub fn init_logger() {
    INIT_LOGGER.call_once(|| {
        env_logger::init();
    });
}

// Import the top-level `workforce` module.
pub mod workforce;

// Re-exporting key items for easier external access.
pub use workforce::client_wrapper;
pub use workforce::client_wrapper::{ClientWrapper, Message, Role, TokenUsage};
pub use workforce::clients;
pub use workforce::config;
pub use workforce::config::WorkforceConfig;
pub use workforce::decision;
pub use workforce::decision::{DecisionParser, RoutingDecision};
pub use workforce::document;
pub use workforce::document::{
    ContentCleaner, DocumentRenderer, PatternCleaner, RenderReport, TextFileRenderer,
};
pub use workforce::embedding;
pub use workforce::embedding::{
    cosine_similarity, Embedder, EmbeddingIndex, IndexEntry, OpenAiEmbedder, SimilarityHit,
};
pub use workforce::history;
pub use workforce::history::{
    ConversationRecord, HistoryError, HistoryStore, SimilarConversation, StoreStats,
};
pub use workforce::manager;
pub use workforce::manager::Manager;
pub use workforce::orchestrator;
pub use workforce::orchestrator::{Orchestrator, WorkflowContext};
pub use workforce::specialist;
pub use workforce::specialist::{Specialist, SpecialistKind, SpecialistRoster};
