//! The manager facade: one call from user prompt to logged response.
//!
//! [`Manager`] ties the pieces together. For each request it asks the
//! classifier model to pick a route, parses the reply into a
//! [`RoutingDecision`](crate::decision::RoutingDecision), hands the decision
//! to the [`Orchestrator`](crate::orchestrator::Orchestrator), and records the
//! interaction in the [`HistoryStore`](crate::history::HistoryStore). Logging
//! is best-effort and unconditional: error responses are stored the same way
//! successful ones are.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use workforce::clients::openai::{Model, OpenAIClient};
//! use workforce::document::TextFileRenderer;
//! use workforce::embedding::OpenAiEmbedder;
//! use workforce::history::HistoryStore;
//! use workforce::manager::Manager;
//! use workforce::specialist::SpecialistRoster;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
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
//!     let response = manager.handle("Scrape example.com for prices").await;
//!     println!("{}", response);
//!     Ok(())
//! }
//! ```

use std::error::Error;
use std::sync::Arc;

use crate::workforce::client_wrapper::{ClientWrapper, Message, Role};
use crate::workforce::decision::{DecisionParser, RoutingDecision};
use crate::workforce::document::DocumentRenderer;
use crate::workforce::history::{
    ConversationRecord, HistoryError, HistoryStore, SimilarConversation, StoreStats,
};
use crate::workforce::orchestrator::{truncate_chars, Orchestrator};
use crate::workforce::specialist::SpecialistRoster;

/// Route label persisted when no specialist handled the request.
const NO_ROUTE_LABEL: &str = "None";

/// How many characters of a past request survive into the decision context.
const DECISION_PROMPT_CHARS: usize = 150;

/// Facade over classification, dispatch, and history logging.
pub struct Manager {
    roster: SpecialistRoster,
    parser: DecisionParser,
    orchestrator: Orchestrator,
    classifier: Arc<dyn ClientWrapper>,
    history: HistoryStore,
    decision_window: usize,
}

impl Manager {
    /// Create a manager using `client` for both classification and
    /// specialist dispatch.
    pub fn new(
        roster: SpecialistRoster,
        client: Arc<dyn ClientWrapper>,
        renderer: Arc<dyn DocumentRenderer>,
        history: HistoryStore,
    ) -> Self {
        let parser = DecisionParser::new(&roster);
        let orchestrator = Orchestrator::new(roster.clone(), Arc::clone(&client), renderer);
        Self {
            roster,
            parser,
            orchestrator,
            classifier: client,
            history,
            decision_window: 20,
        }
    }

    /// Use a separate client (e.g. a cheaper model) for classification
    /// (builder pattern).
    pub fn with_classifier(mut self, classifier: Arc<dyn ClientWrapper>) -> Self {
        self.classifier = classifier;
        self
    }

    /// Override how many past routing decisions are shown to the classifier
    /// (builder pattern).
    pub fn with_decision_window(mut self, window: usize) -> Self {
        self.decision_window = window;
        self
    }

    /// Override how many recent conversations are injected into specialist
    /// prompts (builder pattern).
    pub fn with_context_window(mut self, window: usize) -> Self {
        self.orchestrator = self.orchestrator.with_context_window(window);
        self
    }

    /// Handle one user request end to end and return the response text.
    ///
    /// Every path through this method, including failures, appends one
    /// record to the history store before returning.
    pub async fn handle(&mut self, user_prompt: &str) -> String {
        let decision = match self.classify(user_prompt).await {
            Ok(raw) => {
                log::debug!("classifier replied: {}", raw.trim());
                self.parser.parse(&raw)
            }
            Err(err) => {
                log::error!("classification call failed: {}", err);
                let response = format!("Error: could not classify the request: {}", err);
                self.log_interaction(user_prompt, &response, NO_ROUTE_LABEL, None)
                    .await;
                return response;
            }
        };

        let label = decision.label();
        let (response, suggestion) = match &decision {
            RoutingDecision::Single { agent } => {
                log::info!("allocating task to specialist '{}'", agent);
                let output = self
                    .orchestrator
                    .dispatch_single(agent, user_prompt, &self.history)
                    .await;
                (
                    format!("Task allocated to {}. Specialist response:\n{}", agent, output),
                    None,
                )
            }
            RoutingDecision::Multi {
                agents,
                description,
            } => {
                log::info!("running multi-step workflow: {}", agents.join(" -> "));
                let output = self
                    .orchestrator
                    .dispatch_chain(agents, description, user_prompt, &self.history)
                    .await;
                (output, None)
            }
            RoutingDecision::None { message } => (
                format!(
                    "No suitable specialist was found for this request. {}",
                    message
                ),
                Some(message.clone()),
            ),
            RoutingDecision::Malformed { raw_text } => (
                format!(
                    "I received an unexpected routing decision: '{}'. Please rephrase the request or name a specialist directly.",
                    raw_text.trim()
                ),
                None,
            ),
        };

        self.log_interaction(user_prompt, &response, &label, suggestion.as_deref())
            .await;
        response
    }

    /// Ask the classifier model which route should handle `user_prompt`.
    async fn classify(
        &self,
        user_prompt: &str,
    ) -> Result<String, Box<dyn Error + Send + Sync>> {
        let messages = [
            Message::new(Role::System, self.classifier_instructions()),
            Message::new(Role::User, self.decision_prompt(user_prompt)),
        ];
        let reply = self.classifier.send_message(&messages).await?;
        Ok(reply.content)
    }

    fn classifier_instructions(&self) -> String {
        format!(
            "You are a workforce manager routing user requests to specialist agents.\n\n\
             Available specialists:\n{}\n\n\
             Reply in exactly one of these forms and nothing else:\n\
             SINGLE: <specialist name>\n\
                 when one specialist can complete the task alone.\n\
             MULTI: <name> -> <name> -> <name>\n\
             WORKFLOW: <one-line plan>\n\
                 when the task needs an ordered chain of specialists.\n\
             NONE: <short explanation>\n\
                 when no listed specialist fits the task.\n\n\
             Use the exact specialist names from the list above.",
            self.roster.catalog()
        )
    }

    fn decision_prompt(&self, user_prompt: &str) -> String {
        let mut prompt = format!(
            "Decide which specialist(s) should handle this request: '{}'",
            user_prompt
        );

        let recent = self.history.recent(self.decision_window);
        if !recent.is_empty() {
            prompt.push_str("\n\nRECENT ROUTING DECISIONS (most recent first):\n");
            for (i, record) in recent.iter().enumerate() {
                prompt.push_str(&format!(
                    "{}. [{}] \"{}\" -> {}\n",
                    i + 1,
                    record.timestamp.format("%Y-%m-%d %H:%M"),
                    truncate_chars(&record.user_prompt, DECISION_PROMPT_CHARS),
                    record.route_label
                ));
            }
            prompt.push_str(
                "\nKeep decisions consistent with similar past requests, but adapt to the specifics of the new one.",
            );
        }

        prompt
    }

    /// Best-effort append to the history store; failures are logged, never
    /// surfaced to the caller.
    async fn log_interaction(
        &mut self,
        user_prompt: &str,
        response: &str,
        route_label: &str,
        suggestion_label: Option<&str>,
    ) {
        if let Err(err) = self
            .history
            .append(user_prompt, response, route_label, suggestion_label)
            .await
        {
            log::error!("failed to record interaction: {}", err);
        }
    }

    /// The roster this manager routes against.
    pub fn roster(&self) -> &SpecialistRoster {
        &self.roster
    }

    /// Read access to the underlying history store.
    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    /// The `k` stored conversations most similar to `query`.
    pub async fn search(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<SimilarConversation>, HistoryError> {
        self.history.similar(query, k).await
    }

    /// The most recent stored conversations, newest first.
    pub fn recent(&self, limit: usize) -> Vec<&ConversationRecord> {
        self.history.recent(limit)
    }

    /// Summary of the underlying store.
    pub fn stats(&self) -> StoreStats {
        self.history.stats()
    }

    /// Drop every stored conversation and the files backing them.
    pub fn clear(&mut self) -> Result<(), HistoryError> {
        self.history.clear()
    }
}
