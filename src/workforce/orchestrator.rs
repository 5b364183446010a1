//! Dispatch engine for routed tasks.
//!
//! The [`Orchestrator`] executes a routing decision: a single specialist
//! dispatch, or a sequential multi-step workflow where each step's output is
//! folded into the next step's prompt. It aggregates a final textual result
//! in every case; transport failures are converted into text rather than
//! propagated, so from the history store's point of view an error is just
//! another response.
//!
//! ```text
//! RoutingDecision
//!   ├─ Single ──► validate name ──► historical context + request ──► one LLM call
//!   └─ Multi ───► validate chain ──► for each step, in order:
//!                   prompt = plan + original request + transcript so far
//!                   output = LLM call (or error marker on failure)
//!                   transcript += "=== {STEP} OUTPUT ===" block
//!                 ──► composite report of every step
//! ```
//!
//! The document-producing route is special-cased: instead of returning the
//! model's text, the orchestrator prepares a title and body (extracting a
//! prior step's output when the prompt carries one, generating prose
//! otherwise) and hands them to the
//! [`DocumentRenderer`](crate::document::DocumentRenderer), returning the
//! renderer's report unmodified.
//!
//! Every non-document invocation is prefixed with a block of recent
//! conversations from the history store. The block is advisory context for
//! the model; nothing parses it afterwards.

use std::sync::Arc;

use crate::workforce::client_wrapper::{ClientWrapper, Message, Role};
use crate::workforce::document::{ContentCleaner, DocumentRenderer, PatternCleaner};
use crate::workforce::history::HistoryStore;
use crate::workforce::specialist::{Specialist, SpecialistKind, SpecialistRoster};

const HISTORY_HEADER: &str = "=== RECENT CONVERSATION HISTORY ===";
const HISTORY_FOOTER: &str = "=== END HISTORY ===";
const CURRENT_REQUEST_HEADER: &str = "=== CURRENT REQUEST ===";
const ORIGINAL_REQUEST_HEADER: &str = "=== ORIGINAL REQUEST ===";
const PREVIOUS_OUTPUTS_HEADER: &str = "=== PREVIOUS STEP OUTPUTS ===";
const CURRENT_TASK_HEADER: &str = "=== CURRENT TASK ===";

/// How many characters of a stored request survive into injected context.
const CONTEXT_PROMPT_CHARS: usize = 300;
/// How many characters of a stored response survive into injected context.
const CONTEXT_RESPONSE_CHARS: usize = 400;

/// The accumulated transcript of prior steps' outputs within one workflow
/// execution.
///
/// Owned by exactly one [`Orchestrator`] dispatch and discarded when the
/// chain finishes. The transcript renders each step as a labeled block:
///
/// ```text
/// === MARKET RESEARCH ANALYST OUTPUT ===
/// ...that step's text...
/// ```
#[derive(Debug, Default)]
pub struct WorkflowContext {
    steps: Vec<(String, String)>,
}

impl WorkflowContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one completed step.
    pub fn record(&mut self, route: &str, output: &str) {
        self.steps.push((route.to_string(), output.to_string()));
    }

    /// Number of recorded steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether any step has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// The recorded `(route, output)` pairs, in execution order.
    pub fn steps(&self) -> &[(String, String)] {
        &self.steps
    }

    /// The block header used for a given route name.
    pub fn block_header(route: &str) -> String {
        format!("=== {} OUTPUT ===", route.to_uppercase())
    }

    /// Render every recorded step as labeled output blocks, in order.
    pub fn transcript(&self) -> String {
        self.steps
            .iter()
            .map(|(route, output)| format!("{}\n{}", Self::block_header(route), output))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Whether `text` contains a labeled step-output block header.
    pub fn contains_marker(text: &str) -> bool {
        text.lines().any(Self::is_block_header)
    }

    fn is_block_header(line: &str) -> bool {
        let line = line.trim();
        line.starts_with("=== ") && line.ends_with(" OUTPUT ===")
    }

    /// Extract the content of the most recent labeled output block in `text`.
    pub fn extract_latest_block(text: &str) -> Option<String> {
        let lines: Vec<&str> = text.lines().collect();
        let start = lines.iter().rposition(|line| Self::is_block_header(line))?;

        let mut content = Vec::new();
        for line in &lines[start + 1..] {
            if line.trim().starts_with("=== ") {
                break;
            }
            content.push(*line);
        }
        Some(content.join("\n").trim().to_string())
    }

    /// Extract the generically delimited previous-outputs section of `text`.
    pub fn extract_previous_outputs(text: &str) -> Option<String> {
        let lines: Vec<&str> = text.lines().collect();
        let start = lines
            .iter()
            .position(|line| line.trim() == PREVIOUS_OUTPUTS_HEADER)?;

        let mut content = Vec::new();
        for line in &lines[start + 1..] {
            if line.trim() == CURRENT_TASK_HEADER {
                break;
            }
            content.push(*line);
        }
        let section = content.join("\n").trim().to_string();
        if section.is_empty() {
            None
        } else {
            Some(section)
        }
    }
}

/// Executes routing decisions against a roster of specialists.
///
/// Construct with [`Orchestrator::new`] and customize via the builder
/// methods. The orchestrator borrows the history store per dispatch; it never
/// writes to it.
pub struct Orchestrator {
    roster: SpecialistRoster,
    client: Arc<dyn ClientWrapper>,
    renderer: Arc<dyn DocumentRenderer>,
    cleaner: Arc<dyn ContentCleaner>,
    context_window: usize,
}

impl Orchestrator {
    /// Create an orchestrator over the given roster, text-generation client,
    /// and document renderer.
    ///
    /// Defaults to the [`PatternCleaner`] content strategy and a 50
    /// conversation context window.
    pub fn new(
        roster: SpecialistRoster,
        client: Arc<dyn ClientWrapper>,
        renderer: Arc<dyn DocumentRenderer>,
    ) -> Self {
        Self {
            roster,
            client,
            renderer,
            cleaner: Arc::new(PatternCleaner),
            context_window: 50,
        }
    }

    /// Replace the content-preparation strategy (builder pattern).
    pub fn with_cleaner(mut self, cleaner: Arc<dyn ContentCleaner>) -> Self {
        self.cleaner = cleaner;
        self
    }

    /// Override how many recent conversations are injected as context
    /// (builder pattern).
    pub fn with_context_window(mut self, window: usize) -> Self {
        self.context_window = window;
        self
    }

    /// The roster this orchestrator dispatches against.
    pub fn roster(&self) -> &SpecialistRoster {
        &self.roster
    }

    /// Dispatch a task to one named specialist and return the response text.
    ///
    /// An unknown name is rejected with a user-facing error string before any
    /// LLM call is made. A transport failure is likewise converted to an
    /// error string; callers treat both as ordinary responses.
    pub async fn dispatch_single(
        &self,
        agent_name: &str,
        user_prompt: &str,
        history: &HistoryStore,
    ) -> String {
        let Some(specialist) = self.roster.get(agent_name) else {
            log::warn!("rejected dispatch to unknown specialist '{}'", agent_name);
            return format!(
                "Error: specialist '{}' is not registered with this manager.",
                agent_name
            );
        };

        match specialist.kind {
            SpecialistKind::DocumentRendering => {
                self.run_document_generation(specialist, user_prompt).await
            }
            SpecialistKind::TextGeneration => {
                let prompt = self.enrich_with_history(user_prompt, history);
                match self.invoke(specialist, &prompt).await {
                    Ok(text) => text,
                    Err(err) => {
                        log::error!("specialist '{}' failed: {}", specialist.name, err);
                        format!(
                            "Error: specialist '{}' failed to process the task: {}",
                            specialist.name, err
                        )
                    }
                }
            }
        }
    }

    /// Execute an ordered chain of specialists and return a composite report.
    ///
    /// Every chain member is validated before the first call. A failing step
    /// does not abort the chain: its output is replaced with an error marker
    /// and execution continues, so partial results are still aggregated. The
    /// report lists every step's name and output in execution order.
    pub async fn dispatch_chain(
        &self,
        agents: &[String],
        description: &str,
        user_prompt: &str,
        history: &HistoryStore,
    ) -> String {
        let unknown: Vec<&str> = agents
            .iter()
            .filter(|name| !self.roster.contains(name))
            .map(|name| name.as_str())
            .collect();
        if !unknown.is_empty() {
            log::warn!("rejected workflow with unknown specialists: {:?}", unknown);
            return format!(
                "Error: unknown specialists in workflow: {}",
                unknown.join(", ")
            );
        }
        if agents.is_empty() {
            return "Error: the workflow contained no steps.".to_string();
        }

        let mut context = WorkflowContext::new();
        let total = agents.len();

        for (step, name) in agents.iter().enumerate() {
            let Some(specialist) = self.roster.get(name) else {
                context.record(name, &format!("[ERROR] {} is not registered.", name));
                continue;
            };

            log::info!(
                "workflow step {}/{}: dispatching to '{}'",
                step + 1,
                total,
                specialist.name
            );

            let step_prompt =
                self.build_step_prompt(user_prompt, description, &context, specialist, step, total, history);

            let output = match specialist.kind {
                SpecialistKind::DocumentRendering => {
                    if WorkflowContext::contains_marker(&step_prompt) {
                        self.run_document_extraction(&step_prompt)
                    } else {
                        self.run_document_generation(specialist, user_prompt).await
                    }
                }
                SpecialistKind::TextGeneration => {
                    match self.invoke(specialist, &step_prompt).await {
                        Ok(text) => text,
                        Err(err) => {
                            log::error!(
                                "workflow step '{}' failed, continuing: {}",
                                specialist.name,
                                err
                            );
                            format!("[ERROR] {} failed: {}", specialist.name, err)
                        }
                    }
                }
            };

            context.record(&specialist.name, &output);
        }

        format!(
            "Workflow: {}\nPlan: {}\n\n{}",
            agents.join(" -> "),
            description,
            context.transcript()
        )
    }

    /// One specialist invocation: its instructions as the system prompt, the
    /// prepared task text as the user message.
    async fn invoke(
        &self,
        specialist: &Specialist,
        prompt: &str,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        log::debug!(
            "invoking '{}' via {}",
            specialist.name,
            self.client.model_name()
        );
        let messages = [
            Message::new(Role::System, specialist.instructions.clone()),
            Message::new(Role::User, prompt),
        ];
        self.client
            .send_message(&messages)
            .await
            .map(|reply| reply.content)
    }

    /// The document route as a later workflow step: no new content is
    /// generated. The most recent prior output is extracted, cleaned, and
    /// rendered.
    fn run_document_extraction(&self, step_prompt: &str) -> String {
        let block = WorkflowContext::extract_latest_block(step_prompt)
            .or_else(|| WorkflowContext::extract_previous_outputs(step_prompt));

        let Some(raw) = block else {
            return "Error: no previous step output was available to render.".to_string();
        };

        let body = self.cleaner.strip_filler(&raw);
        let title = self.cleaner.infer_title(&body);
        self.renderer.render(&title, &body).message()
    }

    /// The document route as the sole or first step: document-request
    /// phrasing is removed so the model writes content instead of talking
    /// about files, then the generated prose is cleaned and rendered.
    async fn run_document_generation(
        &self,
        specialist: &Specialist,
        user_prompt: &str,
    ) -> String {
        let cleaned_request = self.cleaner.strip_document_phrasing(user_prompt);
        match self.invoke(specialist, &cleaned_request).await {
            Ok(prose) => {
                let body = self.cleaner.strip_filler(&prose);
                let title = self.cleaner.infer_title(&body);
                self.renderer.render(&title, &body).message()
            }
            Err(err) => {
                log::error!(
                    "document content generation via '{}' failed: {}",
                    specialist.name,
                    err
                );
                format!(
                    "[ERROR] {} failed to generate document content: {}",
                    specialist.name, err
                )
            }
        }
    }

    /// Assemble the prompt for one workflow step.
    fn build_step_prompt(
        &self,
        user_prompt: &str,
        description: &str,
        context: &WorkflowContext,
        specialist: &Specialist,
        step: usize,
        total: usize,
        history: &HistoryStore,
    ) -> String {
        let mut sections = vec![format!(
            "You are step {} of {} in a multi-step workflow.\nWorkflow plan: {}",
            step + 1,
            total,
            description
        )];

        if specialist.kind == SpecialistKind::TextGeneration {
            if let Some(block) = self.historical_context(history) {
                sections.push(block);
            }
        }

        sections.push(format!("{}\n{}", ORIGINAL_REQUEST_HEADER, user_prompt));

        if !context.is_empty() {
            sections.push(format!(
                "{}\n{}",
                PREVIOUS_OUTPUTS_HEADER,
                context.transcript()
            ));
        }

        sections.push(format!(
            "{}\nAs the {}, carry out your part of the workflow, building on the outputs above.",
            CURRENT_TASK_HEADER, specialist.name
        ));

        sections.join("\n\n")
    }

    /// Prefix a single-dispatch prompt with recent history, when any exists.
    fn enrich_with_history(&self, user_prompt: &str, history: &HistoryStore) -> String {
        match self.historical_context(history) {
            Some(block) => format!(
                "{}\n\n{}\n{}\n\nRespond to the current request above, staying consistent with the conversation history provided.",
                block, CURRENT_REQUEST_HEADER, user_prompt
            ),
            None => user_prompt.to_string(),
        }
    }

    /// Format the most recent stored conversations into one delimited block,
    /// most recent first. Returns `None` for an empty store.
    fn historical_context(&self, history: &HistoryStore) -> Option<String> {
        let recent = history.recent(self.context_window);
        if recent.is_empty() {
            return None;
        }

        let mut parts = vec![
            HISTORY_HEADER.to_string(),
            format!(
                "The last {} conversations are provided for reference, most recent first.",
                recent.len()
            ),
            "Use them to stay consistent with earlier work and avoid repeating mistakes."
                .to_string(),
            String::new(),
        ];

        for (i, record) in recent.iter().enumerate() {
            parts.push(format!("--- Conversation {} ---", i + 1));
            parts.push(format!(
                "Date: {}",
                record.timestamp.format("%Y-%m-%d %H:%M:%S")
            ));
            parts.push(format!("Route: {}", record.route_label));
            parts.push(format!(
                "User Request: {}",
                truncate_chars(&record.user_prompt, CONTEXT_PROMPT_CHARS)
            ));
            parts.push(format!(
                "Response: {}",
                truncate_chars(&record.response_text, CONTEXT_RESPONSE_CHARS)
            ));
            parts.push(String::new());
        }

        parts.push(HISTORY_FOOTER.to_string());
        Some(parts.join("\n"))
    }
}

/// Truncate to at most `max` characters, appending an ellipsis when cut.
pub(crate) fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(max).collect();
        cut.push_str("...");
        cut
    }
}
