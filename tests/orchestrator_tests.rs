use async_trait::async_trait;
use std::error::Error;
use std::sync::{Arc, Mutex};
use workforce::client_wrapper::{ClientWrapper, Message, Role};
use workforce::document::{DocumentRenderer, RenderReport};
use workforce::embedding::Embedder;
use workforce::history::HistoryStore;
use workforce::orchestrator::{Orchestrator, WorkflowContext};
use workforce::specialist::{Specialist, SpecialistKind, SpecialistRoster};

/// Scripted client: picks a reply by matching a substring of the system
/// prompt, records every call for later inspection.
struct MockClient {
    rules: Vec<(String, Result<String, String>)>,
    calls: Mutex<Vec<Vec<Message>>>,
}

impl MockClient {
    fn new(rules: Vec<(&str, Result<&str, &str>)>) -> Arc<Self> {
        Arc::new(Self {
            rules: rules
                .into_iter()
                .map(|(pattern, outcome)| {
                    (
                        pattern.to_string(),
                        outcome.map(str::to_string).map_err(str::to_string),
                    )
                })
                .collect(),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn user_prompt_of_call(&self, index: usize) -> String {
        let calls = self.calls.lock().unwrap();
        calls[index]
            .iter()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ClientWrapper for MockClient {
    async fn send_message(
        &self,
        messages: &[Message],
    ) -> Result<Message, Box<dyn Error + Send + Sync>> {
        self.calls.lock().unwrap().push(messages.to_vec());

        let system = messages
            .iter()
            .find(|m| m.role == Role::System)
            .map(|m| m.content.clone())
            .unwrap_or_default();

        for (pattern, outcome) in &self.rules {
            if system.contains(pattern.as_str()) {
                return match outcome {
                    Ok(reply) => Ok(Message::new(Role::Assistant, reply.clone())),
                    Err(err) => Err(err.clone().into()),
                };
            }
        }
        Ok(Message::new(Role::Assistant, "default reply"))
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}

/// Renderer that records what it was asked to render.
#[derive(Default)]
struct MockRenderer {
    calls: Mutex<Vec<(String, String)>>,
}

impl MockRenderer {
    fn rendered(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

impl DocumentRenderer for MockRenderer {
    fn render(&self, title: &str, body: &str) -> RenderReport {
        self.calls
            .lock()
            .unwrap()
            .push((title.to_string(), body.to_string()));
        RenderReport::success(title, "out/rendered.md".into(), 42, 3, 1024)
    }
}

struct MockEmbedder;

#[async_trait]
impl Embedder for MockEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, Box<dyn Error + Send + Sync>> {
        let mut vector = vec![0.0f32; 8];
        for byte in text.bytes() {
            vector[byte as usize % 8] += 1.0;
        }
        Ok(vector)
    }

    fn dimension(&self) -> usize {
        8
    }
}

fn test_roster() -> SpecialistRoster {
    let mut roster = SpecialistRoster::new();
    roster
        .add(Specialist::new(
            "Researcher",
            "Research things",
            "You are the researcher persona.",
        ))
        .unwrap();
    roster
        .add(Specialist::new(
            "Writer",
            "Write things",
            "You are the writer persona.",
        ))
        .unwrap();
    roster
        .add(Specialist::new(
            "Reviewer",
            "Review things",
            "You are the reviewer persona.",
        ))
        .unwrap();
    roster
        .add(
            Specialist::new(
                "Publisher",
                "Render documents",
                "You are the publisher persona.",
            )
            .with_kind(SpecialistKind::DocumentRendering),
        )
        .unwrap();
    roster
}

fn empty_history(dir: &std::path::Path) -> HistoryStore {
    HistoryStore::open(dir, "test", Arc::new(MockEmbedder)).unwrap()
}

#[tokio::test]
async fn test_unknown_single_route_is_rejected_without_llm_call() {
    let dir = tempfile::tempdir().unwrap();
    let history = empty_history(dir.path());
    let client = MockClient::new(vec![]);
    let renderer = Arc::new(MockRenderer::default());

    let orchestrator = Orchestrator::new(test_roster(), client.clone(), renderer);
    let response = orchestrator
        .dispatch_single("Weather Bot", "what's the weather", &history)
        .await;

    assert!(response.contains("'Weather Bot' is not registered"));
    assert_eq!(client.call_count(), 0);
}

#[tokio::test]
async fn test_single_dispatch_returns_raw_specialist_text() {
    let dir = tempfile::tempdir().unwrap();
    let history = empty_history(dir.path());
    let client = MockClient::new(vec![("researcher persona", Ok("research findings"))]);
    let renderer = Arc::new(MockRenderer::default());

    let orchestrator = Orchestrator::new(test_roster(), client.clone(), renderer);
    let response = orchestrator
        .dispatch_single("Researcher", "look into rust adoption", &history)
        .await;

    assert_eq!(response, "research findings");
    assert_eq!(client.call_count(), 1);
    // With an empty store there is no history block to inject.
    assert_eq!(
        client.user_prompt_of_call(0),
        "look into rust adoption"
    );
}

#[tokio::test]
async fn test_single_dispatch_injects_recent_history() {
    let dir = tempfile::tempdir().unwrap();
    let mut history = empty_history(dir.path());
    history
        .append(
            "earlier scraping request",
            "earlier scraping answer",
            "Researcher",
            None,
        )
        .await
        .unwrap();

    let client = MockClient::new(vec![("researcher persona", Ok("ok"))]);
    let renderer = Arc::new(MockRenderer::default());
    let orchestrator = Orchestrator::new(test_roster(), client.clone(), renderer);

    orchestrator
        .dispatch_single("Researcher", "a new request", &history)
        .await;

    let prompt = client.user_prompt_of_call(0);
    assert!(prompt.contains("=== RECENT CONVERSATION HISTORY ==="));
    assert!(prompt.contains("earlier scraping request"));
    assert!(prompt.contains("=== CURRENT REQUEST ==="));
    assert!(prompt.contains("a new request"));
}

#[tokio::test]
async fn test_single_dispatch_converts_failure_to_error_text() {
    let dir = tempfile::tempdir().unwrap();
    let history = empty_history(dir.path());
    let client = MockClient::new(vec![("researcher persona", Err("quota exhausted"))]);
    let renderer = Arc::new(MockRenderer::default());

    let orchestrator = Orchestrator::new(test_roster(), client.clone(), renderer);
    let response = orchestrator
        .dispatch_single("Researcher", "look into rust adoption", &history)
        .await;

    assert!(response.contains("Error: specialist 'Researcher' failed"));
    assert!(response.contains("quota exhausted"));
}

#[tokio::test]
async fn test_chain_with_failing_middle_step_reports_all_steps() {
    let dir = tempfile::tempdir().unwrap();
    let history = empty_history(dir.path());
    let client = MockClient::new(vec![
        ("researcher persona", Ok("step one output")),
        ("writer persona", Err("transient failure")),
        ("reviewer persona", Ok("step three output")),
    ]);
    let renderer = Arc::new(MockRenderer::default());

    let orchestrator = Orchestrator::new(test_roster(), client.clone(), renderer);
    let agents = vec![
        "Researcher".to_string(),
        "Writer".to_string(),
        "Reviewer".to_string(),
    ];
    let report = orchestrator
        .dispatch_chain(&agents, "research, write, review", "do the thing", &history)
        .await;

    assert!(report.contains("=== RESEARCHER OUTPUT ==="));
    assert!(report.contains("step one output"));
    assert!(report.contains("=== WRITER OUTPUT ==="));
    assert!(report.contains("[ERROR] Writer failed"));
    assert!(report.contains("=== REVIEWER OUTPUT ==="));
    assert!(report.contains("step three output"));

    // Blocks appear in execution order.
    let researcher = report.find("=== RESEARCHER OUTPUT ===").unwrap();
    let writer = report.find("=== WRITER OUTPUT ===").unwrap();
    let reviewer = report.find("=== REVIEWER OUTPUT ===").unwrap();
    assert!(researcher < writer && writer < reviewer);

    assert_eq!(client.call_count(), 3);
}

#[tokio::test]
async fn test_chain_steps_see_prior_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let history = empty_history(dir.path());
    let client = MockClient::new(vec![
        ("researcher persona", Ok("facts about rust")),
        ("writer persona", Ok("an article")),
    ]);
    let renderer = Arc::new(MockRenderer::default());

    let orchestrator = Orchestrator::new(test_roster(), client.clone(), renderer);
    let agents = vec!["Researcher".to_string(), "Writer".to_string()];
    orchestrator
        .dispatch_chain(&agents, "research then write", "cover rust adoption", &history)
        .await;

    let second_prompt = client.user_prompt_of_call(1);
    assert!(second_prompt.contains("=== ORIGINAL REQUEST ==="));
    assert!(second_prompt.contains("cover rust adoption"));
    assert!(second_prompt.contains("research then write"));
    assert!(second_prompt.contains("=== RESEARCHER OUTPUT ==="));
    assert!(second_prompt.contains("facts about rust"));
}

#[tokio::test]
async fn test_chain_rejects_unknown_members_upfront() {
    let dir = tempfile::tempdir().unwrap();
    let history = empty_history(dir.path());
    let client = MockClient::new(vec![]);
    let renderer = Arc::new(MockRenderer::default());

    let orchestrator = Orchestrator::new(test_roster(), client.clone(), renderer);
    let agents = vec!["Researcher".to_string(), "Mystery Agent".to_string()];
    let response = orchestrator
        .dispatch_chain(&agents, "plan", "request", &history)
        .await;

    assert!(response.contains("unknown specialists in workflow: Mystery Agent"));
    assert_eq!(client.call_count(), 0);
}

#[tokio::test]
async fn test_document_step_after_writer_extracts_without_new_generation() {
    let dir = tempfile::tempdir().unwrap();
    let history = empty_history(dir.path());
    let client = MockClient::new(vec![(
        "writer persona",
        Ok("I'll help you with that!\nMarket Overview\n\nDemand is growing fast."),
    )]);
    let renderer = Arc::new(MockRenderer::default());

    let orchestrator = Orchestrator::new(test_roster(), client.clone(), renderer.clone());
    let agents = vec!["Writer".to_string(), "Publisher".to_string()];
    let report = orchestrator
        .dispatch_chain(&agents, "write then render", "make a market report", &history)
        .await;

    // Only the writer talked to the model; the publisher step reused its output.
    assert_eq!(client.call_count(), 1);

    let rendered = renderer.rendered();
    assert_eq!(rendered.len(), 1);
    let (title, body) = &rendered[0];
    assert_eq!(title, "Market Overview");
    assert!(body.contains("Demand is growing fast."));
    // The filler opener was stripped before rendering.
    assert!(!body.contains("I'll help you"));

    assert!(report.contains("=== PUBLISHER OUTPUT ==="));
    assert!(report.contains("Document created successfully."));
}

#[tokio::test]
async fn test_document_as_sole_step_generates_then_renders() {
    let dir = tempfile::tempdir().unwrap();
    let history = empty_history(dir.path());
    let client = MockClient::new(vec![(
        "publisher persona",
        Ok("Quarterly Outlook\n\nRevenue is trending upward."),
    )]);
    let renderer = Arc::new(MockRenderer::default());

    let orchestrator = Orchestrator::new(test_roster(), client.clone(), renderer.clone());
    let response = orchestrator
        .dispatch_single("Publisher", "Create a PDF about the quarterly outlook", &history)
        .await;

    assert_eq!(client.call_count(), 1);
    // Document-request phrasing was removed before the generation call.
    let prompt = client.user_prompt_of_call(0).to_lowercase();
    assert!(!prompt.contains("pdf"));
    assert!(prompt.contains("quarterly outlook"));

    let rendered = renderer.rendered();
    assert_eq!(rendered.len(), 1);
    assert_eq!(rendered[0].0, "Quarterly Outlook");

    assert!(response.contains("Document created successfully."));
}

#[test]
fn test_workflow_context_transcript_and_extraction() {
    let mut context = WorkflowContext::new();
    context.record("Researcher", "first findings");
    context.record("Writer", "draft text");

    let transcript = context.transcript();
    assert!(transcript.contains("=== RESEARCHER OUTPUT ===\nfirst findings"));
    assert!(transcript.contains("=== WRITER OUTPUT ===\ndraft text"));

    assert!(WorkflowContext::contains_marker(&transcript));
    assert!(!WorkflowContext::contains_marker("no markers here"));

    let latest = WorkflowContext::extract_latest_block(&transcript).unwrap();
    assert_eq!(latest, "draft text");
}

#[test]
fn test_workflow_context_generic_section_fallback() {
    let prompt = "intro\n\n=== PREVIOUS STEP OUTPUTS ===\nsome accumulated text\nmore text\n\n=== CURRENT TASK ===\ndo things";
    let section = WorkflowContext::extract_previous_outputs(prompt).unwrap();
    assert!(section.contains("some accumulated text"));
    assert!(section.contains("more text"));
    assert!(!section.contains("do things"));

    assert!(WorkflowContext::extract_latest_block(prompt).is_none());
}
