//! Interactive console for the workforce manager.
//!
//! Run from the repository root:
//!
//! ```text
//! OPENAI_API_KEY=your-key-here cargo run --bin workforce-console
//! ```
//!
//! Besides free-text requests, three commands are recognised:
//! `search <query>` looks up similar past conversations, `history` shows the
//! most recent ones, and `quit` exits.

use std::io::{self, Write};
use std::sync::Arc;

use workforce::clients::openai::{Model, OpenAIClient};
use workforce::document::TextFileRenderer;
use workforce::embedding::OpenAiEmbedder;
use workforce::history::HistoryStore;
use workforce::{Manager, SpecialistRoster, WorkforceConfig};

#[tokio::main]
async fn main() {
    workforce::init_logger();

    let secret_key = match std::env::var("OPENAI_API_KEY") {
        Ok(key) if !key.trim().is_empty() => key,
        _ => {
            eprintln!("OPENAI_API_KEY not found!");
            eprintln!("Set it as an environment variable:");
            eprintln!("  export OPENAI_API_KEY='your_api_key_here'");
            std::process::exit(1);
        }
    };

    let config = WorkforceConfig::default();
    let client = Arc::new(OpenAIClient::new_with_model_enum(&secret_key, Model::GPT4oMini));
    let embedder = Arc::new(OpenAiEmbedder::new(&secret_key));
    let renderer = Arc::new(TextFileRenderer::new(&config.document_dir));

    let history = match HistoryStore::open(&config.history_dir, &config.collection_name, embedder)
    {
        Ok(history) => history,
        Err(err) => {
            eprintln!("Failed to open the history store: {}", err);
            eprintln!(
                "If the files under {} are damaged, move them aside and start again.",
                config.history_dir.display()
            );
            std::process::exit(1);
        }
    };

    let roster = SpecialistRoster::default_roster();
    let mut manager = Manager::new(roster, client, renderer, history)
        .with_context_window(config.context_window)
        .with_decision_window(config.decision_window);

    println!("Workforce manager initialised.");
    println!("Available specialists:");
    for name in manager.roster().names() {
        println!("- {}", name);
    }

    let stats = manager.stats();
    println!("\nHistory store:");
    println!("- Conversations stored: {}", stats.count);
    println!("- Embedding dimension: {}", stats.dimension);
    println!("- Location: {}", stats.location.display());

    println!("\n--- Enter 'quit' to exit ---");
    println!("--- Enter 'search <query>' to find similar conversations ---");
    println!("--- Enter 'history' to view recent conversations ---");

    loop {
        print!("\nUser Prompt: ");
        if io::stdout().flush().is_err() {
            break;
        }

        let mut line = String::new();
        match io::stdin().read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let input = line.trim();

        if input.is_empty() {
            continue;
        }
        if input.eq_ignore_ascii_case("quit") {
            println!("Exiting workforce manager.");
            break;
        }

        if let Some(query) = input.strip_prefix("search ") {
            let query = query.trim();
            if query.is_empty() {
                println!("Please provide a search query. Example: search web scraping");
                continue;
            }
            println!("Searching for conversations similar to: '{}'", query);
            match manager.search(query, 5).await {
                Ok(results) if results.is_empty() => {
                    println!("No similar conversations found.");
                }
                Ok(results) => {
                    println!("Found {} similar conversations:", results.len());
                    for (i, hit) in results.iter().enumerate() {
                        println!("\n{}. Similarity: {:.3}", i + 1, hit.score);
                        println!("   User: {}", excerpt(&hit.record.user_prompt, 80));
                        println!("   Route: {}", hit.record.route_label);
                        println!(
                            "   Time: {}",
                            hit.record.timestamp.format("%Y-%m-%d %H:%M:%S")
                        );
                    }
                }
                Err(err) => println!("Search failed: {}", err),
            }
            continue;
        }

        if input.eq_ignore_ascii_case("history") {
            let recent = manager.recent(10);
            if recent.is_empty() {
                println!("No conversation history found.");
            } else {
                println!("Recent conversations:");
                for (i, record) in recent.iter().enumerate() {
                    println!("\n{}. {}", i + 1, record.timestamp.format("%Y-%m-%d %H:%M:%S"));
                    println!("   User: {}", excerpt(&record.user_prompt, 60));
                    println!("   Route: {}", record.route_label);
                }
            }
            continue;
        }

        let response = manager.handle(input).await;
        println!("\n{}", response);
        println!("----");
    }
}

fn excerpt(text: &str, max: usize) -> String {
    let flattened = text.replace('\n', " ");
    if flattened.chars().count() <= max {
        flattened
    } else {
        let mut cut: String = flattened.chars().take(max).collect();
        cut.push_str("...");
        cut
    }
}
