//! The `OpenAIClient` struct implements [`ClientWrapper`] for OpenAI's Chat
//! API, capturing both the assistant response and token usage (input vs
//! output) for cost tracking.
//!
//! # Example
//!
//! ```rust,no_run
//! use workforce::client_wrapper::{ClientWrapper, Message, Role};
//! use workforce::clients::openai::{Model, OpenAIClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let secret_key = std::env::var("OPENAI_API_KEY").expect("OPENAI_API_KEY not set");
//!     let client = OpenAIClient::new_with_model_enum(&secret_key, Model::GPT4oMini);
//!
//!     let reply = client
//!         .send_message(&[
//!             Message::new(Role::System, "You are an assistant."),
//!             Message::new(Role::User, "Hello!"),
//!         ])
//!         .await?;
//!     println!("Assistant: {}", reply.content);
//!
//!     if let Some(usage) = client.get_last_usage() {
//!         println!("Tokens used: {}", usage.total_tokens);
//!     }
//!     Ok(())
//! }
//! ```

use std::error::Error;
use std::sync::Mutex;

use async_trait::async_trait;
use openai_rust::chat;
use openai_rust2 as openai_rust;

use crate::workforce::client_wrapper::{ClientWrapper, Message, Role, TokenUsage};
use crate::workforce::clients::shared_http_client;

/// Model identifiers supported by OpenAI's Chat Completions API.
#[allow(non_camel_case_types)]
pub enum Model {
    /// `gpt-4o` - Omni model with text + image inputs.
    GPT4o,
    /// `gpt-4o-mini` - cost effective GPT-4o derivative.
    GPT4oMini,
    /// `gpt-4.1` - general availability GPT-4.1.
    GPT41,
    /// `gpt-4.1-mini` - reduced cost GPT-4.1 tier.
    GPT41Mini,
    /// `gpt-4.1-nano` - ultra low cost GPT-4.1 derivative.
    GPT41Nano,
    /// `o4-mini` - O-series low-latency reasoning tier.
    O4Mini,
}

/// Convert a [`Model`] variant into the string identifier expected by the REST API.
pub fn model_to_string(model: Model) -> String {
    match model {
        Model::GPT4o => "gpt-4o".to_string(),
        Model::GPT4oMini => "gpt-4o-mini".to_string(),
        Model::GPT41 => "gpt-4.1".to_string(),
        Model::GPT41Mini => "gpt-4.1-mini".to_string(),
        Model::GPT41Nano => "gpt-4.1-nano".to_string(),
        Model::O4Mini => "o4-mini".to_string(),
    }
}

/// Client wrapper for OpenAI's Chat Completions API.
///
/// The wrapper maintains the selected model identifier plus an internal
/// [`TokenUsage`] slot so callers can inspect how many tokens each request
/// consumed. It reuses the shared HTTP client from
/// [`crate::workforce::clients`].
pub struct OpenAIClient {
    /// Underlying SDK client pointing at the REST endpoint.
    client: openai_rust::Client,
    /// Model name that will be injected into each request.
    model: String,
    /// Storage for the token usage returned by the most recent request.
    token_usage: Mutex<Option<TokenUsage>>,
}

impl OpenAIClient {
    /// Construct a new client using the provided API key and [`Model`] variant.
    pub fn new_with_model_enum(secret_key: &str, model: Model) -> Self {
        Self::new_with_model_string(secret_key, &model_to_string(model))
    }

    /// Construct a new client using the provided API key and explicit model name.
    ///
    /// This is the most general constructor and can be used for unofficial
    /// model identifiers (e.g. OpenAI compatible self-hosted deployments).
    pub fn new_with_model_string(secret_key: &str, model_name: &str) -> Self {
        OpenAIClient {
            client: openai_rust::Client::new_with_client(secret_key, shared_http_client()),
            model: model_name.to_string(),
            token_usage: Mutex::new(None),
        }
    }

    /// Construct a client targeting a custom OpenAI compatible base URL.
    pub fn new_with_base_url(secret_key: &str, model_name: &str, base_url: &str) -> Self {
        OpenAIClient {
            client: openai_rust::Client::new_with_client_and_base_url(
                secret_key,
                shared_http_client(),
                base_url,
            ),
            model: model_name.to_string(),
            token_usage: Mutex::new(None),
        }
    }
}

#[async_trait]
impl ClientWrapper for OpenAIClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn send_message(
        &self,
        messages: &[Message],
    ) -> Result<Message, Box<dyn Error + Send + Sync>> {
        // Convert the provided messages into the format expected by openai_rust
        let mut formatted_messages = Vec::with_capacity(messages.len());
        for msg in messages {
            formatted_messages.push(chat::Message {
                role: match msg.role {
                    Role::System => "system".to_owned(),
                    Role::User => "user".to_owned(),
                    Role::Assistant => "assistant".to_owned(),
                },
                content: msg.content.clone(),
            });
        }

        let chat_arguments = chat::ChatArguments::new(&self.model, formatted_messages);
        let url_path_string = "/v1/chat/completions".to_string();

        let response = self
            .client
            .create_chat(chat_arguments, Some(url_path_string))
            .await;

        match response {
            Ok(response) => {
                let usage = TokenUsage {
                    input_tokens: response.usage.prompt_tokens as usize,
                    output_tokens: response.usage.completion_tokens as usize,
                    total_tokens: response.usage.total_tokens as usize,
                };
                if let Ok(mut slot) = self.token_usage.lock() {
                    *slot = Some(usage);
                }

                let content = response
                    .choices
                    .first()
                    .map(|choice| choice.message.content.clone())
                    .ok_or("OpenAI response contained no choices")?;

                Ok(Message {
                    role: Role::Assistant,
                    content,
                })
            }
            Err(err) => {
                log::error!(
                    "OpenAIClient::send_message(...): OpenAI API Error: {}",
                    err
                );
                Err(format!("OpenAI API error: {}", err).into())
            }
        }
    }

    fn usage_slot(&self) -> Option<&Mutex<Option<TokenUsage>>> {
        Some(&self.token_usage)
    }
}
