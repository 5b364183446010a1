use async_trait::async_trait;
use std::error::Error;
use std::sync::Mutex;

/// A ClientWrapper is a wrapper around one hosted LLM chat service.
/// It provides a common interface to interact with the model without tying the
/// rest of the crate to a particular vendor SDK. It does not keep any
/// conversation state; callers assemble the full message list for every call.

/// Represents the possible roles for a message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Role {
    /// Set by the application to steer the model's responses.
    System,
    /// A message sent by a human user (or app user).
    User,
    /// Content previously generated by the model.
    Assistant,
}

/// How many tokens were spent on prompt vs. completion.
#[derive(Clone, Debug)]
pub struct TokenUsage {
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub total_tokens: usize,
}

/// Represents a generic message to be sent to an LLM.
#[derive(Clone, Debug)]
pub struct Message {
    /// The role associated with the message.
    pub role: Role,
    /// The actual content of the message.
    pub content: String,
}

impl Message {
    /// Convenience constructor.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Trait defining the interface to interact with hosted LLM services.
#[async_trait]
pub trait ClientWrapper: Send + Sync {
    /// Send the given messages to the LLM and return the assistant's reply.
    ///
    /// Transport and quota failures surface as errors; callers decide whether
    /// to propagate them or convert them into plain response text.
    async fn send_message(
        &self,
        messages: &[Message],
    ) -> Result<Message, Box<dyn Error + Send + Sync>>;

    /// Identifier of the model this client talks to, for logging.
    fn model_name(&self) -> &str;

    /// Retrieve usage from the *last* `send_message()` call.
    /// Default impl returns None so wrappers without usage tracking don't break.
    fn get_last_usage(&self) -> Option<TokenUsage> {
        self.usage_slot()
            .and_then(|slot| slot.lock().ok().and_then(|u| u.clone()))
    }

    /// Implementations that track [`TokenUsage`] should return their slot here.
    fn usage_slot(&self) -> Option<&Mutex<Option<TokenUsage>>> {
        None
    }
}
