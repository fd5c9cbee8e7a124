//! LLM provider access: the chat-completion trait, the OpenRouter client and
//! the model fallback chain.

use async_trait::async_trait;
use serde::Serialize;

use crate::error::InvokeError;

pub mod fallback;
pub mod openrouter;

pub use fallback::{complete_with_fallback, Completion};
pub use openrouter::OpenRouterClient;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// A chat-completion backend. One call is one attempt against one model.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Run a completion and return the first choice's text verbatim.
    async fn complete(
        &self,
        model: &str,
        messages: &[ChatMessage],
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, InvokeError>;
}
