pub mod chat_client;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use chat_client::ChatCompletionsClient;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Chat-completion collaborator. Returns the raw text of the first choice.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InferenceClient: Send + Sync {
    async fn complete(&self, model: &str, messages: &[ChatMessage]) -> anyhow::Result<String>;
}
