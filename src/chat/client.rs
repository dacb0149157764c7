use async_trait::async_trait;

use super::message::ChatMessage;

mod agent;
pub mod providers;

pub use agent::CompletionAgent;

/// Anything that can answer a conversation with one more message.
///
/// Implementations talk to a model provider; failures are reported as-is and
/// the chatbot never retries them.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn invoke(&self, history: &[ChatMessage]) -> anyhow::Result<ChatMessage>;
}
