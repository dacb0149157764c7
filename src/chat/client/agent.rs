use async_trait::async_trait;
use rig::{
    completion::CompletionRequest,
    message::{AssistantContent, Message},
};

use crate::{
    chat::{ChatMessage, MessageRole},
    config::structure::LLMConfig,
};

use super::{LlmClient, providers::DynCompletionModel};

/// [`LlmClient`] backed by a rig completion model.
pub struct CompletionAgent {
    completion_model: Box<dyn DynCompletionModel>,
    config: LLMConfig,
}

impl CompletionAgent {
    pub fn new(config: LLMConfig) -> anyhow::Result<Self> {
        let client = config
            .provider
            .client(&config.api_key, config.base_url.as_deref())?;
        let completion_model = client.completion_model(&config.model);

        Ok(Self::with_model(completion_model, config))
    }

    pub fn with_model(completion_model: Box<dyn DynCompletionModel>, config: LLMConfig) -> Self {
        Self {
            completion_model,
            config,
        }
    }

    fn request(&self, history: &[ChatMessage]) -> anyhow::Result<CompletionRequest> {
        let (system, mut conversation): (Vec<_>, Vec<_>) = history
            .iter()
            .partition(|message| message.role == MessageRole::System);

        let preamble = system
            .iter()
            .map(|message| message.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        let prompt = conversation
            .pop()
            .ok_or(anyhow::anyhow!("history has no message to answer"))?;

        Ok(CompletionRequest {
            additional_params: None,
            chat_history: conversation.into_iter().map(to_rig_message).collect(),
            documents: vec![],
            max_tokens: self.config.max_tokens,
            preamble: (!preamble.is_empty()).then_some(preamble),
            temperature: self.config.temperature,
            tools: vec![],
            prompt: to_rig_message(prompt),
        })
    }
}

fn to_rig_message(message: &ChatMessage) -> Message {
    match message.role {
        MessageRole::Ai => Message::assistant(message.content.clone()),
        _ => Message::user(message.content.clone()),
    }
}

#[async_trait]
impl LlmClient for CompletionAgent {
    async fn invoke(&self, history: &[ChatMessage]) -> anyhow::Result<ChatMessage> {
        let request = self.request(history)?;

        log::debug!(
            "requesting completion from {} ({} history messages)",
            self.config.model,
            request.chat_history.len()
        );

        let response = self.completion_model.completion(request).await?;

        if let AssistantContent::Text(text) = response.first() {
            Ok(ChatMessage::ai(text.text))
        } else {
            Err(anyhow::anyhow!("model answered with a tool call instead of text"))
        }
    }
}
