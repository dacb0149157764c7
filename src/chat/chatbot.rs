use std::sync::Arc;

use crate::{
    error::{Error, Result},
    services::{ContextService, RetrieveOptions},
};

use super::{
    client::LlmClient,
    history::{ConversationHistory, TurnPolicy},
    mapper::MessageMapper,
    message::ChatMessage,
    prompt::PromptTemplates,
};

/// Runs a conversation: each question is answered with fresh context from
/// every configured service and the full restriction list.
pub struct Chatbot {
    llm: Arc<dyn LlmClient>,
    context_services: Vec<Box<dyn ContextService>>,
    restrictions: Vec<String>,
    personality: String,
    templates: PromptTemplates,
    history: ConversationHistory,
    message_mapper: MessageMapper,
    turn_policy: TurnPolicy,
}

impl Chatbot {
    /// Fails with [`Error::InvalidArgument`] when there are no context
    /// services or no restrictions. Without `messages` the history starts
    /// with an introduction built from `personality`.
    pub fn new(
        llm: Arc<dyn LlmClient>,
        context_services: Vec<Box<dyn ContextService>>,
        restrictions: Vec<String>,
        personality: impl Into<String>,
        messages: Option<Vec<ChatMessage>>,
        message_mapper: MessageMapper,
    ) -> Result<Self> {
        Self::with_templates(
            llm,
            context_services,
            restrictions,
            personality,
            messages,
            message_mapper,
            PromptTemplates::default(),
        )
    }

    pub fn with_templates(
        llm: Arc<dyn LlmClient>,
        context_services: Vec<Box<dyn ContextService>>,
        restrictions: Vec<String>,
        personality: impl Into<String>,
        messages: Option<Vec<ChatMessage>>,
        message_mapper: MessageMapper,
        templates: PromptTemplates,
    ) -> Result<Self> {
        if context_services.is_empty() {
            return Err(Error::InvalidArgument(
                "at least one context service is required".to_string(),
            ));
        }
        if restrictions.is_empty() {
            return Err(Error::InvalidArgument(
                "at least one restriction is required".to_string(),
            ));
        }

        let personality = personality.into();
        let messages = match messages {
            Some(messages) => messages,
            None => vec![ChatMessage::system(templates.introduction(&personality))],
        };

        Ok(Self {
            llm,
            context_services,
            restrictions,
            personality,
            templates,
            history: ConversationHistory::new(messages),
            message_mapper,
            turn_policy: TurnPolicy::default(),
        })
    }

    pub fn turn_policy(mut self, policy: TurnPolicy) -> Self {
        self.turn_policy = policy;
        self
    }

    pub fn personality(&self) -> &str {
        &self.personality
    }

    pub fn messages(&self) -> &[ChatMessage] {
        self.history.messages()
    }

    /// History as `(role, text)` pairs with `user`/`assistant` roles.
    pub fn pairs(&self) -> Vec<(String, String)> {
        self.message_mapper.to_pairs(self.history.messages())
    }

    /// Answers `question`, appending the system, human and AI messages.
    ///
    /// A failing context service aborts before the history is touched. A
    /// failing LLM call leaves the turn to the configured [`TurnPolicy`].
    pub async fn chat(&mut self, question: &str) -> Result<String> {
        let contexts = self.retrieve_contexts(question).await?;

        let system = self.templates.system_prompt(&contexts, &self.restrictions);
        let system = ChatMessage::system(system);
        let human = ChatMessage::human(question);

        let checkpoint = self.history.begin_turn(system, human);

        let reply = match self.llm.invoke(self.history.messages()).await {
            Ok(reply) => reply,
            Err(why) => {
                log::warn!("llm call failed, turn policy {:?}", self.turn_policy);
                self.history.abort_turn(checkpoint, self.turn_policy);
                return Err(Error::ExternalService(why));
            }
        };

        let answer = reply.content.clone();
        self.history.commit_turn(checkpoint, reply);

        log::info!(
            "answered with {} context(s), history at {} messages",
            contexts.len(),
            self.history.len()
        );

        Ok(answer)
    }

    async fn retrieve_contexts(&self, question: &str) -> Result<Vec<String>> {
        let options = RetrieveOptions::default();
        let mut contexts = Vec::with_capacity(self.context_services.len());

        for service in &self.context_services {
            let context = service.retrieve_context(question, &options).await?;
            log::debug!("[{}] retrieved {} bytes of context", service.name(), context.len());
            contexts.push(context);
        }

        Ok(contexts)
    }
}
