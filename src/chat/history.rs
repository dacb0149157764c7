use std::ops::Deref;

use serde::{Deserialize, Serialize};

use super::message::ChatMessage;

/// What happens to a turn's system and human messages when the LLM call fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnPolicy {
    /// Leave the unanswered question in the history.
    #[default]
    KeepUnanswered,
    /// Roll the history back to where it was before the turn.
    Atomic,
}

/// Marks the history length at the start of a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct TurnCheckpoint(usize);

/// Append-only message log owned by a single chatbot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationHistory {
    messages: Vec<ChatMessage>,
}

impl ConversationHistory {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self { messages }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn begin_turn(&mut self, system: ChatMessage, human: ChatMessage) -> TurnCheckpoint {
        let checkpoint = TurnCheckpoint(self.messages.len());
        self.messages.push(system);
        self.messages.push(human);
        checkpoint
    }

    pub fn commit_turn(&mut self, _checkpoint: TurnCheckpoint, reply: ChatMessage) {
        self.messages.push(reply);
    }

    pub fn abort_turn(&mut self, checkpoint: TurnCheckpoint, policy: TurnPolicy) {
        match policy {
            TurnPolicy::KeepUnanswered => {}
            TurnPolicy::Atomic => self.messages.truncate(checkpoint.0),
        }
    }
}

impl Deref for ConversationHistory {
    type Target = [ChatMessage];

    fn deref(&self) -> &Self::Target {
        &self.messages
    }
}
