pub mod chatbot;
pub mod client;
pub mod history;
pub mod mapper;
pub mod message;
pub mod prompt;

pub use chatbot::Chatbot;
pub use client::LlmClient;
pub use history::{ConversationHistory, TurnPolicy};
pub use mapper::MessageMapper;
pub use message::{ChatMessage, MessageRole};
pub use prompt::PromptTemplates;
