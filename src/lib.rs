//! Conversational orchestration over an LLM client and pluggable context
//! services.
//!
//! A [`Chatbot`] asks every configured [`ContextService`] for context, wraps
//! it together with its restrictions into a system prompt, and sends the
//! growing history to an [`LlmClient`].

pub mod chat;
pub mod config;
pub mod error;
pub mod services;
pub mod utils;

pub use chat::{ChatMessage, Chatbot, LlmClient, MessageMapper, MessageRole};
pub use error::{Error, Result};
pub use services::{ContextService, Credentials, RetrieveOptions};
