use crate::error::{Error, Result};

use super::message::{ChatMessage, MessageRole};

/// Converts between typed [`ChatMessage`]s and plain `(role, text)` pairs.
///
/// Pairs use the `user`/`assistant`/`system` vocabulary most chat APIs expect,
/// while messages keep the `human`/`ai` roles of the LLM client.
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageMapper;

impl MessageMapper {
    pub fn to_pairs(&self, messages: &[ChatMessage]) -> Vec<(String, String)> {
        messages
            .iter()
            .map(|message| {
                let role = match &message.role {
                    MessageRole::Human => "user",
                    MessageRole::Ai => "assistant",
                    role => role.as_str(),
                };
                (role.to_string(), message.content.clone())
            })
            .collect()
    }

    pub fn to_messages(&self, pairs: &[(String, String)]) -> Result<Vec<ChatMessage>> {
        pairs
            .iter()
            .map(|(role, content)| {
                let role = match role.as_str() {
                    "user" | "human" => MessageRole::Human,
                    "assistant" | "ai" => MessageRole::Ai,
                    "system" => MessageRole::System,
                    _ => return Err(Error::UnknownRole(role.clone())),
                };
                Ok(ChatMessage::new(role, content.clone()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(role: &str, content: &str) -> (String, String) {
        (role.to_string(), content.to_string())
    }

    #[test]
    fn test_roles_are_normalized() {
        let messages = vec![
            ChatMessage::system("be nice"),
            ChatMessage::human("hi"),
            ChatMessage::ai("hello"),
            ChatMessage::new(MessageRole::Other("tool".to_string()), "{}"),
        ];

        let pairs = MessageMapper.to_pairs(&messages);

        assert_eq!(
            pairs,
            vec![
                pair("system", "be nice"),
                pair("user", "hi"),
                pair("assistant", "hello"),
                pair("tool", "{}"),
            ]
        );
    }

    #[test]
    fn test_pairs_round_trip() {
        let pairs = vec![
            pair("system", "You are a helpful chatbot"),
            pair("user", "what is rust?"),
            pair("assistant", "a language"),
            pair("user", "thanks"),
        ];

        let messages = MessageMapper.to_messages(&pairs).unwrap();
        assert_eq!(messages[1].role, MessageRole::Human);
        assert_eq!(messages[2].role, MessageRole::Ai);
        assert_eq!(MessageMapper.to_pairs(&messages), pairs);
    }

    #[test]
    fn test_messages_round_trip() {
        let messages = vec![ChatMessage::human("a"), ChatMessage::ai("b")];
        let pairs = MessageMapper.to_pairs(&messages);
        assert_eq!(MessageMapper.to_messages(&pairs).unwrap(), messages);
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        let err = MessageMapper
            .to_messages(&[pair("user", "ok"), pair("narrator", "meanwhile")])
            .unwrap_err();
        assert!(matches!(err, Error::UnknownRole(role) if role == "narrator"));
    }

    #[test]
    fn test_empty_input() {
        assert!(MessageMapper.to_pairs(&[]).is_empty());
        assert!(MessageMapper.to_messages(&[]).unwrap().is_empty());
    }
}
