use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MessageType {
    User,
    Assistant,
    System,
}

impl MessageType {
    /// Role name used by OpenAI-compatible chat APIs.
    pub fn role(&self) -> &'static str {
        match self {
            MessageType::User => "user",
            MessageType::Assistant => "assistant",
            MessageType::System => "system",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub generation_tokens: u32,
    pub total_tokens: u32,
}

impl TokenUsage {
    pub fn new(prompt_tokens: u32, generation_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            generation_tokens,
            total_tokens: prompt_tokens.saturating_add(generation_tokens),
        }
    }

    /// Deserialized usage is taken as-is, so the total may not add up.
    pub fn is_consistent(&self) -> bool {
        self.prompt_tokens.checked_add(self.generation_tokens) == Some(self.total_tokens)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub message_id: String,
    pub session_id: String,
    #[serde(rename = "type")]
    pub message_type: MessageType,
    pub content: String,
    pub timestamp: DateTime<Local>,
    #[serde(default)]
    pub read: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_usage: Option<TokenUsage>,
}

impl Message {
    pub fn new(
        session_id: impl Into<String>,
        message_type: MessageType,
        content: impl Into<String>,
    ) -> Self {
        Self {
            message_id: Uuid::new_v4().to_string(),
            session_id: session_id.into(),
            message_type,
            content: content.into(),
            timestamp: Local::now(),
            read: false,
            token_usage: None,
        }
    }

    pub fn user(session_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(session_id, MessageType::User, content)
    }

    pub fn assistant(session_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(session_id, MessageType::Assistant, content)
    }

    pub fn system(session_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(session_id, MessageType::System, content)
    }

    pub fn with_token_usage(mut self, usage: TokenUsage) -> Self {
        self.token_usage = Some(usage);
        self
    }

    pub fn mark_read(&mut self) {
        self.read = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_usage_total() {
        let usage = TokenUsage::new(12, 30);
        assert_eq!(usage.total_tokens, 42);
        assert!(usage.is_consistent());

        let bogus = TokenUsage {
            prompt_tokens: 1,
            generation_tokens: 1,
            total_tokens: 5,
        };
        assert!(!bogus.is_consistent());
    }

    #[test]
    fn test_message_defaults() {
        let a = Message::user("s-1", "hi");
        let b = Message::user("s-1", "hi");
        assert_ne!(a.message_id, b.message_id);
        assert!(!a.read);
        assert!(a.token_usage.is_none());
        assert_eq!(a.message_type.role(), "user");
    }

    #[test]
    fn test_message_serializes_type_uppercase() {
        let msg = Message::assistant("s-1", "ok").with_token_usage(TokenUsage::new(1, 2));
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "ASSISTANT");
        assert_eq!(json["sessionId"], "s-1");
        assert_eq!(json["tokenUsage"]["totalTokens"], 3);
    }
}
