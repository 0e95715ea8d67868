//! LLM request/response types
//!
//! These types model the OpenAI Chat Completions API but are provider-agnostic
//! enough to support other providers.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// A completion request - everything needed for one LLM call
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// System prompt for this call
    pub system_prompt: String,

    /// Conversation messages in order
    pub messages: Vec<Message>,

    /// Max tokens for response (from config)
    pub max_tokens: u32,

    /// Sampling temperature (lower for repair calls)
    pub temperature: f32,

    /// Whether to request a JSON-object response format
    pub json_response: bool,
}

impl CompletionRequest {
    /// Clone this request with the given assistant/user exchange appended
    ///
    /// Used by the repair loop: the model's bad response is replayed as an
    /// assistant turn followed by a corrective user instruction.
    pub fn with_correction(&self, bad_response: &str, correction: &str, temperature: f32) -> Self {
        debug!(temperature, "with_correction: building repair request");
        let mut messages = self.messages.clone();
        messages.push(Message::assistant(bad_response));
        messages.push(Message::user(correction));
        Self {
            system_prompt: self.system_prompt.clone(),
            messages,
            max_tokens: self.max_tokens,
            temperature,
            json_response: self.json_response,
        }
    }
}

/// A message in the conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    /// Create a user message
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: text.into(),
        }
    }

    /// Create an assistant message
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: text.into(),
        }
    }
}

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Response from a completion request
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// Text content (if any)
    pub content: Option<String>,

    /// Why the model stopped
    pub stop_reason: StopReason,

    /// Token usage for cost tracking
    pub usage: TokenUsage,
}

/// Why the model stopped generating
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    EndTurn,
    MaxTokens,
    StopSequence,
}

impl StopReason {
    /// Parse from an OpenAI finish_reason string
    pub fn from_finish_reason(s: &str) -> Self {
        match s {
            "stop" => StopReason::EndTurn,
            "length" => StopReason::MaxTokens,
            "content_filter" => StopReason::StopSequence,
            _ => StopReason::EndTurn,
        }
    }
}

/// Token usage for cost tracking
#[derive(Debug, Clone, Default)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_constructors() {
        let msg = Message::user("Hello");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "Hello");

        let msg = Message::assistant("Hi there");
        assert_eq!(msg.role, Role::Assistant);
    }

    #[test]
    fn test_with_correction_appends_exchange() {
        let request = CompletionRequest {
            system_prompt: "system".to_string(),
            messages: vec![Message::user("plan my trip")],
            max_tokens: 1000,
            temperature: 0.7,
            json_response: true,
        };

        let repaired = request.with_correction("{bad", "Return only valid JSON.", 0.3);

        assert_eq!(repaired.messages.len(), 3);
        assert_eq!(repaired.messages[1].role, Role::Assistant);
        assert_eq!(repaired.messages[1].content, "{bad");
        assert_eq!(repaired.messages[2].role, Role::User);
        assert!((repaired.temperature - 0.3).abs() < f32::EPSILON);
        assert!(repaired.json_response);
    }

    #[test]
    fn test_stop_reason_from_finish_reason() {
        assert_eq!(StopReason::from_finish_reason("stop"), StopReason::EndTurn);
        assert_eq!(StopReason::from_finish_reason("length"), StopReason::MaxTokens);
        assert_eq!(StopReason::from_finish_reason("unknown"), StopReason::EndTurn);
    }
}
