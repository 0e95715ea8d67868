//! LlmClient trait definition

use async_trait::async_trait;

use super::{CompletionRequest, CompletionResponse, LlmError};

/// Stateless LLM client - each call is independent
///
/// This is the core abstraction for invoking language models. The orchestrator
/// treats the model as a black box returning text that may or may not be valid
/// JSON; all parsing and validation happen above this seam.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send a single completion request (blocking until complete)
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use crate::llm::{StopReason, TokenUsage};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Mock LLM client for unit tests
    ///
    /// Returns scripted responses in order and records every request so tests
    /// can assert on repair-prompt construction.
    pub struct MockLlmClient {
        responses: Vec<Result<CompletionResponse, String>>,
        call_count: AtomicUsize,
        requests: Mutex<Vec<CompletionRequest>>,
    }

    impl MockLlmClient {
        /// Script a sequence of text responses
        pub fn with_texts(texts: Vec<&str>) -> Self {
            let responses = texts
                .into_iter()
                .map(|t| {
                    Ok(CompletionResponse {
                        content: Some(t.to_string()),
                        stop_reason: StopReason::EndTurn,
                        usage: TokenUsage::default(),
                    })
                })
                .collect();
            Self {
                responses,
                call_count: AtomicUsize::new(0),
                requests: Mutex::new(Vec::new()),
            }
        }

        /// Script a client whose every call fails with the given message
        pub fn failing(message: &str) -> Self {
            Self {
                responses: vec![Err(message.to_string())],
                call_count: AtomicUsize::new(0),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn call_count(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }

        /// Requests seen so far, in order
        pub fn requests(&self) -> Vec<CompletionRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LlmClient for MockLlmClient {
        async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
            let idx = self.call_count.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().unwrap().push(request);
            match self.responses.get(idx.min(self.responses.len().saturating_sub(1))) {
                Some(Ok(resp)) if idx < self.responses.len() => Ok(resp.clone()),
                Some(Err(msg)) => Err(LlmError::InvalidResponse(msg.clone())),
                _ => Err(LlmError::InvalidResponse("No more mock responses".to_string())),
            }
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[tokio::test]
        async fn test_mock_client_returns_responses_in_order() {
            let client = MockLlmClient::with_texts(vec!["one", "two"]);

            let req = CompletionRequest {
                system_prompt: "Test".to_string(),
                messages: vec![],
                max_tokens: 100,
                temperature: 0.7,
                json_response: false,
            };

            let resp = client.complete(req.clone()).await.unwrap();
            assert_eq!(resp.content.as_deref(), Some("one"));

            let resp = client.complete(req.clone()).await.unwrap();
            assert_eq!(resp.content.as_deref(), Some("two"));

            assert!(client.complete(req).await.is_err());
            assert_eq!(client.call_count(), 3);
        }

        #[tokio::test]
        async fn test_mock_client_failing() {
            let client = MockLlmClient::failing("boom");

            let req = CompletionRequest {
                system_prompt: "Test".to_string(),
                messages: vec![],
                max_tokens: 100,
                temperature: 0.7,
                json_response: false,
            };

            assert!(client.complete(req).await.is_err());
        }
    }
}
