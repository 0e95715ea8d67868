//! Specialist invoker
//!
//! One polymorphic implementation covers transport, stay, and food; the only
//! differences between specialists are the persona prompt and the agent tag
//! stamped onto the output. The contract is "exactly one result per task,
//! never an exception": any failure (network, timeout, malformed model output)
//! degrades into a synthetic SpecialistOutput plus a failure reason, so fan-in
//! stays a pure merge.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tracing::{debug, warn};

use crate::config::Config;
use crate::contract::{AgentTag, SpecialistOutput, Task};
use crate::llm::{CompletionRequest, LlmClient, Message};
use crate::prompts::specialist_system_prompt;

const SPECIALIST_TEMPERATURE: f32 = 0.7;

/// The single result of invoking one task
#[derive(Debug, Clone)]
pub struct Invocation {
    pub task: Task,
    /// Present for every recognized specialist; synthetic when degraded.
    /// None only when the task named an unrecognized specialist.
    pub output: Option<SpecialistOutput>,
    /// Why the output is synthetic (or absent); None on success
    pub failure: Option<String>,
}

impl Invocation {
    pub fn succeeded(&self) -> bool {
        self.failure.is_none()
    }
}

pub struct SpecialistInvoker {
    client: Arc<dyn LlmClient>,
    max_tokens: u32,
    timeout: Duration,
}

impl SpecialistInvoker {
    pub fn new(client: Arc<dyn LlmClient>, config: &Config) -> Self {
        Self {
            client,
            max_tokens: config.llm.max_tokens,
            timeout: Duration::from_millis(config.orchestrator.specialist_timeout_ms),
        }
    }

    /// Run one task to exactly one result; never errors
    pub async fn invoke(&self, task: &Task) -> Invocation {
        let Some(agent) = task.specialist.agent_tag() else {
            warn!(task_id = %task.task_id, specialist = %task.specialist, "unrecognized specialist, not invoking");
            return Invocation {
                task: task.clone(),
                output: None,
                failure: Some(format!("Unknown specialist: {}", task.specialist)),
            };
        };
        let Some(system_prompt) = specialist_system_prompt(task.specialist) else {
            // agent_tag and the persona table cover the same closed set
            return Invocation {
                task: task.clone(),
                output: None,
                failure: Some(format!("Unknown specialist: {}", task.specialist)),
            };
        };

        debug!(task_id = %task.task_id, specialist = %task.specialist, "invoking specialist");

        let outcome = tokio::time::timeout(self.timeout, self.call_model(task, system_prompt)).await;

        match outcome {
            Ok(Ok(output)) => Invocation {
                task: task.clone(),
                output: Some(output),
                failure: None,
            },
            Ok(Err(reason)) => {
                warn!(task_id = %task.task_id, %reason, "specialist degraded to synthetic output");
                Invocation {
                    task: task.clone(),
                    output: Some(synthetic_output(task, agent, &reason)),
                    failure: Some(reason),
                }
            }
            Err(_) => {
                let reason = format!("Timed out after {}ms", self.timeout.as_millis());
                warn!(task_id = %task.task_id, %reason, "specialist timed out");
                Invocation {
                    task: task.clone(),
                    output: Some(synthetic_output(task, agent, &reason)),
                    failure: Some(reason),
                }
            }
        }
    }

    async fn call_model(&self, task: &Task, system_prompt: &str) -> Result<SpecialistOutput, String> {
        let task_json = serde_json::to_string_pretty(task).map_err(|e| e.to_string())?;
        let request = CompletionRequest {
            system_prompt: system_prompt.to_string(),
            messages: vec![Message::user(format!(
                "Task: {}\n\nProvide {} recommendations following the strict JSON schema.",
                task_json, task.specialist
            ))],
            max_tokens: self.max_tokens,
            temperature: SPECIALIST_TEMPERATURE,
            json_response: true,
        };

        let response = self.client.complete(request).await.map_err(|e| e.to_string())?;
        let content = response.content.ok_or_else(|| "No response from model".to_string())?;

        serde_json::from_str::<SpecialistOutput>(&content).map_err(|e| format!("Schema validation failed: {}", e))
    }
}

/// Degraded output in the shape FINALIZE knows how to read past
fn synthetic_output(task: &Task, agent: AgentTag, reason: &str) -> SpecialistOutput {
    SpecialistOutput {
        task_id: task.task_id.clone(),
        agent,
        recommendations: vec![json!({
            "error": format!("Failed to generate {} recommendations", task.specialist),
            "message": reason,
        })],
        questions_for_user: vec![],
        assumptions: vec![format!("Unable to process {} options due to error", task.specialist)],
        risks: vec![format!("{} planning incomplete", task.specialist)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::SpecialistKind;
    use crate::llm::mock::MockLlmClient;

    fn task(specialist: &str) -> Task {
        serde_json::from_value(json!({
            "taskId": format!("{}-001", specialist),
            "taskName": "Do the thing",
            "specialist": specialist,
            "instructions": "Boston to Miami, 2 travelers"
        }))
        .unwrap()
    }

    fn invoker(client: MockLlmClient) -> (SpecialistInvoker, Arc<MockLlmClient>) {
        let client = Arc::new(client);
        (SpecialistInvoker::new(client.clone(), &Config::default()), client)
    }

    fn valid_output_json() -> String {
        json!({
            "taskId": "transport-001",
            "agent": "TransportAgent",
            "recommendations": [{ "option": "Flight - Nonstop", "estimatedCost": "$250-$450" }],
            "questionsForUser": [],
            "assumptions": ["Economy class assumed"],
            "risks": ["Prices fluctuate by season"]
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_successful_invocation() {
        let valid = valid_output_json();
        let (invoker, client) = invoker(MockLlmClient::with_texts(vec![&valid]));

        let invocation = invoker.invoke(&task("transport")).await;

        assert!(invocation.succeeded());
        let output = invocation.output.unwrap();
        assert_eq!(output.agent, AgentTag::TransportAgent);
        assert_eq!(output.recommendations.len(), 1);

        let requests = client.requests();
        assert!(requests[0].system_prompt.contains("Transport Agent"));
        assert!(requests[0].messages[0].content.contains("transport-001"));
        assert!(requests[0].json_response);
    }

    #[tokio::test]
    async fn test_malformed_response_degrades() {
        let (invoker, _client) = invoker(MockLlmClient::with_texts(vec!["not json"]));

        let invocation = invoker.invoke(&task("stay")).await;

        assert!(!invocation.succeeded());
        assert!(invocation.failure.as_deref().unwrap().contains("Schema validation failed"));

        let output = invocation.output.unwrap();
        assert_eq!(output.task_id, "stay-001");
        assert_eq!(output.agent, AgentTag::StayAgent);
        assert_eq!(output.recommendations[0]["error"], "Failed to generate stay recommendations");
        assert_eq!(output.assumptions, vec!["Unable to process stay options due to error"]);
        assert_eq!(output.risks, vec!["stay planning incomplete"]);
    }

    #[tokio::test]
    async fn test_llm_error_degrades() {
        let (invoker, _client) = invoker(MockLlmClient::failing("connection refused"));

        let invocation = invoker.invoke(&task("food")).await;

        assert!(!invocation.succeeded());
        assert!(invocation.output.is_some());
    }

    #[tokio::test]
    async fn test_unknown_specialist_never_calls_model() {
        let valid = valid_output_json();
        let (invoker, client) = invoker(MockLlmClient::with_texts(vec![&valid]));

        let unknown = task("yachts");
        assert_eq!(unknown.specialist, SpecialistKind::Unknown);

        let invocation = invoker.invoke(&unknown).await;

        assert!(!invocation.succeeded());
        assert!(invocation.output.is_none());
        assert_eq!(invocation.failure.as_deref(), Some("Unknown specialist: unknown"));
        assert_eq!(client.call_count(), 0);
    }
}
