//! Fan-out/fan-in execution of dispatched tasks
//!
//! All tasks launch concurrently; each resolves to exactly one Invocation
//! (success or synthetic failure), so the join is a plain partition with no
//! exception handling. Partial success is success: FINALIZE proceeds with
//! whatever came back, and failures travel along as metadata strings. Only the
//! all-failed case escalates to a turn-level error. No retries here; a failed
//! specialist is final for the turn.

use futures::future::join_all;
use thiserror::Error;
use tracing::{info, warn};

use crate::contract::{SpecialistOutput, Task};
use crate::specialist::SpecialistInvoker;

/// Combined result of one fan-out round
#[derive(Debug, Clone, Default)]
pub struct ExecutionReport {
    /// Successful outputs, in task completion-independent task order
    pub outputs: Vec<SpecialistOutput>,
    /// Human-readable "specialist (taskName): reason" strings for failures
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Error)]
pub enum ExecutorError {
    #[error("All specialists failed: {}", errors.join("; "))]
    AllSpecialistsFailed { errors: Vec<String> },
}

pub struct FanOutExecutor {
    invoker: SpecialistInvoker,
}

impl FanOutExecutor {
    pub fn new(invoker: SpecialistInvoker) -> Self {
        Self { invoker }
    }

    /// Run every task concurrently and partition the results
    pub async fn execute(&self, tasks: &[Task]) -> Result<ExecutionReport, ExecutorError> {
        info!(task_count = tasks.len(), "executor: fanning out");

        let invocations = join_all(tasks.iter().map(|task| self.invoker.invoke(task))).await;

        let mut report = ExecutionReport::default();
        for invocation in invocations {
            match invocation.failure {
                None => {
                    if let Some(output) = invocation.output {
                        report.outputs.push(output);
                    }
                }
                Some(reason) => {
                    warn!(task_id = %invocation.task.task_id, %reason, "executor: task failed");
                    report.errors.push(format!(
                        "{} ({}): {}",
                        invocation.task.specialist, invocation.task.task_name, reason
                    ));
                }
            }
        }

        if report.outputs.is_empty() && !tasks.is_empty() {
            return Err(ExecutorError::AllSpecialistsFailed { errors: report.errors });
        }

        info!(
            ok = report.outputs.len(),
            failed = report.errors.len(),
            "executor: fan-in complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::contract::AgentTag;
    use crate::llm::mock::MockLlmClient;
    use serde_json::json;
    use std::sync::Arc;

    fn task(specialist: &str, id: &str) -> Task {
        serde_json::from_value(json!({
            "taskId": id,
            "taskName": format!("{} work", specialist),
            "specialist": specialist,
            "instructions": "do it"
        }))
        .unwrap()
    }

    fn specialist_json(id: &str, agent: &str) -> String {
        json!({
            "taskId": id,
            "agent": agent,
            "recommendations": [{ "option": "something" }],
            "questionsForUser": [],
            "assumptions": [],
            "risks": []
        })
        .to_string()
    }

    fn executor(client: MockLlmClient) -> (FanOutExecutor, Arc<MockLlmClient>) {
        let client = Arc::new(client);
        let invoker = SpecialistInvoker::new(client.clone(), &Config::default());
        (FanOutExecutor::new(invoker), client)
    }

    #[tokio::test]
    async fn test_all_succeed() {
        let responses = vec![
            specialist_json("transport-001", "TransportAgent"),
            specialist_json("stay-001", "StayAgent"),
            specialist_json("food-001", "FoodAgent"),
        ];
        let (executor, client) = executor(MockLlmClient::with_texts(responses.iter().map(String::as_str).collect()));

        let tasks = vec![
            task("transport", "transport-001"),
            task("stay", "stay-001"),
            task("food", "food-001"),
        ];

        let report = executor.execute(&tasks).await.unwrap();
        assert_eq!(report.outputs.len(), 3);
        assert!(report.errors.is_empty());
        assert_eq!(client.call_count(), 3);
    }

    #[tokio::test]
    async fn test_partial_failure_is_success() {
        let ok = specialist_json("transport-001", "TransportAgent");
        let (executor, _client) = executor(MockLlmClient::with_texts(vec![&ok, "garbage", "more garbage"]));

        let tasks = vec![
            task("transport", "transport-001"),
            task("stay", "stay-001"),
            task("food", "food-001"),
        ];

        let report = executor.execute(&tasks).await.unwrap();
        assert_eq!(report.outputs.len(), 1);
        assert_eq!(report.outputs[0].agent, AgentTag::TransportAgent);
        assert_eq!(report.errors.len(), 2);
        assert!(report.errors[0].starts_with("stay (stay work):"));
        assert!(report.errors[1].starts_with("food (food work):"));
    }

    #[tokio::test]
    async fn test_all_failed_is_typed_error() {
        let (executor, _client) = executor(MockLlmClient::with_texts(vec!["bad", "bad"]));

        let tasks = vec![task("transport", "transport-001"), task("stay", "stay-001")];

        let err = executor.execute(&tasks).await.unwrap_err();
        let ExecutorError::AllSpecialistsFailed { errors } = err;
        assert_eq!(errors.len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_specialist_degrades_without_invoking() {
        let ok = specialist_json("transport-001", "TransportAgent");
        let (executor, client) = executor(MockLlmClient::with_texts(vec![&ok]));

        let tasks = vec![task("yachts", "yachts-001"), task("transport", "transport-001")];

        let report = executor.execute(&tasks).await.unwrap();
        assert_eq!(report.outputs.len(), 1);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("Unknown specialist"));
        // Only the recognized task reached the model
        assert_eq!(client.call_count(), 1);
    }

    #[tokio::test]
    async fn test_empty_task_list() {
        let (executor, _client) = executor(MockLlmClient::with_texts(vec![]));
        let report = executor.execute(&[]).await.unwrap();
        assert!(report.outputs.is_empty());
        assert!(report.errors.is_empty());
    }
}
