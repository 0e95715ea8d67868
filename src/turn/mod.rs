//! Turn coordination
//!
//! Drives one user message end-to-end: ledger bookkeeping, the master's mode
//! decision, fan-out on DISPATCH, the FINALIZE re-invocation, and assembly of
//! the Run record. Every exit path (including failures) yields a Run the
//! caller can persist in a single write.

pub mod render;
pub mod run;

pub use run::{Run, RunStatus, SelectionError};

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::Config;
use crate::contract::{MasterOutput, Mode, TripContext};
use crate::executor::{ExecutorError, FanOutExecutor};
use crate::ledger;
use crate::llm::{LlmClient, Message};
use crate::orchestrator::{MasterInput, MasterOrchestrator, OrchestratorError};
use crate::specialist::SpecialistInvoker;

/// One incoming user message plus the state it operates on
#[derive(Debug, Clone, Default)]
pub struct TurnRequest {
    pub trip_id: String,
    /// None for a fresh trip
    pub trip_context: Option<TripContext>,
    /// Prior conversation, oldest first
    pub history: Vec<Message>,
    pub user_message: String,
}

/// A completed turn, ready to surface and persist
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub reply: String,
    pub trip_context: TripContext,
    pub run: Run,
}

#[derive(Debug, Error)]
pub enum TurnError {
    #[error(transparent)]
    Orchestrator(#[from] OrchestratorError),

    #[error(transparent)]
    Executor(#[from] ExecutorError),

    #[error("FINALIZE mode should only be reached after DISPATCH")]
    UnexpectedFinalize,
}

/// A failed turn still carries its error Run for persistence
#[derive(Debug, Error)]
#[error("{error}")]
pub struct TurnFailure {
    pub error: TurnError,
    pub run: Run,
}

pub struct TurnCoordinator {
    orchestrator: MasterOrchestrator,
    executor: FanOutExecutor,
}

impl TurnCoordinator {
    pub fn new(client: Arc<dyn LlmClient>, config: &Config) -> Self {
        Self {
            orchestrator: MasterOrchestrator::new(client.clone(), config),
            executor: FanOutExecutor::new(SpecialistInvoker::new(client, config)),
        }
    }

    /// Process one user message end-to-end
    pub async fn run_turn(&self, request: TurnRequest) -> Result<TurnOutcome, TurnFailure> {
        self.run_turn_with_today(request, Utc::now().date_naive()).await
    }

    /// Same as `run_turn`, with the reference date injected for determinism
    pub async fn run_turn_with_today(
        &self,
        request: TurnRequest,
        today: NaiveDate,
    ) -> Result<TurnOutcome, TurnFailure> {
        let mut context = request.trip_context.clone().unwrap_or_default();
        ledger::ensure(&mut context);
        ledger::mark_answered(&mut context, &request.user_message);
        let partitions = ledger::question_context(&context);

        info!(
            trip_id = %request.trip_id,
            answered = partitions.answered.len(),
            outstanding = partitions.outstanding.len(),
            "turn: starting"
        );

        let input = MasterInput {
            trip_context: context.clone(),
            history: request.history.clone(),
            user_message: request.user_message.clone(),
            answered_questions: partitions.answered.clone(),
            outstanding_questions: partitions.outstanding.clone(),
            specialist_outputs: Vec::new(),
        };

        let mut run = Run::new(&request.trip_id, &request.user_message);

        let output = match self.orchestrator.decide_with_today(&input, today).await {
            Ok(output) => output,
            Err(e) => {
                warn!(error = %e, "turn: master decision failed");
                run.status = RunStatus::Error;
                run.error = Some(e.to_string());
                return Err(TurnFailure { error: e.into(), run });
            }
        };

        match output {
            MasterOutput::Clarify(mut clarify) => {
                // The local ledger is authoritative; the model's echo is not
                let survivors = ledger::filter_duplicates(&clarify.questions, &context);
                clarify.questions = survivors.clone();
                clarify.updated_trip_context.question_ledger = context.question_ledger.clone();
                ledger::add_questions(&mut clarify.updated_trip_context, &survivors);

                let updated = clarify.updated_trip_context.clone();
                let output = MasterOutput::Clarify(clarify);
                let reply = render::format_reply(&output);

                run.execution_stage = Some(Mode::Clarify);
                run.master_output = Some(output);
                Ok(TurnOutcome {
                    reply,
                    trip_context: updated,
                    run,
                })
            }

            MasterOutput::Confirm(mut confirm) => {
                confirm.updated_trip_context.question_ledger = context.question_ledger.clone();

                let updated = confirm.updated_trip_context.clone();
                let output = MasterOutput::Confirm(confirm);
                let reply = render::format_reply(&output);

                run.status = RunStatus::AwaitingConfirmation;
                run.execution_stage = Some(Mode::Confirm);
                run.master_output = Some(output);
                Ok(TurnOutcome {
                    reply,
                    trip_context: updated,
                    run,
                })
            }

            MasterOutput::Dispatch(mut dispatch) => {
                dispatch.updated_trip_context.question_ledger = context.question_ledger.clone();
                run.execution_stage = Some(Mode::Dispatch);
                run.tasks = dispatch.tasks.clone();

                let report = match self.executor.execute(&dispatch.tasks).await {
                    Ok(report) => report,
                    Err(e) => {
                        warn!(error = %e, "turn: all specialists failed");
                        if let ExecutorError::AllSpecialistsFailed { errors } = &e {
                            run.specialist_errors = errors.clone();
                        }
                        run.status = RunStatus::Error;
                        run.error = Some(e.to_string());
                        run.master_output = Some(MasterOutput::Dispatch(dispatch));
                        return Err(TurnFailure { error: e.into(), run });
                    }
                };

                run.specialist_outputs = report.outputs.clone();
                run.specialist_errors = report.errors.clone();

                let finalize_input = MasterInput {
                    trip_context: dispatch.updated_trip_context.clone(),
                    history: request.history,
                    user_message: request.user_message,
                    answered_questions: partitions.answered,
                    outstanding_questions: partitions.outstanding,
                    specialist_outputs: report.outputs,
                };
                run.master_output = Some(MasterOutput::Dispatch(dispatch));

                let merged = match self.orchestrator.decide_with_today(&finalize_input, today).await {
                    Ok(output) => output,
                    Err(e) => {
                        warn!(error = %e, "turn: merge failed");
                        run.status = RunStatus::Error;
                        run.error = Some(format!("Merge failed: {}", e));
                        return Err(TurnFailure { error: e.into(), run });
                    }
                };

                match merged {
                    MasterOutput::Finalize(mut finalize) => {
                        finalize.updated_trip_context.question_ledger = context.question_ledger.clone();

                        let updated = finalize.updated_trip_context.clone();
                        run.merged_itineraries = Some(finalize.multiple_itineraries.clone());
                        run.execution_stage = Some(Mode::Finalize);

                        let reply = render::format_reply(&MasterOutput::Finalize(finalize));
                        info!(trip_id = %request.trip_id, "turn: itinerary options ready");
                        Ok(TurnOutcome {
                            reply,
                            trip_context: updated,
                            run,
                        })
                    }
                    other => {
                        // The orchestrator's mode gate makes this unreachable
                        run.status = RunStatus::Error;
                        run.error = Some(format!("Expected FINALIZE mode, got {}", other.mode()));
                        Err(TurnFailure {
                            error: TurnError::Orchestrator(OrchestratorError::ModeMismatch {
                                expected: Mode::Finalize,
                                actual: other.mode(),
                            }),
                            run,
                        })
                    }
                }
            }

            MasterOutput::Finalize(_) => {
                run.status = RunStatus::Error;
                run.execution_stage = Some(Mode::Finalize);
                run.error = Some("FINALIZE mode should only be reached after DISPATCH".to_string());
                Err(TurnFailure {
                    error: TurnError::UnexpectedFinalize,
                    run,
                })
            }
        }
    }
}
