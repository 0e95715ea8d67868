//! Master orchestrator
//!
//! One call here is one mode decision: the model reads the trip context,
//! conversation, ledger, and any specialist outputs, then emits a MasterOutput.
//! The raw response goes through a bounded repair ladder before anything is
//! trusted: one JSON re-parse attempt, one schema repair attempt, and one
//! mode-correction attempt when specialist outputs demand FINALIZE. At most
//! three model calls per decision; after that the failure is typed, never
//! papered over.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::contract::{validate_master_output, MasterOutput, Mode, QuestionLedgerEntry, SpecialistOutput, TripContext};
use crate::dates::{normalize_date_to_future, normalize_trip_dates};
use crate::llm::{CompletionRequest, LlmClient, LlmError, Message};
use crate::prompts::master_system_prompt;

/// First-attempt sampling temperature
const TEMPERATURE_DEFAULT: f32 = 0.7;
/// Used for repair calls and whenever specialist outputs are present
const TEMPERATURE_REPAIR: f32 = 0.3;
/// Mode-correction retry wants near-determinism
const TEMPERATURE_MODE_REPAIR: f32 = 0.1;

const PARSE_RETRY_INSTRUCTION: &str =
    "Please return ONLY valid JSON matching the required schema, with no markdown or extra text.";

const FINALIZE_INSTRUCTION: &str = "CRITICAL: Specialist outputs have been received. You MUST use mode=\"FINALIZE\" \
     to merge them into a day-by-day itinerary. Do NOT use CLARIFY or DISPATCH mode.";

/// Everything the master needs for one mode decision
#[derive(Debug, Clone, Default)]
pub struct MasterInput {
    pub trip_context: TripContext,
    /// Prior conversation, oldest first; trimmed to the configured window
    pub history: Vec<Message>,
    pub user_message: String,
    pub answered_questions: Vec<QuestionLedgerEntry>,
    pub outstanding_questions: Vec<QuestionLedgerEntry>,
    /// Non-empty forces FINALIZE
    pub specialist_outputs: Vec<SpecialistOutput>,
}

/// Why a mode decision could not be produced
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Model returned no content")]
    NoResponse,

    #[error("Failed to parse model response as JSON even after retry")]
    Parse { raw: String },

    #[error("Schema validation failed after repair: {message}")]
    Schema { message: String, raw: String },

    #[error("Expected {expected} mode when specialist outputs present, but got {actual}")]
    ModeMismatch { expected: Mode, actual: Mode },

    #[error("LLM call failed: {0}")]
    Llm(#[from] LlmError),
}

/// Drives the master agent and guards its output
pub struct MasterOrchestrator {
    client: Arc<dyn LlmClient>,
    max_tokens: u32,
    history_window: usize,
}

impl MasterOrchestrator {
    pub fn new(client: Arc<dyn LlmClient>, config: &Config) -> Self {
        Self {
            client,
            max_tokens: config.llm.max_tokens,
            history_window: config.orchestrator.history_window,
        }
    }

    /// Produce one validated, date-normalized mode decision
    pub async fn decide(&self, input: &MasterInput) -> Result<MasterOutput, OrchestratorError> {
        self.decide_with_today(input, Utc::now().date_naive()).await
    }

    /// Same as `decide`, with the reference date injected for determinism
    pub async fn decide_with_today(
        &self,
        input: &MasterInput,
        today: NaiveDate,
    ) -> Result<MasterOutput, OrchestratorError> {
        let finalize_expected = !input.specialist_outputs.is_empty();
        let request = self.build_request(input, today);

        info!(
            finalize_expected,
            history_len = request.messages.len(),
            "orchestrator: requesting mode decision"
        );

        let raw = self.complete_text(request.clone()).await?;

        // Ladder rung 1: JSON parse, with one retry
        let (parsed, raw) = match serde_json::from_str::<Value>(&raw) {
            Ok(value) => (value, raw),
            Err(e) => {
                warn!(error = %e, "orchestrator: response was not JSON, retrying once");
                let retry_request = request.with_correction(&raw, PARSE_RETRY_INSTRUCTION, TEMPERATURE_REPAIR);
                let retry_raw = self.complete_text(retry_request).await?;
                match serde_json::from_str::<Value>(&retry_raw) {
                    Ok(value) => (value, retry_raw),
                    Err(_) => return Err(OrchestratorError::Parse { raw: retry_raw }),
                }
            }
        };

        // Ladder rung 2: schema validation, with one repair
        let output = match validate_master_output(&parsed) {
            Ok(output) => output,
            Err(validation_error) => {
                let expected_mode = if finalize_expected {
                    "FINALIZE (specialist outputs received)"
                } else {
                    "CLARIFY, CONFIRM, or DISPATCH"
                };
                let correction = format!(
                    "Schema validation failed. Please return JSON strictly matching the required schema. \
                     Expected mode: {}. Here's the error: {}",
                    expected_mode, validation_error
                );
                warn!(error = %validation_error, "orchestrator: schema invalid, repairing once");

                let repair_request = request.with_correction(&raw, &correction, TEMPERATURE_REPAIR);
                let repair_raw = self.complete_text(repair_request).await?;
                let repair_parsed: Value = serde_json::from_str(&repair_raw)
                    .map_err(|_| OrchestratorError::Parse { raw: repair_raw.clone() })?;

                let mut repaired = validate_master_output(&repair_parsed).map_err(|e| OrchestratorError::Schema {
                    message: e.to_string(),
                    raw: repair_raw,
                })?;

                // The repair spent the retry budget; a wrong mode is now final
                normalize_output_dates(&mut repaired, today);
                if finalize_expected && repaired.mode() != Mode::Finalize {
                    return Err(OrchestratorError::ModeMismatch {
                        expected: Mode::Finalize,
                        actual: repaired.mode(),
                    });
                }
                return Ok(repaired);
            }
        };

        let mut output = output;
        normalize_output_dates(&mut output, today);

        // Ladder rung 3: mode gate, with one correction
        if finalize_expected && output.mode() != Mode::Finalize {
            warn!(actual = %output.mode(), "orchestrator: wrong mode with specialist outputs, forcing FINALIZE");
            let correction = format!(
                "ERROR: You used mode=\"{}\" but specialist outputs are present. You MUST use mode=\"FINALIZE\" \
                 to merge the specialist recommendations into 2-3 different itinerary options. Return the complete \
                 JSON with mode=\"FINALIZE\" and include the multipleItineraries field with options array.",
                output.mode()
            );

            let retry_request = request.with_correction(&raw, &correction, TEMPERATURE_MODE_REPAIR);
            let retry_raw = self.complete_text(retry_request).await?;
            let retry_parsed: Value =
                serde_json::from_str(&retry_raw).map_err(|_| OrchestratorError::Parse { raw: retry_raw.clone() })?;
            let mut retried = validate_master_output(&retry_parsed).map_err(|e| OrchestratorError::Schema {
                message: e.to_string(),
                raw: retry_raw,
            })?;
            normalize_output_dates(&mut retried, today);

            if retried.mode() != Mode::Finalize {
                return Err(OrchestratorError::ModeMismatch {
                    expected: Mode::Finalize,
                    actual: retried.mode(),
                });
            }
            return Ok(retried);
        }

        debug!(mode = %output.mode(), "orchestrator: decision validated");
        Ok(output)
    }

    fn build_request(&self, input: &MasterInput, today: NaiveDate) -> CompletionRequest {
        let mut system_prompt = master_system_prompt(
            &input.answered_questions,
            &input.outstanding_questions,
            &input.specialist_outputs,
            today,
        );

        // Current context rides in the system prompt rather than as history
        if let Ok(context_json) = serde_json::to_string_pretty(&input.trip_context) {
            system_prompt.push_str("\n\nCurrent Trip Context:\n");
            system_prompt.push_str(&context_json);
        }

        let skip = input.history.len().saturating_sub(self.history_window);
        let mut messages: Vec<Message> = input.history.iter().skip(skip).cloned().collect();
        messages.push(Message::user(&input.user_message));

        if !input.specialist_outputs.is_empty() {
            messages.push(Message::user(FINALIZE_INSTRUCTION));
        }

        let temperature = if input.specialist_outputs.is_empty() {
            TEMPERATURE_DEFAULT
        } else {
            TEMPERATURE_REPAIR
        };

        CompletionRequest {
            system_prompt,
            messages,
            max_tokens: self.max_tokens,
            temperature,
            json_response: true,
        }
    }

    async fn complete_text(&self, request: CompletionRequest) -> Result<String, OrchestratorError> {
        let response = self.client.complete(request).await?;
        response.content.ok_or(OrchestratorError::NoResponse)
    }
}

/// Normalize every date the output carries, appending assumption notes
///
/// All modes carry an updatedTripContext whose date range is normalized into
/// the future. FINALIZE additionally normalizes every day of every itinerary
/// option; a day with no date inherits the trip's normalized start.
fn normalize_output_dates(output: &mut MasterOutput, today: NaiveDate) {
    let context = output.updated_trip_context_mut();
    let normalized = normalize_trip_dates(
        context.trip.date_range.start.as_deref(),
        context.trip.date_range.end.as_deref(),
        today,
    );
    context.trip.date_range.start = normalized.start.clone();
    context.trip.date_range.end = normalized.end;
    context.assumptions.extend(normalized.assumptions);

    if let MasterOutput::Finalize(finalize) = output {
        let fallback = finalize
            .updated_trip_context
            .trip
            .date_range
            .start
            .clone()
            .unwrap_or_else(|| today.format("%Y-%m-%d").to_string());

        for option in &mut finalize.multiple_itineraries.options {
            for day in &mut option.itinerary.days {
                match day.date.as_deref() {
                    None | Some("") => day.date = Some(fallback.clone()),
                    Some(raw) => {
                        if let Some(normalized) = normalize_date_to_future(Some(raw), today).normalized {
                            day.date = Some(normalized);
                        }
                    }
                }
            }
        }
    }
}
