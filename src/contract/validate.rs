//! Discriminated validation for master-agent output
//!
//! The raw model response is JSON of unknown shape. Validation resolves the
//! `mode` discriminant, strictly deserializes the matching variant (unknown
//! fields - including fields belonging to other variants - are rejected), and
//! then applies the numeric/array bounds the schema alone cannot express.
//! Failures report field + constraint so the repair prompt can target them.

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use super::types::{ClarifyOutput, ConfirmOutput, DispatchOutput, FinalizeOutput, MasterOutput, Mode};

/// Bounds on CLARIFY questions
pub const CLARIFY_MIN_QUESTIONS: usize = 1;
pub const CLARIFY_MAX_QUESTIONS: usize = 7;

/// One field-level validation problem
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.field.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.field, self.message)
        }
    }
}

/// Structured validation failure, enumerable for repair prompts
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("Response is not a JSON object")]
    NotAnObject,

    #[error("Missing 'mode' field")]
    MissingMode,

    #[error("Unknown mode '{0}', expected CLARIFY, CONFIRM, DISPATCH, or FINALIZE")]
    UnknownMode(String),

    #[error("{mode} output invalid: {}", format_issues(.issues))]
    Variant { mode: Mode, issues: Vec<ValidationIssue> },
}

fn format_issues(issues: &[ValidationIssue]) -> String {
    issues.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

/// Validate a raw model response against the full discriminated contract
pub fn validate_master_output(raw: &Value) -> Result<MasterOutput, ValidationError> {
    let obj = raw.as_object().ok_or(ValidationError::NotAnObject)?;

    let mode_str = obj
        .get("mode")
        .and_then(Value::as_str)
        .ok_or(ValidationError::MissingMode)?;

    let mode = Mode::from_tag(mode_str).ok_or_else(|| ValidationError::UnknownMode(mode_str.to_string()))?;
    debug!(%mode, "validate_master_output: resolved discriminant");

    match mode {
        Mode::Clarify => validate_clarify(raw).map(MasterOutput::Clarify),
        Mode::Confirm => validate_confirm(raw).map(MasterOutput::Confirm),
        Mode::Dispatch => validate_dispatch(raw).map(MasterOutput::Dispatch),
        Mode::Finalize => validate_finalize(raw).map(MasterOutput::Finalize),
    }
}

/// Validate a CLARIFY-shaped object (1-7 questions)
pub fn validate_clarify(raw: &Value) -> Result<ClarifyOutput, ValidationError> {
    let output: ClarifyOutput = parse_variant(raw, Mode::Clarify)?;

    let mut issues = Vec::new();
    if output.questions.len() < CLARIFY_MIN_QUESTIONS {
        issues.push(ValidationIssue {
            field: "questions".to_string(),
            message: "CLARIFY requires at least 1 question".to_string(),
        });
    }
    if output.questions.len() > CLARIFY_MAX_QUESTIONS {
        issues.push(ValidationIssue {
            field: "questions".to_string(),
            message: format!("CLARIFY allows at most {} questions", CLARIFY_MAX_QUESTIONS),
        });
    }

    finish(Mode::Clarify, output, issues)
}

/// Validate a CONFIRM-shaped object
pub fn validate_confirm(raw: &Value) -> Result<ConfirmOutput, ValidationError> {
    let output: ConfirmOutput = parse_variant(raw, Mode::Confirm)?;

    let mut issues = Vec::new();
    if output.context_summary.trim().is_empty() {
        issues.push(ValidationIssue {
            field: "contextSummary".to_string(),
            message: "CONFIRM requires a human-readable recap".to_string(),
        });
    }

    finish(Mode::Confirm, output, issues)
}

/// Validate a DISPATCH-shaped object (>=1 task, zero questions)
pub fn validate_dispatch(raw: &Value) -> Result<DispatchOutput, ValidationError> {
    let output: DispatchOutput = parse_variant(raw, Mode::Dispatch)?;

    let mut issues = Vec::new();
    if output.tasks.is_empty() {
        issues.push(ValidationIssue {
            field: "tasks".to_string(),
            message: "DISPATCH requires at least 1 task".to_string(),
        });
    }
    if !output.questions.is_empty() {
        issues.push(ValidationIssue {
            field: "questions".to_string(),
            message: "DISPATCH must not ask questions".to_string(),
        });
    }

    finish(Mode::Dispatch, output, issues)
}

/// Validate a FINALIZE-shaped object (non-empty options, zero questions)
///
/// The 2-3 option count is a soft contract carried by the prompt; the
/// validator only rejects an empty list.
pub fn validate_finalize(raw: &Value) -> Result<FinalizeOutput, ValidationError> {
    let output: FinalizeOutput = parse_variant(raw, Mode::Finalize)?;

    let mut issues = Vec::new();
    if output.multiple_itineraries.options.is_empty() {
        issues.push(ValidationIssue {
            field: "multipleItineraries.options".to_string(),
            message: "FINALIZE requires at least one itinerary option".to_string(),
        });
    }
    if !output.questions.is_empty() {
        issues.push(ValidationIssue {
            field: "questions".to_string(),
            message: "FINALIZE must not ask questions".to_string(),
        });
    }

    finish(Mode::Finalize, output, issues)
}

/// Strictly deserialize one variant, with the discriminant stripped
fn parse_variant<T: DeserializeOwned>(raw: &Value, mode: Mode) -> Result<T, ValidationError> {
    let mut value = raw.clone();
    if let Some(obj) = value.as_object_mut() {
        obj.remove("mode");
    }

    serde_json::from_value(value).map_err(|e| ValidationError::Variant {
        mode,
        issues: vec![ValidationIssue {
            field: String::new(),
            message: e.to_string(),
        }],
    })
}

fn finish<T>(mode: Mode, output: T, issues: Vec<ValidationIssue>) -> Result<T, ValidationError> {
    if issues.is_empty() {
        Ok(output)
    } else {
        debug!(%mode, issue_count = issues.len(), "validation failed bounds checks");
        Err(ValidationError::Variant { mode, issues })
    }
}
