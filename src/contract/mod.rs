//! Structured output contract
//!
//! Defines every shape a planning agent may emit and the validation that
//! guards the orchestrator boundary.

mod types;
mod validate;

pub use types::{
    AgentTag, Budget, BudgetLevel, ClarifyOutput, ConfirmOutput, Constraints, DateRange, Decisions, DispatchOutput,
    FinalizeOutput, Itinerary, ItineraryDay, ItineraryOption, MasterOutput, Mode, MultipleItineraries, Pace,
    Preferences, QuestionLedger, QuestionLedgerEntry, QuestionStatus, SpecialistKind, SpecialistOutput, Task,
    TripContext, TripDetails,
};
pub use validate::{
    validate_clarify, validate_confirm, validate_dispatch, validate_finalize, validate_master_output,
    ValidationError, ValidationIssue, CLARIFY_MAX_QUESTIONS, CLARIFY_MIN_QUESTIONS,
};
