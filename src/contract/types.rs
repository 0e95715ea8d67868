//! Shared schema for everything crossing the orchestrator boundary
//!
//! Field names serialize in camelCase because that is the JSON contract the
//! planning agents are prompted to emit. Inner objects stay permissive (the
//! model may add detail); the MasterOutput variants themselves are strict so
//! fields from one mode can never leak into another.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The accumulating structured understanding of a trip
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TripContext {
    pub trip: TripDetails,
    pub decisions: Decisions,
    pub open_questions: Vec<String>,
    pub assumptions: Vec<String>,
    /// Embedded so the ledger always travels and persists with the context
    pub question_ledger: QuestionLedger,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TripDetails {
    pub origin: Option<String>,
    pub destinations: Vec<String>,
    pub date_range: DateRange,
    pub travelers: Option<u32>,
    pub budget: Budget,
    pub preferences: Preferences,
    pub constraints: Constraints,
}

/// ISO date strings; normalized into the future before a context is persisted
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DateRange {
    pub start: Option<String>,
    pub end: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Budget {
    pub level: Option<BudgetLevel>,
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetLevel {
    Low,
    Mid,
    High,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Preferences {
    pub pace: Option<Pace>,
    pub interests: Vec<String>,
    pub dietary: Vec<String>,
    pub hotel_style: Option<String>,
    pub transport_preference: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pace {
    Relaxed,
    Moderate,
    Packed,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Constraints {
    pub must_do: Vec<String>,
    pub avoid: Vec<String>,
}

/// Informational record of confirmed facts and open items
///
/// Not authoritative for gating; the ledger is.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Decisions {
    pub confirmed: Vec<String>,
    pub pending: Vec<String>,
}

/// Every question ever posed to the user, in insertion order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QuestionLedger {
    pub asked: Vec<QuestionLedgerEntry>,
}

/// One question lifecycle record
///
/// Status is monotonic: asked -> answered, never reversed, never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionLedgerEntry {
    pub id: String,
    pub text: String,
    pub status: QuestionStatus,
    #[serde(default)]
    pub answered_text: Option<String>,
    #[serde(default)]
    pub asked_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub answered_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionStatus {
    Asked,
    Answered,
}

/// One unit of work dispatched to a specialist. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub task_id: String,
    pub task_name: String,
    pub specialist: SpecialistKind,
    pub instructions: String,
}

/// The closed set of specialist agents
///
/// An unrecognized tag deserializes to `Unknown` so a bad DISPATCH task can be
/// degraded individually by the executor instead of failing validation for
/// the whole output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpecialistKind {
    Transport,
    Stay,
    Food,
    #[serde(other)]
    Unknown,
}

impl SpecialistKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SpecialistKind::Transport => "transport",
            SpecialistKind::Stay => "stay",
            SpecialistKind::Food => "food",
            SpecialistKind::Unknown => "unknown",
        }
    }

    /// The agent tag a specialist stamps onto its output
    pub fn agent_tag(self) -> Option<AgentTag> {
        match self {
            SpecialistKind::Transport => Some(AgentTag::TransportAgent),
            SpecialistKind::Stay => Some(AgentTag::StayAgent),
            SpecialistKind::Food => Some(AgentTag::FoodAgent),
            SpecialistKind::Unknown => None,
        }
    }
}

impl std::fmt::Display for SpecialistKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgentTag {
    TransportAgent,
    StayAgent,
    FoodAgent,
}

/// One specialist's result
///
/// Produced exactly once per dispatched task; failures become synthetic
/// degraded outputs with `risks` noting incompleteness, never missing entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecialistOutput {
    pub task_id: String,
    pub agent: AgentTag,
    /// Domain-specific shape is not enforced beyond "a list exists"
    pub recommendations: Vec<serde_json::Value>,
    #[serde(default)]
    pub questions_for_user: Vec<String>,
    #[serde(default)]
    pub assumptions: Vec<String>,
    #[serde(default)]
    pub risks: Vec<String>,
}

/// One day inside an itinerary option
///
/// Only the fields the orchestrator touches are typed; the rest of the day
/// record (transport, accommodation, meals, activities) flows through as-is.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ItineraryDay {
    pub day_number: u32,
    pub date: Option<String>,
    pub title: String,
    #[serde(flatten)]
    pub detail: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Itinerary {
    pub summary: String,
    pub days: Vec<ItineraryDay>,
    #[serde(flatten)]
    pub detail: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItineraryOption {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub highlights: Vec<String>,
    #[serde(default)]
    pub estimated_total_cost: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub itinerary: Itinerary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultipleItineraries {
    pub options: Vec<ItineraryOption>,
    #[serde(default)]
    pub comparison_note: Option<String>,
}

/// CLARIFY: insufficient information; ask 1-7 targeted questions
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ClarifyOutput {
    pub updated_trip_context: TripContext,
    pub questions: Vec<String>,
    pub short_summary: String,
    pub next_step: String,
}

/// CONFIRM: recap gathered context and ask for go-ahead
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ConfirmOutput {
    pub updated_trip_context: TripContext,
    pub context_summary: String,
    #[serde(default)]
    pub questions: Vec<String>,
    pub short_summary: String,
    pub next_step: String,
}

/// DISPATCH: hand tasks to the specialists; no questions allowed
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DispatchOutput {
    pub updated_trip_context: TripContext,
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub questions: Vec<String>,
    pub short_summary: String,
    pub next_step: String,
}

/// FINALIZE: merge specialist results into 2-3 distinct itinerary options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FinalizeOutput {
    pub updated_trip_context: TripContext,
    pub multiple_itineraries: MultipleItineraries,
    #[serde(default)]
    pub questions: Vec<String>,
    pub short_summary: String,
    pub next_step: String,
}

/// The master agent's validated output - a tagged union keyed by mode
///
/// Exactly one variant is live per instance; cross-variant fields are rejected
/// by validation, not merely ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "mode")]
pub enum MasterOutput {
    #[serde(rename = "CLARIFY")]
    Clarify(ClarifyOutput),
    #[serde(rename = "CONFIRM")]
    Confirm(ConfirmOutput),
    #[serde(rename = "DISPATCH")]
    Dispatch(DispatchOutput),
    #[serde(rename = "FINALIZE")]
    Finalize(FinalizeOutput),
}

impl MasterOutput {
    pub fn mode(&self) -> Mode {
        match self {
            MasterOutput::Clarify(_) => Mode::Clarify,
            MasterOutput::Confirm(_) => Mode::Confirm,
            MasterOutput::Dispatch(_) => Mode::Dispatch,
            MasterOutput::Finalize(_) => Mode::Finalize,
        }
    }

    pub fn updated_trip_context(&self) -> &TripContext {
        match self {
            MasterOutput::Clarify(o) => &o.updated_trip_context,
            MasterOutput::Confirm(o) => &o.updated_trip_context,
            MasterOutput::Dispatch(o) => &o.updated_trip_context,
            MasterOutput::Finalize(o) => &o.updated_trip_context,
        }
    }

    pub fn updated_trip_context_mut(&mut self) -> &mut TripContext {
        match self {
            MasterOutput::Clarify(o) => &mut o.updated_trip_context,
            MasterOutput::Confirm(o) => &mut o.updated_trip_context,
            MasterOutput::Dispatch(o) => &mut o.updated_trip_context,
            MasterOutput::Finalize(o) => &mut o.updated_trip_context,
        }
    }

    pub fn short_summary(&self) -> &str {
        match self {
            MasterOutput::Clarify(o) => &o.short_summary,
            MasterOutput::Confirm(o) => &o.short_summary,
            MasterOutput::Dispatch(o) => &o.short_summary,
            MasterOutput::Finalize(o) => &o.short_summary,
        }
    }

    pub fn next_step(&self) -> &str {
        match self {
            MasterOutput::Clarify(o) => &o.next_step,
            MasterOutput::Confirm(o) => &o.next_step,
            MasterOutput::Dispatch(o) => &o.next_step,
            MasterOutput::Finalize(o) => &o.next_step,
        }
    }
}

/// Orchestration mode, mirrored onto runs as the execution stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Mode {
    Clarify,
    Confirm,
    Dispatch,
    Finalize,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Clarify => "CLARIFY",
            Mode::Confirm => "CONFIRM",
            Mode::Dispatch => "DISPATCH",
            Mode::Finalize => "FINALIZE",
        }
    }

    pub fn from_tag(value: &str) -> Option<Self> {
        match value {
            "CLARIFY" => Some(Mode::Clarify),
            "CONFIRM" => Some(Mode::Confirm),
            "DISPATCH" => Some(Mode::Dispatch),
            "FINALIZE" => Some(Mode::Finalize),
            _ => None,
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
