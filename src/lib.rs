//! Wayplan - multi-agent travel itinerary planner
//!
//! Wayplan orchestrates a master planning agent and three domain specialists
//! (transport, stay, food) over an LLM to turn a chat conversation into
//! concrete itinerary options. The master decides each turn's mode; the core
//! validates, repairs, and executes that decision.
//!
//! # Core Concepts
//!
//! - **Structured Contract**: every agent response is strict JSON validated
//!   against a mode-discriminated schema before anything acts on it
//! - **Question Ledger**: every question asked travels with the trip context,
//!   so the planner never re-asks what the user already answered
//! - **Bounded Repair**: malformed model output gets at most one parse retry,
//!   one schema repair, and one mode correction, then fails typed
//! - **Partial Success**: specialists fan out concurrently; one failure never
//!   sinks a turn as long as another specialist delivered
//!
//! # Modules
//!
//! - [`contract`] - Shared schema and discriminated validation
//! - [`ledger`] - Question ledger operations
//! - [`orchestrator`] - Master agent driver with bounded self-repair
//! - [`executor`] - Fan-out/fan-in specialist execution
//! - [`turn`] - Per-message coordination and Run records
//! - [`llm`] - LLM client trait and OpenAI implementation
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod cli;
pub mod config;
pub mod contract;
pub mod dates;
pub mod executor;
pub mod ledger;
pub mod llm;
pub mod orchestrator;
pub mod prompts;
pub mod specialist;
pub mod turn;

// Re-export commonly used types
pub use config::{Config, LlmConfig, OrchestratorConfig};
pub use contract::{
    AgentTag, MasterOutput, Mode, MultipleItineraries, QuestionLedger, QuestionLedgerEntry, QuestionStatus,
    SpecialistKind, SpecialistOutput, Task, TripContext, ValidationError,
};
pub use executor::{ExecutionReport, ExecutorError, FanOutExecutor};
pub use ledger::QuestionContext;
pub use llm::{create_client, CompletionRequest, CompletionResponse, LlmClient, LlmError, Message, OpenAIClient};
pub use orchestrator::{MasterInput, MasterOrchestrator, OrchestratorError};
pub use specialist::{Invocation, SpecialistInvoker};
pub use turn::{Run, RunStatus, SelectionError, TurnCoordinator, TurnError, TurnFailure, TurnOutcome, TurnRequest};
