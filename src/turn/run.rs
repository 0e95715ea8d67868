//! Run records
//!
//! One Run is the persistence-ready account of one turn: what the master
//! decided, what was dispatched, what came back, and how it ended. The core
//! never writes a store itself; it hands the finished record to the caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::contract::{MasterOutput, Mode, MultipleItineraries, SpecialistOutput, Task};

/// Terminal state of a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Ok,
    Error,
    AwaitingConfirmation,
    ItinerarySelected,
}

#[derive(Debug, Error)]
pub enum SelectionError {
    #[error("No itinerary options on this run")]
    NoItineraries,

    #[error("No itinerary option with id '{0}'")]
    UnknownOption(String),
}

/// Record of one processed user message
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Run {
    pub id: String,
    pub trip_id: String,
    pub user_message: String,
    pub status: RunStatus,
    /// Mode the turn ended in, when the master produced one
    #[serde(default)]
    pub execution_stage: Option<Mode>,
    #[serde(default)]
    pub master_output: Option<MasterOutput>,
    #[serde(default)]
    pub tasks: Vec<Task>,
    /// Successful specialist outputs only; failures land in specialist_errors
    #[serde(default)]
    pub specialist_outputs: Vec<SpecialistOutput>,
    #[serde(default)]
    pub specialist_errors: Vec<String>,
    #[serde(default)]
    pub merged_itineraries: Option<MultipleItineraries>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub selected_option_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Run {
    pub fn new(trip_id: impl Into<String>, user_message: impl Into<String>) -> Self {
        Self {
            id: run_id(),
            trip_id: trip_id.into(),
            user_message: user_message.into(),
            status: RunStatus::Ok,
            execution_stage: None,
            master_output: None,
            tasks: Vec::new(),
            specialist_outputs: Vec::new(),
            specialist_errors: Vec::new(),
            merged_itineraries: None,
            error: None,
            selected_option_id: None,
            created_at: Utc::now(),
        }
    }

    /// Record the user's choice among FINALIZE options
    pub fn select_option(&mut self, option_id: &str) -> Result<(), SelectionError> {
        let itineraries = self.merged_itineraries.as_ref().ok_or(SelectionError::NoItineraries)?;

        if !itineraries.options.iter().any(|o| o.id == option_id) {
            return Err(SelectionError::UnknownOption(option_id.to_string()));
        }

        self.selected_option_id = Some(option_id.to_string());
        self.status = RunStatus::ItinerarySelected;
        Ok(())
    }
}

fn run_id() -> String {
    let uuid = uuid::Uuid::now_v7();
    format!("{}-run", &uuid.to_string()[..8])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{Itinerary, ItineraryOption};

    fn run_with_options() -> Run {
        let mut run = Run::new("trip-1", "looks good");
        run.execution_stage = Some(Mode::Finalize);
        run.merged_itineraries = Some(MultipleItineraries {
            options: vec![ItineraryOption {
                id: "option-1".to_string(),
                title: "Balanced".to_string(),
                description: String::new(),
                highlights: vec![],
                estimated_total_cost: None,
                tags: vec![],
                itinerary: Itinerary::default(),
            }],
            comparison_note: None,
        });
        run
    }

    #[test]
    fn test_run_ids_are_unique() {
        let a = Run::new("trip-1", "hi");
        let b = Run::new("trip-1", "hi");
        assert_ne!(a.id, b.id);
        assert!(a.id.ends_with("-run"));
    }

    #[test]
    fn test_select_known_option() {
        let mut run = run_with_options();
        run.select_option("option-1").unwrap();
        assert_eq!(run.status, RunStatus::ItinerarySelected);
        assert_eq!(run.selected_option_id.as_deref(), Some("option-1"));
    }

    #[test]
    fn test_select_unknown_option() {
        let mut run = run_with_options();
        let err = run.select_option("option-9").unwrap_err();
        assert!(matches!(err, SelectionError::UnknownOption(_)));
        assert_eq!(run.status, RunStatus::Ok);
    }

    #[test]
    fn test_select_without_itineraries() {
        let mut run = Run::new("trip-1", "hi");
        assert!(matches!(run.select_option("option-1"), Err(SelectionError::NoItineraries)));
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_value(RunStatus::AwaitingConfirmation).unwrap(),
            "awaiting_confirmation"
        );
        assert_eq!(serde_json::to_value(RunStatus::Ok).unwrap(), "ok");
    }
}
