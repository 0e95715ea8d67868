//! End-to-end orchestration tests against the public API

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::json;

use wayplan::llm::{CompletionRequest, CompletionResponse, LlmError, StopReason, TokenUsage};
use wayplan::{
    Config, LlmClient, Mode, RunStatus, TripContext, TurnCoordinator, TurnError, TurnRequest,
};

/// Returns scripted response texts in order
struct ScriptedClient {
    responses: Mutex<VecDeque<String>>,
}

impl ScriptedClient {
    fn new(responses: Vec<String>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
        }
    }
}

#[async_trait]
impl LlmClient for ScriptedClient {
    async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let next = self.responses.lock().unwrap().pop_front();
        match next {
            Some(text) => Ok(CompletionResponse {
                content: Some(text),
                stop_reason: StopReason::EndTurn,
                usage: TokenUsage::default(),
            }),
            None => Err(LlmError::InvalidResponse("script exhausted".to_string())),
        }
    }
}

fn coordinator(responses: Vec<String>) -> TurnCoordinator {
    TurnCoordinator::new(std::sync::Arc::new(ScriptedClient::new(responses)), &Config::default())
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 10).unwrap()
}

fn context_json(origin: Option<&str>, destination: Option<&str>) -> serde_json::Value {
    let mut context = TripContext::default();
    context.trip.origin = origin.map(str::to_string);
    context.trip.destinations = destination.map(str::to_string).into_iter().collect();
    serde_json::to_value(&context).unwrap()
}

fn specialist_json(id: &str, agent: &str) -> String {
    json!({
        "taskId": id,
        "agent": agent,
        "recommendations": [{ "option": "a solid choice" }],
        "questionsForUser": [],
        "assumptions": [],
        "risks": []
    })
    .to_string()
}

#[tokio::test]
async fn clarify_scenario_boston_to_miami() {
    let clarify = json!({
        "mode": "CLARIFY",
        "updatedTripContext": context_json(Some("Boston"), Some("Miami")),
        "questions": [
            "When exactly are you traveling?",
            "How many travelers?",
            "What is your budget level?"
        ],
        "shortSummary": "Planning a Boston to Miami trip",
        "nextStep": "Answer the questions above"
    })
    .to_string();

    let coordinator = coordinator(vec![clarify]);
    let outcome = coordinator
        .run_turn_with_today(
            TurnRequest {
                trip_id: "trip-1".to_string(),
                trip_context: None,
                history: vec![],
                user_message: "I want to go from Boston to Miami next month".to_string(),
            },
            today(),
        )
        .await
        .unwrap();

    assert_eq!(outcome.run.execution_stage, Some(Mode::Clarify));
    assert_eq!(outcome.trip_context.trip.origin.as_deref(), Some("Boston"));
    assert_eq!(outcome.trip_context.trip.destinations, vec!["Miami".to_string()]);

    // 1-7 questions returned, all recorded in the ledger
    let ledger = &outcome.trip_context.question_ledger.asked;
    assert_eq!(ledger.len(), 3);
    assert!(ledger.iter().all(|e| e.status == wayplan::QuestionStatus::Asked));
    assert!(outcome.reply.contains("1. When exactly are you traveling?"));
}

#[tokio::test]
async fn dispatch_fans_out_and_finalizes_with_partial_success() {
    let dispatch = json!({
        "mode": "DISPATCH",
        "updatedTripContext": context_json(Some("Boston"), Some("Miami")),
        "tasks": [
            {
                "taskId": "transport-001",
                "taskName": "Get transport options",
                "specialist": "transport",
                "instructions": "Flights Boston to Miami"
            },
            {
                "taskId": "stay-001",
                "taskName": "Find accommodation",
                "specialist": "stay",
                "instructions": "Boutique hotels in Miami"
            },
            {
                "taskId": "food-001",
                "taskName": "Dining and activities",
                "specialist": "food",
                "instructions": "Vegetarian dining in Miami"
            }
        ],
        "questions": [],
        "shortSummary": "Creating your itinerary",
        "nextStep": "Specialists are working"
    })
    .to_string();

    let finalize = json!({
        "mode": "FINALIZE",
        "updatedTripContext": context_json(Some("Boston"), Some("Miami")),
        "multipleItineraries": {
            "options": [
                {
                    "id": "option-1",
                    "title": "Balanced Experience",
                    "description": "A bit of everything",
                    "highlights": ["South Beach", "Wynwood Walls"],
                    "estimatedTotalCost": "$900-1100",
                    "tags": ["Balanced"],
                    "itinerary": {
                        "summary": "Three easy days in Miami",
                        "days": [
                            { "dayNumber": 1, "date": "2025-09-10", "title": "Arrival" },
                            { "dayNumber": 2, "date": null, "title": "Beach day" }
                        ]
                    }
                },
                {
                    "id": "option-2",
                    "title": "Budget Adventure",
                    "description": "Lower cost, same fun",
                    "highlights": [],
                    "estimatedTotalCost": "$600",
                    "tags": ["Budget"],
                    "itinerary": { "summary": "Cheap and cheerful", "days": [] }
                }
            ],
            "comparisonNote": "Same dates, different spend"
        },
        "questions": [],
        "shortSummary": "Here are your itinerary options!",
        "nextStep": "Pick the one you like"
    })
    .to_string();

    // Responses in call order: master DISPATCH, three specialists (one
    // malformed), master FINALIZE
    let coordinator = coordinator(vec![
        dispatch,
        specialist_json("transport-001", "TransportAgent"),
        "this is not json".to_string(),
        specialist_json("food-001", "FoodAgent"),
        finalize,
    ]);

    let outcome = coordinator
        .run_turn_with_today(
            TurnRequest {
                trip_id: "trip-1".to_string(),
                trip_context: None,
                history: vec![],
                user_message: "looks good, proceed".to_string(),
            },
            today(),
        )
        .await
        .unwrap();

    assert_eq!(outcome.run.status, RunStatus::Ok);
    assert_eq!(outcome.run.execution_stage, Some(Mode::Finalize));
    assert_eq!(outcome.run.tasks.len(), 3);
    assert_eq!(outcome.run.specialist_outputs.len(), 2);
    assert_eq!(outcome.run.specialist_errors.len(), 1);
    assert!(outcome.run.specialist_errors[0].starts_with("stay (Find accommodation):"));

    let merged = outcome.run.merged_itineraries.as_ref().unwrap();
    assert_eq!(merged.options.len(), 2);
    // The dateless day inherited the trip's normalized start
    assert!(outcome.reply.contains("2 itinerary options"));
}

#[tokio::test]
async fn all_specialists_failing_fails_the_turn() {
    let dispatch = json!({
        "mode": "DISPATCH",
        "updatedTripContext": context_json(Some("Boston"), Some("Miami")),
        "tasks": [{
            "taskId": "transport-001",
            "taskName": "Get transport options",
            "specialist": "transport",
            "instructions": "Flights"
        }],
        "questions": [],
        "shortSummary": "Dispatching",
        "nextStep": "Working"
    })
    .to_string();

    let coordinator = coordinator(vec![dispatch, "garbage".to_string(), "garbage again".to_string()]);

    let failure = coordinator
        .run_turn_with_today(
            TurnRequest {
                trip_id: "trip-1".to_string(),
                trip_context: None,
                history: vec![],
                user_message: "go ahead".to_string(),
            },
            today(),
        )
        .await
        .unwrap_err();

    assert!(matches!(failure.error, TurnError::Executor(_)));
    assert_eq!(failure.run.status, RunStatus::Error);
    assert!(failure.run.error.as_deref().unwrap().contains("All specialists failed"));
}

#[tokio::test]
async fn repeated_questions_are_filtered_across_turns() {
    let first_clarify = json!({
        "mode": "CLARIFY",
        "updatedTripContext": context_json(Some("Boston"), Some("Miami")),
        "questions": ["What is your budget level?"],
        "shortSummary": "Getting started",
        "nextStep": "Answer the question"
    })
    .to_string();

    let second_clarify = json!({
        "mode": "CLARIFY",
        "updatedTripContext": context_json(Some("Boston"), Some("Miami")),
        "questions": ["What is your budget level?", "Any dietary restrictions?"],
        "shortSummary": "A few more details",
        "nextStep": "Answer the question"
    })
    .to_string();

    let coordinator = coordinator(vec![first_clarify, second_clarify]);

    let first = coordinator
        .run_turn_with_today(
            TurnRequest {
                trip_id: "trip-1".to_string(),
                trip_context: None,
                history: vec![],
                user_message: "Boston to Miami please".to_string(),
            },
            today(),
        )
        .await
        .unwrap();

    // The user answers; the outstanding entry flips to answered
    let second = coordinator
        .run_turn_with_today(
            TurnRequest {
                trip_id: "trip-1".to_string(),
                trip_context: Some(first.trip_context),
                history: vec![],
                user_message: "mid-range budget".to_string(),
            },
            today(),
        )
        .await
        .unwrap();

    // The repeated budget question is suppressed; only the new one survives
    assert!(!second.reply.contains("budget level"));
    assert!(second.reply.contains("1. Any dietary restrictions?"));

    let ledger = &second.trip_context.question_ledger.asked;
    assert_eq!(ledger.len(), 2);
    assert_eq!(ledger[0].status, wayplan::QuestionStatus::Answered);
    assert_eq!(ledger[0].answered_text.as_deref(), Some("mid-range budget"));
}
