//! Question ledger operations
//!
//! The ledger lives inside TripContext so it always travels and persists with
//! the trip. It records every question ever posed to the user and prevents the
//! planner from re-asking what has already been answered. All operations
//! degrade by no-op on malformed input; none of them return errors.

use std::collections::HashSet;
use std::sync::OnceLock;

use chrono::Utc;
use regex::Regex;
use tracing::debug;

use crate::contract::{QuestionLedgerEntry, QuestionStatus, TripContext};

/// Minimum answered questions before the context is considered dispatch-ready
pub const MIN_ANSWERED_FOR_DISPATCH: usize = 8;

fn numbered_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^\s*\d+[.)]\s*.+$").expect("static regex"))
}

/// Normalize question text for duplicate detection
///
/// Case-insensitive, punctuation-stripped, whitespace-collapsed.
pub fn normalize_question_text(text: &str) -> String {
    let lowered = text.to_lowercase();
    let stripped: String = lowered
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Generate a stable ledger entry id: `{6-char-hex}-q-{slug}`
fn question_id(text: &str) -> String {
    let uuid = uuid::Uuid::now_v7();
    let hex_prefix = &uuid.to_string()[..6];
    let slug: String = normalize_question_text(text)
        .split_whitespace()
        .take(4)
        .collect::<Vec<_>>()
        .join("-");
    if slug.is_empty() {
        format!("{}-q", hex_prefix)
    } else {
        format!("{}-q-{}", hex_prefix, slug)
    }
}

/// Guarantee a ledger exists on the context
///
/// Idempotent and safe to call every turn. The ledger field is non-optional
/// with an empty default, so this exists for call-site symmetry with contexts
/// deserialized from older records.
pub fn ensure(context: &mut TripContext) {
    let _ = &mut context.question_ledger;
}

/// Append new questions with status=asked
///
/// Skips any candidate whose normalized text collides with an entry already in
/// the ledger or with an earlier candidate in the same call. Cross-turn
/// filtering against answered questions is `filter_duplicates`' job.
pub fn add_questions(context: &mut TripContext, questions: &[String]) {
    let now = Utc::now();
    let mut seen: HashSet<String> = context
        .question_ledger
        .asked
        .iter()
        .map(|e| normalize_question_text(&e.text))
        .collect();

    for question in questions {
        let normalized = normalize_question_text(question);
        if normalized.is_empty() || !seen.insert(normalized) {
            debug!(%question, "add_questions: skipping duplicate");
            continue;
        }

        context.question_ledger.asked.push(QuestionLedgerEntry {
            id: question_id(question),
            text: question.clone(),
            status: QuestionStatus::Asked,
            answered_text: None,
            asked_at: Some(now),
            answered_at: None,
        });
    }
}

/// Attribute the latest user message to outstanding questions
///
/// Heuristic, not a semantic parse: if the message contains numbered lines
/// (`1. ...`), they map positionally onto outstanding entries in ledger order;
/// any remaining outstanding entries (and the non-numbered case) are marked
/// answered with the full message as shared answer text. Already-answered
/// entries are never touched, so status stays monotonic.
pub fn mark_answered(context: &mut TripContext, user_message: &str) {
    let now = Utc::now();

    let numbered: Vec<String> = numbered_line_re()
        .find_iter(user_message)
        .map(|m| m.as_str().trim().to_string())
        .collect();

    let mut outstanding_index = 0usize;
    for entry in &mut context.question_ledger.asked {
        if entry.status == QuestionStatus::Answered {
            continue;
        }

        let answered_text = numbered
            .get(outstanding_index)
            .cloned()
            .unwrap_or_else(|| user_message.to_string());
        outstanding_index += 1;

        entry.status = QuestionStatus::Answered;
        entry.answered_text = Some(answered_text);
        entry.answered_at = Some(now);
    }

    if outstanding_index > 0 {
        debug!(count = outstanding_index, "mark_answered: attributed user message");
    }
}

/// Remove candidates that duplicate an already-answered question
///
/// Outstanding (unanswered) questions are deliberately not filtered: the
/// master may re-surface them as a nudge. Intra-batch duplicates are removed.
pub fn filter_duplicates(candidates: &[String], context: &TripContext) -> Vec<String> {
    let answered: HashSet<String> = context
        .question_ledger
        .asked
        .iter()
        .filter(|e| e.status == QuestionStatus::Answered)
        .map(|e| normalize_question_text(&e.text))
        .collect();

    let mut seen_in_batch = HashSet::new();
    candidates
        .iter()
        .filter(|q| {
            let normalized = normalize_question_text(q);
            !answered.contains(&normalized) && seen_in_batch.insert(normalized)
        })
        .cloned()
        .collect()
}

/// Ledger partitioned by status, for prompt construction
#[derive(Debug, Clone, Default)]
pub struct QuestionContext {
    pub answered: Vec<QuestionLedgerEntry>,
    pub outstanding: Vec<QuestionLedgerEntry>,
}

/// Partition the ledger into answered and outstanding entries
pub fn question_context(context: &TripContext) -> QuestionContext {
    let mut partitions = QuestionContext::default();
    for entry in &context.question_ledger.asked {
        match entry.status {
            QuestionStatus::Answered => partitions.answered.push(entry.clone()),
            QuestionStatus::Asked => partitions.outstanding.push(entry.clone()),
        }
    }
    partitions
}

/// Advisory predicate: has enough been gathered to dispatch specialists?
///
/// Requires a minimum count of answered questions plus the required trip
/// fields. Transport preference is optional. This feeds the master's prompt;
/// the model makes the final mode decision.
pub fn is_ready_to_dispatch(context: &TripContext) -> bool {
    let answered_count = context
        .question_ledger
        .asked
        .iter()
        .filter(|e| e.status == QuestionStatus::Answered)
        .count();

    let trip = &context.trip;

    answered_count >= MIN_ANSWERED_FOR_DISPATCH
        && trip.origin.is_some()
        && !trip.destinations.is_empty()
        && trip.date_range.start.is_some()
        && trip.date_range.end.is_some()
        && trip.travelers.is_some()
        && trip.budget.level.is_some()
        && trip.preferences.pace.is_some()
        && trip.preferences.hotel_style.is_some()
        && !trip.preferences.dietary.is_empty()
        && (!trip.preferences.interests.is_empty() || !trip.constraints.must_do.is_empty())
}
