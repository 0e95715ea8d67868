//! Trip date normalization
//!
//! Users and models both produce sloppy dates: year-less ("16th Jan"), in the
//! past, or an end date before the start. Everything here is a pure function
//! of the inputs and an explicit `today`, so behavior is deterministic in
//! tests. Every adjustment is surfaced as a human-readable assumption string
//! that the caller appends to the trip context.

use std::sync::OnceLock;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use regex::Regex;
use tracing::debug;

const ISO_FORMAT: &str = "%Y-%m-%d";

/// Formats attempted before falling back to the year-less heuristic
const PARSE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%B %d, %Y", "%b %d, %Y"];

fn month_day_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(\d{1,2})(?:st|nd|rd|th)?\s+(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)")
            .expect("static regex")
    })
}

/// Result of normalizing a single date string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedDate {
    /// ISO `YYYY-MM-DD`, or None when the input was absent or unparseable
    pub normalized: Option<String>,
    /// Human-readable note describing any adjustment made
    pub assumption: Option<String>,
}

impl NormalizedDate {
    fn unchanged(date: NaiveDate) -> Self {
        Self {
            normalized: Some(date.format(ISO_FORMAT).to_string()),
            assumption: None,
        }
    }

    fn none() -> Self {
        Self {
            normalized: None,
            assumption: None,
        }
    }
}

/// Result of normalizing a start/end pair together
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedTripDates {
    pub start: Option<String>,
    pub end: Option<String>,
    pub assumptions: Vec<String>,
}

/// Normalize a single date string into a future ISO date
///
/// Year-less dates resolve to their next occurrence on or after `today`.
/// Fully-specified dates in the past advance year by year (same month/day)
/// until they land in the future. Unparseable input degrades to None rather
/// than erroring. Already-future ISO dates pass through untouched with no
/// assumption.
pub fn normalize_date_to_future(date_str: Option<&str>, today: NaiveDate) -> NormalizedDate {
    let Some(raw) = date_str.map(str::trim).filter(|s| !s.is_empty()) else {
        return NormalizedDate::none();
    };

    if let Some(parsed) = parse_with_formats(raw) {
        if parsed >= today {
            return NormalizedDate::unchanged(parsed);
        }

        let original_year = parsed.year();
        let advanced = next_occurrence(parsed.month(), parsed.day(), today);
        debug!(%raw, from = original_year, to = advanced.year(), "advanced past date");
        return NormalizedDate {
            normalized: Some(advanced.format(ISO_FORMAT).to_string()),
            assumption: Some(format!(
                "Adjusted year from {} to {} (date was in past)",
                original_year,
                advanced.year()
            )),
        };
    }

    // Year-less forms like "16th Jan" or "3 March"
    if let Some(caps) = month_day_re().captures(raw) {
        let day: u32 = match caps[1].parse() {
            Ok(d) => d,
            Err(_) => return NormalizedDate::none(),
        };
        let Some(month) = month_number(&caps[2]) else {
            return NormalizedDate::none();
        };
        // 2000 is a leap year, so Feb 29 passes but impossible days do not
        if NaiveDate::from_ymd_opt(2000, month, day).is_none() {
            return NormalizedDate::none();
        }

        let resolved = next_occurrence(month, day, today);
        let note = if resolved.year() == today.year() {
            format!("Assumed year {} for '{}'", resolved.year(), raw)
        } else {
            format!("Assumed year {} for '{}' (next occurrence)", resolved.year(), raw)
        };
        return NormalizedDate {
            normalized: Some(resolved.format(ISO_FORMAT).to_string()),
            assumption: Some(note),
        };
    }

    debug!(%raw, "could not parse date");
    NormalizedDate::none()
}

/// Normalize a start/end pair, inferring and repairing the end date
///
/// A missing end date with a Friday start becomes start+2 days (Fri-Sun), a
/// Saturday start becomes start+1 (Sat-Sun). An end on or before the start is
/// repaired to start+2 days. Each inference appends one assumption.
pub fn normalize_trip_dates(start: Option<&str>, end: Option<&str>, today: NaiveDate) -> NormalizedTripDates {
    let mut assumptions = Vec::new();

    let start_result = normalize_date_to_future(start, today);
    if let Some(note) = &start_result.assumption {
        assumptions.push(note.clone());
    }

    let mut end_raw: Option<String> = end.map(str::to_string);

    // Weekend inference when the start is known but the end is not
    if end_raw.is_none() {
        if let Some(start_date) = start_result.normalized.as_deref().and_then(parse_iso) {
            match start_date.weekday() {
                Weekday::Fri => {
                    end_raw = Some((start_date + Duration::days(2)).format(ISO_FORMAT).to_string());
                    assumptions.push("Assumed 3-day weekend trip (Friday to Sunday)".to_string());
                }
                Weekday::Sat => {
                    end_raw = Some((start_date + Duration::days(1)).format(ISO_FORMAT).to_string());
                    assumptions.push("Assumed weekend trip (Saturday to Sunday)".to_string());
                }
                _ => {}
            }
        }
    }

    let end_result = normalize_date_to_future(end_raw.as_deref(), today);
    if let Some(note) = &end_result.assumption {
        assumptions.push(note.clone());
    }

    // End must be strictly after start
    if let (Some(start_date), Some(end_date)) = (
        start_result.normalized.as_deref().and_then(parse_iso),
        end_result.normalized.as_deref().and_then(parse_iso),
    ) {
        if end_date <= start_date {
            let repaired = start_date + Duration::days(2);
            assumptions.push("Adjusted end date to be 2 days after start (was invalid)".to_string());
            return NormalizedTripDates {
                start: start_result.normalized,
                end: Some(repaired.format(ISO_FORMAT).to_string()),
                assumptions,
            };
        }
    }

    NormalizedTripDates {
        start: start_result.normalized,
        end: end_result.normalized,
        assumptions,
    }
}

fn parse_with_formats(raw: &str) -> Option<NaiveDate> {
    PARSE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

fn parse_iso(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, ISO_FORMAT).ok()
}

fn month_number(name: &str) -> Option<u32> {
    match name.to_lowercase().as_str() {
        "jan" => Some(1),
        "feb" => Some(2),
        "mar" => Some(3),
        "apr" => Some(4),
        "may" => Some(5),
        "jun" => Some(6),
        "jul" => Some(7),
        "aug" => Some(8),
        "sep" => Some(9),
        "oct" => Some(10),
        "nov" => Some(11),
        "dec" => Some(12),
        _ => None,
    }
}

/// Next calendar occurrence of month/day on or after `today`
///
/// Skips years where the combination does not exist (Feb 29 in a common year).
fn next_occurrence(month: u32, day: u32, today: NaiveDate) -> NaiveDate {
    let mut year = today.year();
    loop {
        if let Some(candidate) = NaiveDate::from_ymd_opt(year, month, day) {
            if candidate >= today {
                return candidate;
            }
        }
        year += 1;
    }
}
