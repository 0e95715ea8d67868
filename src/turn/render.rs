//! User-facing rendering of master output
//!
//! Turns a validated MasterOutput into the chat reply shown to the user.

use crate::contract::MasterOutput;

/// Format one mode decision as a chat reply
pub fn format_reply(output: &MasterOutput) -> String {
    let mut parts: Vec<String> = Vec::new();

    match output {
        MasterOutput::Confirm(confirm) => {
            // CONFIRM leads with the recap instead of the short summary
            parts.push(confirm.context_summary.clone());
            if !confirm.questions.is_empty() {
                parts.push(String::new());
                parts.push(confirm.questions.join("\n"));
            }
        }
        _ => {
            if !output.short_summary().is_empty() {
                parts.push(output.short_summary().to_string());
                parts.push(String::new());
            }
        }
    }

    match output {
        MasterOutput::Clarify(clarify) => {
            if !clarify.questions.is_empty() {
                parts.push("I have a few questions to help plan your trip better:".to_string());
                for (i, question) in clarify.questions.iter().enumerate() {
                    parts.push(format!("{}. {}", i + 1, question));
                }
                parts.push(String::new());
            }
        }
        MasterOutput::Confirm(_) => {}
        MasterOutput::Dispatch(dispatch) => {
            if !dispatch.tasks.is_empty() {
                parts.push(format!(
                    "I'm now working with {} specialist(s) to create your itinerary:",
                    dispatch.tasks.len()
                ));
                for task in &dispatch.tasks {
                    parts.push(format!("- {}: {}", task.specialist, task.task_name));
                }
                parts.push(String::new());
            }
        }
        MasterOutput::Finalize(finalize) => {
            let itineraries = &finalize.multiple_itineraries;
            parts.push(format!(
                "I've created {} itinerary options for your trip!",
                itineraries.options.len()
            ));
            parts.push(String::new());

            if let Some(note) = &itineraries.comparison_note {
                parts.push(note.clone());
                parts.push(String::new());
            }

            for (i, option) in itineraries.options.iter().enumerate() {
                parts.push(format!("**Option {}: {}**", i + 1, option.title));
                if !option.description.is_empty() {
                    parts.push(option.description.clone());
                }
                if let Some(cost) = &option.estimated_total_cost {
                    parts.push(format!("Estimated cost: {}", cost));
                }
                if !option.itinerary.days.is_empty() {
                    parts.push(format!("{} days", option.itinerary.days.len()));
                }
                if !option.highlights.is_empty() {
                    let preview = option.highlights.iter().take(2).cloned().collect::<Vec<_>>().join(", ");
                    let more = if option.highlights.len() > 2 { "..." } else { "" };
                    parts.push(format!("Highlights: {}{}", preview, more));
                }
                parts.push(String::new());
            }

            parts.push("Review the options and select your preferred itinerary!".to_string());
        }
    }

    if !output.next_step().is_empty() {
        parts.push(output.next_step().to_string());
    }

    parts.join("\n")
}
