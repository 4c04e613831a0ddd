//! Message bodies sent to the assistant thread.

use chrono::NaiveDateTime;

use faqdesk_core::reservation::Reservation;
use faqdesk_core::types::SearchResult;

pub const RELATED_HEADER: &str = "Related Questions from customers :";

const INSTRUCTION: &str = "Generate a response as a customer service rep to the User's Query based on their reservation details and the provided Related FAQ context (if relevant).";

/// First message of every thread: the reservation record and its recent history.
pub fn initial_context(reservation: &Reservation, history: usize) -> String {
    let r = reservation;
    let mut out = format!(
        "Context about the customer's reservation:\n\
         Reservation ID: {}\n\
         Trip Start: {}\n\
         Trip End: {}\n\
         Trip Duration: {}\n\
         Delivery Location: {}\n\
         Vehicle Type: {}\n\
         Delivery Location Category: {}\n\
         Car Product Type: {}\n\
         Customer Type: {}\n\
         Customer Name: {}\n",
        r.reservation_id,
        r.trip_start,
        r.trip_end,
        r.trip_duration,
        r.delivery_location,
        r.vehicle_type,
        r.delivery_location_category,
        r.car_product_type,
        r.customer_type,
        r.customer_name,
    );
    let recent = r.recent_messages(history);
    if !recent.is_empty() {
        out.push_str("\nPrevious conversation with the customer:\n");
        for m in recent {
            out.push_str(&format!("{} ({}): {}\n", m.author, m.created, m.text));
        }
    }
    out
}

pub fn related_questions(results: &[SearchResult]) -> String {
    let body = results
        .iter()
        .map(|r| format!("Question: {}\nAnswer: {}", r.question, r.answer))
        .collect::<Vec<_>>()
        .join("\n\n");
    format!("{RELATED_HEADER}\n{body}")
}

pub fn combined_message(user_message: &str, results: &[SearchResult]) -> String {
    format!("User Query: {user_message}\n\n{}\n\n{INSTRUCTION}", related_questions(results))
}

/// `2024-03-05T14:07:00.000Z` → `March 05, 2024 at 02:07 PM`.
///
/// Returns `None` when `raw` is not in that shape.
pub fn format_timestamp(raw: &str) -> Option<String> {
    let parsed = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.fZ").ok()?;
    Some(parsed.format("%B %d, %Y at %I:%M %p").to_string())
}
