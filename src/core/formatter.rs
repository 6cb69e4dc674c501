use crate::core::distance::{distance_miles, round_to_tenth};
use crate::models::{PatientQuery, Provider, Recommendation};

pub const NO_AVAILABILITY: &str = "No availability";
pub const FREE_OPTIONS: &str = "Free options available";
pub const NO_PRICING: &str = "No pricing available";

/// Build the patient-facing recommendation for an eligible provider
pub fn format_recommendation(query: &PatientQuery, provider: &Provider) -> Recommendation {
    Recommendation {
        provider_id: provider.id.clone(),
        name: provider.name.clone(),
        specialty: provider.specialty.clone(),
        address: provider.address.clone(),
        distance_miles: round_to_tenth(distance_miles(query.location, provider.location)),
        next_available: next_available(provider),
        cost_summary: cost_summary(provider),
    }
}

/// `"<date> at <time>"` of the first listed slot
pub fn next_available(provider: &Provider) -> String {
    match provider.next_slot() {
        Some(slot) => format!("{} at {}", slot.date, slot.time),
        None => NO_AVAILABILITY.to_string(),
    }
}

/// Summarise slot pricing; free slots win over the cheapest paid one
pub fn cost_summary(provider: &Provider) -> String {
    if provider.has_free_slot() {
        return FREE_OPTIONS.to_string();
    }

    match provider.min_slot_amount() {
        Some(amount) => format!("Starting at ${}", amount),
        None => NO_PRICING.to_string(),
    }
}
