use crate::core::distance::distance_miles;
use crate::models::{GeoPoint, Provider, ScoringWeights};

/// Calculate a ranking score for a provider (lower is better)
///
/// Scoring formula:
/// score = distance_miles * 0.5     # farther = worse
///       - ratings * 0.3            # better rated = better
///       - available_slots * 0.2    # more availability = better
pub fn calculate_score(provider: &Provider, origin: GeoPoint, weights: &ScoringWeights) -> f64 {
    let distance = distance_miles(origin, provider.location);
    score_components(distance, provider.ratings, provider.available_slots.len(), weights)
}

#[inline]
fn score_components(distance: f64, ratings: f64, slot_count: usize, weights: &ScoringWeights) -> f64 {
    distance * weights.distance - ratings * weights.rating - slot_count as f64 * weights.availability
}
