// Core algorithm exports
pub mod distance;
pub mod filters;
pub mod formatter;
pub mod recommender;
pub mod scoring;

pub use distance::{distance_miles, round_to_tenth, EARTH_RADIUS_MILES};
pub use filters::{filter_eligible, is_eligible, matches_cost, matches_search, matches_services, within_distance};
pub use formatter::{cost_summary, format_recommendation, next_available};
pub use recommender::{select_top_k, RecommendationResult, Recommender};
pub use scoring::calculate_score;
