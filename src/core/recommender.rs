use crate::core::{
    filters::{filter_eligible, DEFAULT_LOW_COST_THRESHOLD},
    formatter::format_recommendation,
    scoring::calculate_score,
};
use crate::models::{PatientQuery, Provider, Recommendation, ScoringWeights};

/// Default number of recommendations returned
pub const DEFAULT_MAX_RESULTS: usize = 5;

/// Result of the recommendation process
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationResult {
    pub recommendations: Vec<Recommendation>,
    pub total_candidates: usize,
    pub eligible: usize,
}

/// Recommendation pipeline
///
/// # Pipeline Stages
/// 1. Eligibility filter (services, distance, cost)
/// 2. Scoring and stable ranking
/// 3. Top-K selection
/// 4. Formatting
///
/// Holds only configuration; every call works on the snapshot it is given.
#[derive(Debug, Clone)]
pub struct Recommender {
    weights: ScoringWeights,
    low_cost_threshold: f64,
    max_results: usize,
}

impl Recommender {
    pub fn new(weights: ScoringWeights, low_cost_threshold: f64, max_results: usize) -> Self {
        Self {
            weights,
            low_cost_threshold,
            max_results,
        }
    }

    pub fn with_default_weights() -> Self {
        Self::new(ScoringWeights::default(), DEFAULT_LOW_COST_THRESHOLD, DEFAULT_MAX_RESULTS)
    }

    pub fn max_results(&self) -> usize {
        self.max_results
    }

    /// Providers passing every eligibility predicate, in catalog order
    pub fn filter_eligible<'a>(&self, query: &PatientQuery, catalog: &'a [Provider]) -> Vec<&'a Provider> {
        filter_eligible(query, catalog, self.low_cost_threshold)
    }

    /// Stable sort by ascending score; ties keep their input order
    pub fn rank<'a>(&self, query: &PatientQuery, eligible: Vec<&'a Provider>) -> Vec<&'a Provider> {
        let mut scored: Vec<(f64, &Provider)> = eligible
            .into_iter()
            .map(|provider| (calculate_score(provider, query.location, &self.weights), provider))
            .collect();

        scored.sort_by(|(a, _), (b, _)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        scored.into_iter().map(|(_, provider)| provider).collect()
    }

    /// Recommend providers for a patient
    ///
    /// # Arguments
    /// * `query` - The validated patient query
    /// * `catalog` - Read-only provider snapshot
    ///
    /// # Returns
    /// At most `max_results` formatted recommendations, best first
    pub fn recommend(&self, query: &PatientQuery, catalog: &[Provider]) -> RecommendationResult {
        let eligible = self.filter_eligible(query, catalog);
        let eligible_count = eligible.len();

        let ranked = self.rank(query, eligible);

        let recommendations = select_top_k(ranked, self.max_results)
            .into_iter()
            .map(|provider| format_recommendation(query, provider))
            .collect();

        RecommendationResult {
            recommendations,
            total_candidates: catalog.len(),
            eligible: eligible_count,
        }
    }
}

impl Default for Recommender {
    fn default() -> Self {
        Self::with_default_weights()
    }
}

/// First `k` entries of a ranked sequence
pub fn select_top_k<T>(mut ranked: Vec<T>, k: usize) -> Vec<T> {
    ranked.truncate(k);
    ranked
}
