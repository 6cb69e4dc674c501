use crate::core::distance::distance_miles;
use crate::models::{CostPreference, PatientQuery, Provider, ProviderSearch};

/// Default ceiling for a slot to count as low cost
pub const DEFAULT_LOW_COST_THRESHOLD: f64 = 25.0;

/// Check whether any patient need appears inside any of the provider's services
///
/// Containment is case-insensitive: need `checkup` matches `Pediatric Checkup`.
#[inline]
pub fn matches_services(provider: &Provider, query: &PatientQuery) -> bool {
    query.medical_needs.iter().any(|need| {
        provider
            .services
            .iter()
            .any(|service| service.to_lowercase().contains(need.as_str()))
    })
}

/// Check whether the provider lies within the patient's travel distance
#[inline]
pub fn within_distance(provider: &Provider, query: &PatientQuery) -> bool {
    distance_miles(query.location, provider.location) <= query.preferred_distance_miles
}

/// Check whether the provider offers a slot the patient can afford
#[inline]
pub fn matches_cost(provider: &Provider, preference: CostPreference, low_cost_threshold: f64) -> bool {
    match preference {
        CostPreference::Any => true,
        CostPreference::Free => provider.has_free_slot(),
        CostPreference::LowCost => provider.available_slots.iter().any(|slot| {
            slot.cost.is_free()
                || slot.cost.amount().is_some_and(|amount| amount <= low_cost_threshold)
        }),
    }
}

/// A provider is eligible when services, distance and cost all match
#[inline]
pub fn is_eligible(provider: &Provider, query: &PatientQuery, low_cost_threshold: f64) -> bool {
    matches_services(provider, query)
        && within_distance(provider, query)
        && matches_cost(provider, query.preferred_cost, low_cost_threshold)
}

/// Keep the eligible providers, preserving catalog order
pub fn filter_eligible<'a>(
    query: &PatientQuery,
    catalog: &'a [Provider],
    low_cost_threshold: f64,
) -> Vec<&'a Provider> {
    catalog
        .iter()
        .filter(|provider| is_eligible(provider, query, low_cost_threshold))
        .collect()
}

/// Check a provider against the listing filters
///
/// Unset or blank filters match everything. `cost=free` requires a free slot;
/// other cost values are ignored.
pub fn matches_search(provider: &Provider, search: &ProviderSearch) -> bool {
    if let Some(specialty) = non_blank(&search.specialty) {
        if !provider.specialty.to_lowercase().contains(&specialty.to_lowercase()) {
            return false;
        }
    }

    if let Some(zip_code) = non_blank(&search.zip_code) {
        if provider.zip_code.as_deref() != Some(zip_code) {
            return false;
        }
    }

    if let Some(service) = non_blank(&search.service) {
        let service = service.to_lowercase();
        if !provider
            .services
            .iter()
            .any(|s| s.to_lowercase().contains(&service))
        {
            return false;
        }
    }

    if non_blank(&search.cost).is_some_and(|cost| cost.eq_ignore_ascii_case("free"))
        && !provider.has_free_slot()
    {
        return false;
    }

    true
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
