use serde::{Deserialize, Serialize};
use crate::models::domain::{Appointment, Provider, Recommendation, Slot};
use crate::services::CacheStats;

/// Response for the recommendations endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationsResponse {
    pub recommendations: Vec<Recommendation>,
}

/// Provider as shown in the listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSummary {
    pub id: String,
    pub name: String,
    pub specialty: String,
    pub address: String,
    pub services: Vec<String>,
    #[serde(rename = "acceptingNewPatients")]
    pub accepting_new_patients: bool,
    pub ratings: f64,
    pub reviews: u32,
    #[serde(rename = "nextAvailable")]
    pub next_available: String,
}

/// Response for the provider listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersResponse {
    pub providers: Vec<ProviderSummary>,
}

/// Response for provider registration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRegisteredResponse {
    pub message: String,
    pub provider: Provider,
}

/// Slots of one provider, with a status message after a change
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotsResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(rename = "providerId")]
    pub provider_id: String,
    pub slots: Vec<Slot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentsResponse {
    pub appointments: Vec<Appointment>,
}

/// Response carrying a single appointment and a status message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appointment: Option<Appointment>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub providers: usize,
    pub cache: CacheStats,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: None,
        }
    }

    pub fn with_message(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: Some(message.into()),
        }
    }
}
