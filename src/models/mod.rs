// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    Appointment, AppointmentStatus, CostPreference, GeoPoint, PatientQuery, Provider, ProviderSearch,
    Recommendation, ScoringWeights, Slot, SlotCost,
};
pub use requests::{
    AddSlotsRequest, AppointmentChanges, AppointmentFilter, AppointmentIdQuery, CreateAppointmentRequest, NewAppointment,
    PatientPayload, RecommendationRequest, RegisterProviderRequest, RequestError, UpdateAppointmentRequest,
    UpdateSlotRequest,
};
pub use responses::{
    AppointmentResponse, AppointmentsResponse, ErrorResponse, HealthResponse, ProviderRegisteredResponse,
    ProviderSummary, ProvidersResponse, RecommendationsResponse, SlotsResponse,
};
