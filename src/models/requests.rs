use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::Validate;

use crate::models::domain::{CostPreference, GeoPoint, PatientQuery, Provider, Slot, SlotCost};

/// Boundary validation failures
#[derive(Debug, Error, PartialEq)]
pub enum RequestError {
    #[error("Missing required patient information")]
    MissingPatientInformation,

    #[error("Invalid patient information")]
    InvalidPatientInformation(String),

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Missing appointment ID")]
    MissingAppointmentId,

    #[error("Invalid field: {0}")]
    InvalidField(String),
}

impl RequestError {
    /// Optional detail shown next to the error summary
    pub fn detail(&self) -> Option<String> {
        match self {
            RequestError::InvalidPatientInformation(detail) => Some(detail.clone()),
            _ => None,
        }
    }
}

/// Request body for POST /api/recommendations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecommendationRequest {
    #[serde(default)]
    pub patient: Option<PatientPayload>,
}

/// Patient section of a recommendation request; every field optional so that
/// absent ones surface as validation errors rather than JSON errors
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientPayload {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub location: Option<GeoPoint>,
    #[serde(default)]
    pub medical_needs: Option<Vec<String>>,
    #[serde(default)]
    pub preferred_cost: Option<CostPreference>,
    #[serde(default)]
    pub preferred_distance: Option<f64>,
}

impl RecommendationRequest {
    /// Validate the request and normalise it into a query for the recommender
    pub fn into_query(self) -> Result<PatientQuery, RequestError> {
        let patient = self.patient.ok_or(RequestError::MissingPatientInformation)?;

        let (location, medical_needs) = match (patient.location, patient.medical_needs) {
            (Some(location), Some(needs)) => (location, needs),
            _ => return Err(RequestError::MissingPatientInformation),
        };

        location.validate().map_err(|errors| {
            RequestError::InvalidPatientInformation(format!("location: {}", errors))
        })?;

        let preferred_distance = match patient.preferred_distance {
            Some(distance) if distance.is_finite() && distance > 0.0 => distance,
            _ => {
                return Err(RequestError::InvalidPatientInformation(
                    "preferredDistance must be a positive number of miles".to_string(),
                ))
            }
        };

        Ok(PatientQuery::new(
            location,
            medical_needs,
            patient.preferred_cost.unwrap_or_default(),
            preferred_distance,
        ))
    }
}

/// Request body for POST /api/providers
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct RegisterProviderRequest {
    #[validate(length(min = 1))]
    #[serde(default)]
    pub name: String,
    #[validate(length(min = 1))]
    #[serde(rename = "type", default)]
    pub kind: String,
    #[validate(length(min = 1))]
    #[serde(default)]
    pub specialty: String,
    #[validate(length(min = 1))]
    #[serde(default)]
    pub address: String,
    #[validate(length(min = 1))]
    #[serde(default)]
    pub phone: String,
    #[validate(length(min = 1), email)]
    #[serde(default)]
    pub email: String,
    #[validate(length(min = 1))]
    #[serde(default)]
    pub services: Vec<String>,
    #[serde(default)]
    pub location: Option<GeoPoint>,
    #[serde(rename = "zipCode", default)]
    pub zip_code: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(rename = "acceptingNewPatients", default)]
    pub accepting_new_patients: Option<bool>,
    #[serde(rename = "availableSlots", default)]
    pub available_slots: Vec<Slot>,
}

/// Checked in this order so the reported field is deterministic
const PROVIDER_REQUIRED_FIELDS: &[&str] = &["name", "type", "specialty", "address", "phone", "email", "services"];

impl RegisterProviderRequest {
    /// Validate the request and build the provider record under `id`
    pub fn into_provider(self, id: String) -> Result<Provider, RequestError> {
        if let Err(errors) = self.validate() {
            let field_errors = errors.field_errors();
            for field in PROVIDER_REQUIRED_FIELDS {
                // serde renames are not seen by validator, so `type` is reported as `kind`
                let key: &str = if *field == "type" { "kind" } else { *field };
                if let Some(errs) = field_errors.get(key) {
                    if errs.iter().any(|e| e.code == "length") {
                        return Err(RequestError::MissingField(*field));
                    }
                    return Err(RequestError::InvalidField(field.to_string()));
                }
            }
            return Err(RequestError::InvalidField(errors.to_string()));
        }

        if let Some(location) = &self.location {
            location
                .validate()
                .map_err(|errors| RequestError::InvalidField(format!("location: {}", errors)))?;
        }

        for slot in &self.available_slots {
            validate_slot(slot)?;
        }

        Ok(Provider {
            id,
            name: self.name,
            kind: Some(self.kind),
            specialty: self.specialty,
            location: self.location.unwrap_or_default(),
            address: self.address,
            zip_code: self.zip_code,
            phone: Some(self.phone),
            email: Some(self.email),
            website: self.website.filter(|w| !w.is_empty()),
            services: self.services,
            accepting_new_patients: self.accepting_new_patients.unwrap_or(true),
            available_slots: self
                .available_slots
                .into_iter()
                .map(|slot| Slot {
                    id: Some(uuid::Uuid::new_v4().to_string()),
                    ..slot
                })
                .collect(),
            ratings: 0.0,
            reviews: 0,
        })
    }
}

fn validate_slot(slot: &Slot) -> Result<(), RequestError> {
    chrono::NaiveDate::parse_from_str(&slot.date, "%Y-%m-%d")
        .map_err(|_| RequestError::InvalidField(format!("availableSlots.date: {}", slot.date)))?;
    chrono::NaiveTime::parse_from_str(&slot.time, "%H:%M")
        .map_err(|_| RequestError::InvalidField(format!("availableSlots.time: {}", slot.time)))?;
    if slot.duration_minutes == 0 {
        return Err(RequestError::InvalidField("availableSlots.duration".to_string()));
    }
    Ok(())
}

/// Request body for POST /api/providers/{id}/slots
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AddSlotsRequest {
    #[serde(default)]
    pub slots: Vec<Slot>,
}

impl AddSlotsRequest {
    /// Validate each slot and give it a fresh id
    pub fn into_slots(self) -> Result<Vec<Slot>, RequestError> {
        if self.slots.is_empty() {
            return Err(RequestError::MissingField("slots"));
        }

        self.slots
            .into_iter()
            .map(|mut slot| {
                validate_slot(&slot)?;
                slot.id = Some(uuid::Uuid::new_v4().to_string());
                Ok(slot)
            })
            .collect()
    }
}

/// Request body for PUT /api/providers/{id}/slots/{slotId}
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateSlotRequest {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default, alias = "durationMinutes")]
    pub duration: Option<u32>,
    #[serde(default)]
    pub cost: Option<SlotCost>,
}

impl UpdateSlotRequest {
    /// Apply the changes on top of `current`
    pub fn apply(self, current: &Slot) -> Result<Slot, RequestError> {
        let slot = Slot {
            id: current.id.clone(),
            date: self.date.unwrap_or_else(|| current.date.clone()),
            time: self.time.unwrap_or_else(|| current.time.clone()),
            duration_minutes: self.duration.unwrap_or(current.duration_minutes),
            cost: self.cost.unwrap_or(current.cost),
        };
        validate_slot(&slot)?;
        Ok(slot)
    }
}

/// Request body for POST /api/appointments
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CreateAppointmentRequest {
    #[validate(length(min = 1))]
    #[serde(rename = "patientId", default)]
    pub patient_id: String,
    #[validate(length(min = 1))]
    #[serde(rename = "providerId", default)]
    pub provider_id: String,
    #[validate(length(min = 1))]
    #[serde(rename = "providerName", default)]
    pub provider_name: String,
    #[validate(length(min = 1))]
    #[serde(rename = "providerAddress", default)]
    pub provider_address: String,
    #[validate(length(min = 1))]
    #[serde(default)]
    pub date: String,
    #[validate(length(min = 1))]
    #[serde(default)]
    pub time: String,
    #[validate(range(min = 1))]
    #[serde(default)]
    pub duration: Option<i32>,
    #[validate(length(min = 1))]
    #[serde(default)]
    pub service: String,
}

const APPOINTMENT_REQUIRED_FIELDS: &[(&str, &str)] = &[
    ("patient_id", "patientId"),
    ("provider_id", "providerId"),
    ("provider_name", "providerName"),
    ("provider_address", "providerAddress"),
    ("date", "date"),
    ("time", "time"),
    ("service", "service"),
];

/// Appointment fields after validation
#[derive(Debug, Clone, PartialEq)]
pub struct NewAppointment {
    pub patient_id: String,
    pub provider_id: String,
    pub provider_name: String,
    pub provider_address: String,
    pub date: chrono::NaiveDate,
    pub time: chrono::NaiveTime,
    pub duration: i32,
    pub service: String,
}

impl CreateAppointmentRequest {
    pub fn into_new_appointment(self) -> Result<NewAppointment, RequestError> {
        if let Err(errors) = self.validate() {
            let field_errors = errors.field_errors();
            for (key, wire) in APPOINTMENT_REQUIRED_FIELDS {
                if field_errors.contains_key(*key) {
                    return Err(RequestError::MissingField(*wire));
                }
            }
            return Err(RequestError::InvalidField(errors.to_string()));
        }

        Ok(NewAppointment {
            date: parse_date(&self.date)?,
            time: parse_time(&self.time)?,
            duration: self.duration.unwrap_or(30),
            patient_id: self.patient_id,
            provider_id: self.provider_id,
            provider_name: self.provider_name,
            provider_address: self.provider_address,
            service: self.service,
        })
    }
}

/// Request body for PUT /api/appointments
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateAppointmentRequest {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[validate(range(min = 1))]
    #[serde(default)]
    pub duration: Option<i32>,
    #[validate(length(min = 1))]
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub status: Option<crate::models::domain::AppointmentStatus>,
}

/// Parsed partial update
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppointmentChanges {
    pub date: Option<chrono::NaiveDate>,
    pub time: Option<chrono::NaiveTime>,
    pub duration: Option<i32>,
    pub service: Option<String>,
    pub status: Option<crate::models::domain::AppointmentStatus>,
}

impl UpdateAppointmentRequest {
    /// Split into the target id and the requested changes
    pub fn into_changes(self) -> Result<(uuid::Uuid, AppointmentChanges), RequestError> {
        let id = self
            .id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or(RequestError::MissingAppointmentId)?;
        let id = parse_appointment_id(id)?;

        self.validate()
            .map_err(|errors| RequestError::InvalidField(errors.to_string()))?;

        Ok((
            id,
            AppointmentChanges {
                date: self.date.as_deref().map(parse_date).transpose()?,
                time: self.time.as_deref().map(parse_time).transpose()?,
                duration: self.duration,
                service: self.service,
                status: self.status,
            },
        ))
    }
}

pub fn parse_appointment_id(id: &str) -> Result<uuid::Uuid, RequestError> {
    uuid::Uuid::parse_str(id).map_err(|_| RequestError::InvalidField(format!("id: {}", id)))
}

fn parse_date(value: &str) -> Result<chrono::NaiveDate, RequestError> {
    chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| RequestError::InvalidField(format!("date: {}", value)))
}

fn parse_time(value: &str) -> Result<chrono::NaiveTime, RequestError> {
    chrono::NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| chrono::NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|_| RequestError::InvalidField(format!("time: {}", value)))
}

/// Query string for GET /api/appointments
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppointmentFilter {
    #[serde(rename = "patientId", default)]
    pub patient_id: Option<String>,
    #[serde(rename = "providerId", default)]
    pub provider_id: Option<String>,
}

/// Query string for DELETE /api/appointments
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppointmentIdQuery {
    #[serde(default)]
    pub id: Option<String>,
}
