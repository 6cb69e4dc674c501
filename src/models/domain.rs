use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use validator::Validate;

/// Geographic coordinate in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, Validate)]
pub struct GeoPoint {
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

/// How much the patient is willing to pay for an appointment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CostPreference {
    Free,
    LowCost,
    #[default]
    Any,
}

impl CostPreference {
    pub fn as_str(&self) -> &'static str {
        match self {
            CostPreference::Free => "free",
            CostPreference::LowCost => "low-cost",
            CostPreference::Any => "any",
        }
    }
}

/// Normalised patient request handed to the recommender
#[derive(Debug, Clone, PartialEq)]
pub struct PatientQuery {
    pub location: GeoPoint,
    /// Trimmed, lower-cased keyword tags
    pub medical_needs: BTreeSet<String>,
    pub preferred_cost: CostPreference,
    pub preferred_distance_miles: f64,
}

impl PatientQuery {
    pub fn new<I, S>(
        location: GeoPoint,
        medical_needs: I,
        preferred_cost: CostPreference,
        preferred_distance_miles: f64,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let medical_needs = medical_needs
            .into_iter()
            .map(|need| need.as_ref().trim().to_lowercase())
            .filter(|need| !need.is_empty())
            .collect();

        Self {
            location,
            medical_needs,
            preferred_cost,
            preferred_distance_miles,
        }
    }
}

/// Price of a single slot
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SlotCost {
    Free,
    Amount(f64),
}

impl SlotCost {
    pub fn is_free(&self) -> bool {
        matches!(self, SlotCost::Free)
    }

    pub fn amount(&self) -> Option<f64> {
        match self {
            SlotCost::Free => None,
            SlotCost::Amount(value) => Some(*value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid slot cost: {0:?}")]
pub struct ParseSlotCostError(pub String);

impl FromStr for SlotCost {
    type Err = ParseSlotCostError;

    /// Accepts `free` in any case, or a non-negative amount with an optional `$` prefix
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("free") {
            return Ok(SlotCost::Free);
        }

        let digits = trimmed.strip_prefix('$').unwrap_or(trimmed).trim();
        match digits.parse::<f64>() {
            Ok(value) if value.is_finite() && value >= 0.0 => Ok(SlotCost::Amount(value)),
            _ => Err(ParseSlotCostError(s.to_string())),
        }
    }
}

impl fmt::Display for SlotCost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotCost::Free => f.write_str("free"),
            SlotCost::Amount(value) => write!(f, "{}", value),
        }
    }
}

impl Serialize for SlotCost {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            SlotCost::Free => serializer.serialize_str("free"),
            SlotCost::Amount(value) => serializer.serialize_f64(*value),
        }
    }
}

impl<'de> Deserialize<'de> for SlotCost {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawCost {
            Number(f64),
            Text(String),
        }

        match RawCost::deserialize(deserializer)? {
            RawCost::Number(value) if value.is_finite() && value >= 0.0 => Ok(SlotCost::Amount(value)),
            RawCost::Number(value) => Err(serde::de::Error::custom(format!(
                "slot cost must be a non-negative amount, got {}",
                value
            ))),
            RawCost::Text(text) => text.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// A single bookable appointment opportunity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    /// Assigned by the catalog; seed slots may omit it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub date: String,
    pub time: String,
    #[serde(rename = "duration", alias = "durationMinutes")]
    pub duration_minutes: u32,
    pub cost: SlotCost,
}

/// Provider record as held by the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Provider {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    pub specialty: String,
    #[validate(nested)]
    pub location: GeoPoint,
    pub address: String,
    #[serde(rename = "zipCode", default)]
    pub zip_code: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub services: Vec<String>,
    #[serde(rename = "acceptingNewPatients", default = "default_true")]
    pub accepting_new_patients: bool,
    #[serde(rename = "availableSlots", default)]
    pub available_slots: Vec<Slot>,
    #[validate(range(min = 0.0, max = 5.0))]
    #[serde(default)]
    pub ratings: f64,
    #[serde(default)]
    pub reviews: u32,
}

fn default_true() -> bool { true }

impl Provider {
    /// First slot in catalog order; callers keep slots sorted chronologically
    pub fn next_slot(&self) -> Option<&Slot> {
        self.available_slots.first()
    }

    pub fn has_free_slot(&self) -> bool {
        self.available_slots.iter().any(|slot| slot.cost.is_free())
    }

    /// Cheapest priced slot, ignoring free ones
    pub fn min_slot_amount(&self) -> Option<f64> {
        self.available_slots
            .iter()
            .filter_map(|slot| slot.cost.amount())
            .reduce(f64::min)
    }
}

/// Recommendation returned to the patient
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(rename = "id")]
    pub provider_id: String,
    pub name: String,
    pub specialty: String,
    pub address: String,
    /// Rounded to one decimal place
    #[serde(rename = "distance", with = "miles")]
    pub distance_miles: f64,
    #[serde(rename = "nextAvailable")]
    pub next_available: String,
    #[serde(rename = "cost")]
    pub cost_summary: String,
}

/// Serde helper rendering a distance as `"<n.n> miles"`
pub mod miles {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("{:.1} miles", value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.trim()
            .trim_end_matches("miles")
            .trim()
            .parse()
            .map_err(serde::de::Error::custom)
    }
}

/// Filters accepted by the provider listing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderSearch {
    #[serde(default)]
    pub specialty: Option<String>,
    #[serde(rename = "zipCode", default)]
    pub zip_code: Option<String>,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub cost: Option<String>,
}

/// Appointment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "appointment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Confirmed,
    Cancelled,
}

/// Booked appointment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: uuid::Uuid,
    #[serde(rename = "patientId")]
    pub patient_id: String,
    #[serde(rename = "providerId")]
    pub provider_id: String,
    #[serde(rename = "providerName")]
    pub provider_name: String,
    #[serde(rename = "providerAddress")]
    pub provider_address: String,
    pub date: chrono::NaiveDate,
    pub time: chrono::NaiveTime,
    pub duration: i32,
    pub service: String,
    pub status: AppointmentStatus,
    #[serde(rename = "createdAt")]
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Scoring weights (lower score ranks first)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringWeights {
    pub distance: f64,
    pub rating: f64,
    pub availability: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            distance: 0.5,
            rating: 0.3,
            availability: 0.2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_cost_parsing() {
        assert_eq!("free".parse::<SlotCost>().unwrap(), SlotCost::Free);
        assert_eq!("Free".parse::<SlotCost>().unwrap(), SlotCost::Free);
        assert_eq!("$20".parse::<SlotCost>().unwrap(), SlotCost::Amount(20.0));
        assert_eq!("15.5".parse::<SlotCost>().unwrap(), SlotCost::Amount(15.5));
        assert!("-3".parse::<SlotCost>().is_err());
        assert!("cheap".parse::<SlotCost>().is_err());
    }

    #[test]
    fn test_slot_cost_json_forms() {
        let slots: Vec<Slot> = serde_json::from_str(
            r#"[
                {"date": "2023-05-15", "time": "10:00", "duration": 30, "cost": "free"},
                {"date": "2023-05-15", "time": "09:15", "duration": 30, "cost": 20},
                {"date": "2023-05-16", "time": "13:00", "duration": 45, "cost": "$25"}
            ]"#,
        )
        .unwrap();

        assert_eq!(slots[0].cost, SlotCost::Free);
        assert_eq!(slots[1].cost, SlotCost::Amount(20.0));
        assert_eq!(slots[2].cost, SlotCost::Amount(25.0));

        let json = serde_json::to_value(&slots[1]).unwrap();
        assert_eq!(json["cost"], serde_json::json!(20.0));
        assert_eq!(json["duration"], 30);
    }

    #[test]
    fn test_patient_query_normalises_needs() {
        let query = PatientQuery::new(
            GeoPoint::new(0.0, 0.0),
            ["  CheckUp ", "", "checkup", "Vaccination"],
            CostPreference::Any,
            5.0,
        );

        let needs: Vec<&str> = query.medical_needs.iter().map(String::as_str).collect();
        assert_eq!(needs, vec!["checkup", "vaccination"]);
    }

    #[test]
    fn test_cost_preference_wire_names() {
        let pref: CostPreference = serde_json::from_str(r#""low-cost""#).unwrap();
        assert_eq!(pref, CostPreference::LowCost);
        assert_eq!(CostPreference::default(), CostPreference::Any);
        assert_eq!(CostPreference::Free.as_str(), "free");
    }

    #[test]
    fn test_recommendation_distance_rendering() {
        let rec = Recommendation {
            provider_id: "p1".to_string(),
            name: "Clinic".to_string(),
            specialty: "General Practice".to_string(),
            address: "123 Main St".to_string(),
            distance_miles: 0.6,
            next_available: "No availability".to_string(),
            cost_summary: "Free options available".to_string(),
        };

        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["distance"], "0.6 miles");
        assert_eq!(json["id"], "p1");

        let back: Recommendation = serde_json::from_value(json).unwrap();
        assert_eq!(back, rec);
    }

    #[test]
    fn test_min_slot_amount_ignores_free() {
        let provider: Provider = serde_json::from_str(
            r#"{
                "id": "p3", "name": "Wellness", "specialty": "Family Medicine",
                "location": {"latitude": 37.7694, "longitude": -122.4862},
                "address": "789 Pine Rd",
                "availableSlots": [
                    {"date": "2023-05-16", "time": "13:00", "duration": 45, "cost": 15},
                    {"date": "2023-05-18", "time": "10:30", "duration": 30, "cost": "free"}
                ]
            }"#,
        )
        .unwrap();

        assert!(provider.has_free_slot());
        assert_eq!(provider.min_slot_amount(), Some(15.0));
        assert!(provider.accepting_new_patients);
        assert_eq!(provider.ratings, 0.0);
    }
}
