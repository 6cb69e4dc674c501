use crate::models::{GeoPoint, Provider, Slot, SlotCost};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;
use validator::Validate;

/// Errors that can occur when interacting with Supabase
#[derive(Debug, Error)]
pub enum SupabaseError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: invalid API key or token")]
    Unauthorized,

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// Supabase (PostgREST) client for the provider catalog
///
/// Handles all communication with the hosted store:
/// - Fetching providers together with their slots
/// - Fetching a single provider
/// - Inserting newly registered providers
/// - Publishing, editing and withdrawing slots
///
/// Every request targets the one configured schema.
pub struct SupabaseClient {
    base_url: String,
    api_key: String,
    schema: String,
    client: Client,
}

/// Provider row as stored remotely
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRow {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    pub specialty: String,
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
    #[serde(default)]
    pub zip_code: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub services: Vec<String>,
    #[serde(default = "default_true")]
    pub accepting_new_patients: bool,
    #[serde(default)]
    pub ratings: Option<f64>,
    #[serde(default)]
    pub reviews: Option<u32>,
    #[serde(default, skip_serializing)]
    pub available_slots: Vec<SlotRow>,
}

fn default_true() -> bool { true }

/// Slot row as stored remotely; cost is kept as text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotRow {
    #[serde(default)]
    pub id: Option<String>,
    pub date: String,
    pub time: String,
    pub duration: u32,
    pub cost: String,
    #[serde(default)]
    pub is_booked: bool,
}

impl TryFrom<ProviderRow> for Provider {
    type Error = SupabaseError;

    fn try_from(row: ProviderRow) -> Result<Self, Self::Error> {
        let available_slots = row
            .available_slots
            .into_iter()
            .filter(|slot| !slot.is_booked)
            .map(|slot| {
                let cost: SlotCost = slot.cost.parse().map_err(|e| {
                    SupabaseError::InvalidResponse(format!("provider {}: {}", row.id, e))
                })?;
                Ok(Slot {
                    id: slot.id,
                    date: slot.date,
                    time: slot.time,
                    duration_minutes: slot.duration,
                    cost,
                })
            })
            .collect::<Result<Vec<_>, SupabaseError>>()?;

        let provider = Provider {
            id: row.id,
            name: row.name,
            kind: row.kind,
            specialty: row.specialty,
            location: GeoPoint::new(row.latitude, row.longitude),
            address: row.address,
            zip_code: row.zip_code,
            phone: row.phone,
            email: row.email,
            website: row.website,
            services: row.services,
            accepting_new_patients: row.accepting_new_patients,
            available_slots,
            ratings: row.ratings.unwrap_or(0.0),
            reviews: row.reviews.unwrap_or(0),
        };

        provider
            .validate()
            .map_err(|e| SupabaseError::InvalidResponse(format!("provider {}: {}", provider.id, e)))?;

        Ok(provider)
    }
}

/// Insert body for one slot row
fn slot_row(provider_id: &str, slot: &Slot) -> Value {
    json!({
        "id": slot.id,
        "provider_id": provider_id,
        "date": slot.date,
        "time": slot.time,
        "duration": slot.duration_minutes,
        "cost": slot.cost.to_string(),
        "is_booked": false,
    })
}

impl From<&Provider> for ProviderRow {
    fn from(provider: &Provider) -> Self {
        Self {
            id: provider.id.clone(),
            name: provider.name.clone(),
            kind: provider.kind.clone(),
            specialty: provider.specialty.clone(),
            latitude: provider.location.latitude,
            longitude: provider.location.longitude,
            address: provider.address.clone(),
            zip_code: provider.zip_code.clone(),
            phone: provider.phone.clone(),
            email: provider.email.clone(),
            website: provider.website.clone(),
            services: provider.services.clone(),
            accepting_new_patients: provider.accepting_new_patients,
            ratings: Some(provider.ratings),
            reviews: Some(provider.reviews),
            available_slots: vec![],
        }
    }
}

/// Slots are ordered chronologically by the query so index 0 is the next one
const PROVIDER_SELECT: &str = "*,available_slots:service_slots(id,date,time,duration,cost,is_booked)";
const SLOT_ORDER: &str = "service_slots.order=date.asc,time.asc";

impl SupabaseClient {
    /// Create a new Supabase client
    pub fn new(base_url: String, api_key: String, schema: String) -> Result<Self, SupabaseError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            base_url,
            api_key,
            schema,
            client,
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url.trim_end_matches('/'), table)
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        self.client
            .get(url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Accept-Profile", &self.schema)
    }

    fn post(&self, url: &str) -> reqwest::RequestBuilder {
        self.client
            .post(url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Profile", &self.schema)
            .header("Prefer", "return=minimal")
    }

    fn patch(&self, url: &str) -> reqwest::RequestBuilder {
        self.client
            .patch(url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Profile", &self.schema)
            .header("Prefer", "return=minimal")
    }

    fn delete(&self, url: &str) -> reqwest::RequestBuilder {
        self.client
            .delete(url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Profile", &self.schema)
    }

    async fn check_status(response: reqwest::Response, context: &str) -> Result<reqwest::Response, SupabaseError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_else(|_| "Unable to read body".to_string());
        tracing::error!("Supabase {} failed: {} - {}", context, status, body);

        Err(match status.as_u16() {
            401 | 403 => SupabaseError::Unauthorized,
            404 => SupabaseError::NotFound(context.to_string()),
            _ => SupabaseError::ApiError(format!("Failed to {}: {}", context, status)),
        })
    }

    /// Fetch every provider with its open slots
    ///
    /// Rows that cannot be mapped are skipped with a warning.
    pub async fn fetch_providers(&self) -> Result<Vec<Provider>, SupabaseError> {
        let url = format!(
            "{}?select={}&{}",
            self.table_url("providers"),
            urlencoding::encode(PROVIDER_SELECT),
            SLOT_ORDER
        );

        tracing::debug!("Fetching providers from: {}", url);

        let response = self.get(&url).send().await?;
        let response = Self::check_status(response, "fetch providers").await?;

        let rows: Vec<Value> = response.json().await?;
        let total = rows.len();

        let providers: Vec<Provider> = rows
            .into_iter()
            .filter_map(|row| {
                let parsed = serde_json::from_value::<ProviderRow>(row)
                    .map_err(|e| SupabaseError::InvalidResponse(e.to_string()))
                    .and_then(Provider::try_from);
                match parsed {
                    Ok(provider) => Some(provider),
                    Err(e) => {
                        tracing::warn!("Skipping provider row: {}", e);
                        None
                    }
                }
            })
            .collect();

        tracing::debug!("Fetched {} providers (rows: {})", providers.len(), total);

        Ok(providers)
    }

    /// Get a single provider by id
    pub async fn get_provider(&self, provider_id: &str) -> Result<Provider, SupabaseError> {
        let url = format!(
            "{}?id=eq.{}&select={}&{}",
            self.table_url("providers"),
            urlencoding::encode(provider_id),
            urlencoding::encode(PROVIDER_SELECT),
            SLOT_ORDER
        );

        let response = self.get(&url).send().await?;
        let response = Self::check_status(response, "fetch provider").await?;

        let rows: Vec<ProviderRow> = response
            .json()
            .await
            .map_err(|e| SupabaseError::InvalidResponse(format!("Failed to parse provider: {}", e)))?;

        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| SupabaseError::NotFound(format!("Provider {}", provider_id)))?;

        Provider::try_from(row)
    }

    /// Insert a provider and its slots
    ///
    /// If the slots are rejected the provider row is deleted again, so a
    /// failed registration leaves nothing behind.
    pub async fn insert_provider(&self, provider: &Provider) -> Result<(), SupabaseError> {
        let row = ProviderRow::from(provider);
        let response = self.post(&self.table_url("providers")).json(&row).send().await?;
        Self::check_status(response, "insert provider").await?;

        if let Err(e) = self.insert_slots(&provider.id, &provider.available_slots).await {
            if let Err(cleanup) = self.delete_provider_row(&provider.id).await {
                tracing::error!("Failed to remove provider {} after slot insert failure: {}", provider.id, cleanup);
            }
            return Err(e);
        }

        tracing::debug!("Inserted provider {} into remote store", provider.id);

        Ok(())
    }

    async fn delete_provider_row(&self, provider_id: &str) -> Result<(), SupabaseError> {
        let url = format!("{}?id=eq.{}", self.table_url("providers"), urlencoding::encode(provider_id));
        let response = self.delete(&url).send().await?;
        Self::check_status(response, "delete provider").await?;
        Ok(())
    }

    /// Publish slots for a provider
    pub async fn insert_slots(&self, provider_id: &str, slots: &[Slot]) -> Result<(), SupabaseError> {
        if slots.is_empty() {
            return Ok(());
        }

        let rows: Vec<Value> = slots.iter().map(|slot| slot_row(provider_id, slot)).collect();
        let response = self.post(&self.table_url("service_slots")).json(&rows).send().await?;
        Self::check_status(response, "insert slots").await?;

        tracing::debug!("Inserted {} slots for provider {}", slots.len(), provider_id);
        Ok(())
    }

    /// Overwrite the editable fields of one slot
    pub async fn update_slot(&self, provider_id: &str, slot_id: &str, slot: &Slot) -> Result<(), SupabaseError> {
        let url = format!(
            "{}?id=eq.{}&provider_id=eq.{}",
            self.table_url("service_slots"),
            urlencoding::encode(slot_id),
            urlencoding::encode(provider_id)
        );

        let body = json!({
            "date": slot.date,
            "time": slot.time,
            "duration": slot.duration_minutes,
            "cost": slot.cost.to_string(),
        });

        let response = self.patch(&url).json(&body).send().await?;
        Self::check_status(response, "update slot").await?;
        Ok(())
    }

    /// Withdraw one slot
    pub async fn delete_slot(&self, provider_id: &str, slot_id: &str) -> Result<(), SupabaseError> {
        let url = format!(
            "{}?id=eq.{}&provider_id=eq.{}",
            self.table_url("service_slots"),
            urlencoding::encode(slot_id),
            urlencoding::encode(provider_id)
        );

        let response = self.delete(&url).send().await?;
        Self::check_status(response, "delete slot").await?;
        Ok(())
    }
}
