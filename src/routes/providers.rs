use actix_web::{web, HttpResponse, Responder};
use crate::core::next_available;
use crate::models::{
    AddSlotsRequest, ErrorResponse, Provider, ProviderRegisteredResponse, ProviderSearch, ProviderSummary,
    ProvidersResponse, RegisterProviderRequest, SlotsResponse, UpdateSlotRequest,
};
use crate::routes::{bad_request, AppState};
use crate::services::{refresh_from_remote, CacheKey, CatalogError, SupabaseError};

/// Configure provider directory routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/providers", web::get().to(list_providers))
        .route("/providers", web::post().to(register_provider))
        .route("/providers/{id}", web::get().to(get_provider))
        .route("/providers/{id}/slots", web::get().to(list_slots))
        .route("/providers/{id}/slots", web::post().to(add_slots))
        .route("/providers/{id}/slots/{slot_id}", web::put().to(update_slot))
        .route("/providers/{id}/slots/{slot_id}", web::delete().to(remove_slot));
}

impl From<&Provider> for ProviderSummary {
    fn from(provider: &Provider) -> Self {
        Self {
            id: provider.id.clone(),
            name: provider.name.clone(),
            specialty: provider.specialty.clone(),
            address: provider.address.clone(),
            services: provider.services.clone(),
            accepting_new_patients: provider.accepting_new_patients,
            ratings: provider.ratings,
            reviews: provider.reviews,
            next_available: next_available(provider),
        }
    }
}

/// Provider listing
///
/// GET /api/providers?specialty=&zipCode=&service=&cost=free
async fn list_providers(
    state: web::Data<AppState>,
    query: web::Query<ProviderSearch>,
) -> impl Responder {
    match state.catalog.search(&query).await {
        Ok(providers) => {
            tracing::debug!("Provider listing matched {} providers", providers.len());
            HttpResponse::Ok().json(ProvidersResponse {
                providers: providers.iter().map(ProviderSummary::from).collect(),
            })
        }
        Err(e) => {
            tracing::error!("Failed to list providers: {}", e);
            HttpResponse::InternalServerError().json(ErrorResponse::new("Failed to fetch providers"))
        }
    }
}

/// Single provider record
///
/// GET /api/providers/{id}
///
/// Falls back to the remote store when the id is not in the local snapshot.
async fn get_provider(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let id = path.into_inner();

    let local = match state.catalog.get(&id).await {
        Ok(found) => found,
        Err(CatalogError::NotLoaded) if state.supabase.is_some() => None,
        Err(e) => {
            tracing::error!("Failed to fetch provider {}: {}", id, e);
            return HttpResponse::InternalServerError().json(ErrorResponse::new("Failed to fetch provider"));
        }
    };

    if let Some(provider) = local {
        return HttpResponse::Ok().json(provider);
    }

    let Some(supabase) = &state.supabase else {
        return HttpResponse::NotFound().json(ErrorResponse::new("Provider not found"));
    };

    match supabase.get_provider(&id).await {
        Ok(provider) => HttpResponse::Ok().json(provider),
        Err(SupabaseError::NotFound(_)) => {
            HttpResponse::NotFound().json(ErrorResponse::new("Provider not found"))
        }
        Err(e) => {
            tracing::error!("Failed to fetch provider {} from remote store: {}", id, e);
            HttpResponse::InternalServerError().json(ErrorResponse::new("Failed to fetch provider"))
        }
    }
}

/// Provider registration
///
/// POST /api/providers
async fn register_provider(
    state: web::Data<AppState>,
    req: web::Json<RegisterProviderRequest>,
) -> impl Responder {
    let provider = match req.into_inner().into_provider(uuid::Uuid::new_v4().to_string()) {
        Ok(provider) => provider,
        Err(e) => {
            tracing::info!("Rejected provider registration: {}", e);
            return bad_request(&e);
        }
    };

    if let Some(supabase) = &state.supabase {
        if let Err(e) = supabase.insert_provider(&provider).await {
            tracing::error!("Failed to store provider {} remotely: {}", provider.id, e);
            return HttpResponse::InternalServerError().json(ErrorResponse::new("Failed to register provider"));
        }
    }

    if let Err(e) = state.catalog.insert(provider.clone()).await {
        match (e, &state.supabase) {
            // Already stored remotely; loading the catalog now picks it up
            (CatalogError::NotLoaded, Some(supabase)) => {
                match refresh_from_remote(&state.catalog, supabase, &state.cache).await {
                    Ok(count) => tracing::info!("Catalog loaded after registration ({} providers)", count),
                    Err(e) => tracing::warn!("Catalog still unavailable after registration: {}", e),
                }
            }
            (e, _) => {
                tracing::error!("Failed to add provider {} to catalog: {}", provider.id, e);
                return HttpResponse::InternalServerError().json(ErrorResponse::new("Failed to register provider"));
            }
        }
    }

    invalidate_recommendations(&state).await;

    tracing::info!("Registered provider {} ({})", provider.id, provider.name);

    HttpResponse::Created().json(ProviderRegisteredResponse {
        message: "Provider registered successfully".to_string(),
        provider,
    })
}

async fn invalidate_recommendations(state: &AppState) {
    if let Err(e) = state.cache.invalidate_pattern(CacheKey::RECOMMENDATIONS_PATTERN).await {
        tracing::warn!("Failed to invalidate recommendation cache: {}", e);
    }
}

/// Map catalog failures of the slot routes to responses
fn slot_failure(err: CatalogError, context: &str) -> HttpResponse {
    match err {
        CatalogError::ProviderNotFound(_) => HttpResponse::NotFound().json(ErrorResponse::new("Provider not found")),
        CatalogError::SlotNotFound(_) => HttpResponse::NotFound().json(ErrorResponse::new("Slot not found")),
        e => {
            tracing::error!("Failed to {}: {}", context, e);
            HttpResponse::InternalServerError().json(ErrorResponse::new(format!("Failed to {}", context)))
        }
    }
}

/// Provider from the catalog, or the 404 for an unknown id
async fn catalog_provider(state: &AppState, id: &str, context: &str) -> Result<Provider, HttpResponse> {
    match state.catalog.get(id).await {
        Ok(Some(provider)) => Ok(provider),
        Ok(None) => Err(slot_failure(CatalogError::ProviderNotFound(id.to_string()), context)),
        Err(e) => Err(slot_failure(e, context)),
    }
}

fn slots_response(provider: Provider, message: Option<&str>) -> SlotsResponse {
    SlotsResponse {
        message: message.map(str::to_string),
        provider_id: provider.id,
        slots: provider.available_slots,
    }
}

/// Open slots of one provider, soonest first
///
/// GET /api/providers/{id}/slots
async fn list_slots(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    match catalog_provider(&state, &path, "fetch slots").await {
        Ok(provider) => HttpResponse::Ok().json(slots_response(provider, None)),
        Err(response) => response,
    }
}

/// Publish new slots
///
/// POST /api/providers/{id}/slots
///
/// Request body:
/// ```json
/// { "slots": [{ "date": "2023-05-20", "time": "08:00", "duration": 30, "cost": "free" }] }
/// ```
async fn add_slots(
    state: web::Data<AppState>,
    path: web::Path<String>,
    req: web::Json<AddSlotsRequest>,
) -> impl Responder {
    let provider_id = path.into_inner();

    let slots = match req.into_inner().into_slots() {
        Ok(slots) => slots,
        Err(e) => return bad_request(&e),
    };

    if let Err(response) = catalog_provider(&state, &provider_id, "add slots").await {
        return response;
    }

    if let Some(supabase) = &state.supabase {
        if let Err(e) = supabase.insert_slots(&provider_id, &slots).await {
            tracing::error!("Failed to store slots for provider {} remotely: {}", provider_id, e);
            return HttpResponse::InternalServerError().json(ErrorResponse::new("Failed to add slots"));
        }
    }

    let count = slots.len();
    match state.catalog.add_slots(&provider_id, slots).await {
        Ok(provider) => {
            invalidate_recommendations(&state).await;
            tracing::info!("Published {} slots for provider {}", count, provider_id);
            HttpResponse::Created().json(slots_response(provider, Some("Slots added successfully")))
        }
        Err(e) => slot_failure(e, "add slots"),
    }
}

/// Edit one slot
///
/// PUT /api/providers/{id}/slots/{slot_id}
async fn update_slot(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    req: web::Json<UpdateSlotRequest>,
) -> impl Responder {
    let (provider_id, slot_id) = path.into_inner();

    let provider = match catalog_provider(&state, &provider_id, "update slot").await {
        Ok(provider) => provider,
        Err(response) => return response,
    };

    let Some(current) = provider
        .available_slots
        .iter()
        .find(|slot| slot.id.as_deref() == Some(slot_id.as_str()))
    else {
        return slot_failure(CatalogError::SlotNotFound(slot_id.clone()), "update slot");
    };

    let slot = match req.into_inner().apply(current) {
        Ok(slot) => slot,
        Err(e) => return bad_request(&e),
    };

    if let Some(supabase) = &state.supabase {
        if let Err(e) = supabase.update_slot(&provider_id, &slot_id, &slot).await {
            tracing::error!("Failed to update slot {} remotely: {}", slot_id, e);
            return HttpResponse::InternalServerError().json(ErrorResponse::new("Failed to update slot"));
        }
    }

    match state.catalog.update_slot(&provider_id, &slot_id, slot).await {
        Ok(provider) => {
            invalidate_recommendations(&state).await;
            HttpResponse::Ok().json(slots_response(provider, Some("Slot updated successfully")))
        }
        Err(e) => slot_failure(e, "update slot"),
    }
}

/// Withdraw one slot
///
/// DELETE /api/providers/{id}/slots/{slot_id}
async fn remove_slot(state: web::Data<AppState>, path: web::Path<(String, String)>) -> impl Responder {
    let (provider_id, slot_id) = path.into_inner();

    let provider = match catalog_provider(&state, &provider_id, "remove slot").await {
        Ok(provider) => provider,
        Err(response) => return response,
    };

    if !provider
        .available_slots
        .iter()
        .any(|slot| slot.id.as_deref() == Some(slot_id.as_str()))
    {
        return slot_failure(CatalogError::SlotNotFound(slot_id), "remove slot");
    }

    if let Some(supabase) = &state.supabase {
        if let Err(e) = supabase.delete_slot(&provider_id, &slot_id).await {
            tracing::error!("Failed to delete slot {} remotely: {}", slot_id, e);
            return HttpResponse::InternalServerError().json(ErrorResponse::new("Failed to remove slot"));
        }
    }

    match state.catalog.remove_slot(&provider_id, &slot_id).await {
        Ok(provider) => {
            invalidate_recommendations(&state).await;
            HttpResponse::Ok().json(slots_response(provider, Some("Slot removed successfully")))
        }
        Err(e) => slot_failure(e, "remove slot"),
    }
}
