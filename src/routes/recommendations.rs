use actix_web::{web, HttpResponse, Responder};
use crate::core::Recommender;
use crate::models::{ErrorResponse, HealthResponse, RecommendationRequest, RecommendationsResponse};
use crate::routes::bad_request;
use crate::services::{CacheKey, CacheManager, PostgresClient, ProviderCatalog, SupabaseClient};
use std::sync::Arc;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<ProviderCatalog>,
    pub cache: Arc<CacheManager>,
    pub supabase: Option<Arc<SupabaseClient>>,
    pub postgres: Option<Arc<PostgresClient>>,
    pub recommender: Recommender,
}

/// Configure recommendation and health routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/recommendations", web::post().to(recommend));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let catalog_loaded = state.catalog.is_loaded().await;

    let db_healthy = match &state.postgres {
        Some(postgres) => postgres.health_check().await.unwrap_or(false),
        None => true,
    };

    let status = if catalog_loaded && db_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
        providers: state.catalog.len().await,
        cache: state.cache.stats(),
    })
}

/// Recommendation endpoint
///
/// POST /api/recommendations
///
/// Request body:
/// ```json
/// {
///   "patient": {
///     "location": { "latitude": 37.7749, "longitude": -122.4194 },
///     "medicalNeeds": ["checkup"],
///     "preferredCost": "free",
///     "preferredDistance": 5
///   }
/// }
/// ```
async fn recommend(
    state: web::Data<AppState>,
    req: web::Json<RecommendationRequest>,
) -> impl Responder {
    let query = match req.into_inner().into_query() {
        Ok(query) => query,
        Err(e) => {
            tracing::info!("Rejected recommendation request: {}", e);
            return bad_request(&e);
        }
    };

    let (generation, catalog) = match state.catalog.versioned_snapshot().await {
        Ok(versioned) => versioned,
        Err(e) => {
            tracing::error!("Cannot process recommendation request: {}", e);
            return HttpResponse::InternalServerError()
                .json(ErrorResponse::new("Failed to process recommendation request"));
        }
    };

    // Keyed on the generation so an answer computed from an older snapshot
    // is never served after a catalog write
    let cache_key = CacheKey::recommendations(&query, generation);
    if let Ok(cached) = state.cache.get::<RecommendationsResponse>(&cache_key).await {
        tracing::debug!("Serving recommendations from cache: {}", cache_key);
        return HttpResponse::Ok().json(cached);
    }

    let result = state.recommender.recommend(&query, &catalog);

    tracing::info!(
        "Returning {} recommendations ({} eligible of {} providers)",
        result.recommendations.len(),
        result.eligible,
        result.total_candidates
    );

    let response = RecommendationsResponse {
        recommendations: result.recommendations,
    };

    if let Err(e) = state.cache.set(&cache_key, &response).await {
        tracing::warn!("Failed to cache recommendations: {}", e);
    }

    HttpResponse::Ok().json(response)
}
