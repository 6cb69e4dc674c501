use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use saude_conecta::config::Settings;
use saude_conecta::core::Recommender;
use saude_conecta::models::ScoringWeights;
use saude_conecta::routes::{self, AppState};
use saude_conecta::services::{
    refresh_from_remote, spawn_remote_refresh, CacheManager, PostgresClient, ProviderCatalog, SupabaseClient,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn to_io_error<E: std::fmt::Display>(context: &str, e: E) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::Other, format!("{}: {}", context, e))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    // Load configuration
    let settings = Settings::load().map_err(|e| to_io_error("Configuration error", e))?;

    // Initialize logging; RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if settings.logging.format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.compact().init();
    }

    info!("Starting SaúdeConecta recommendation service...");

    // Initialize cache manager (Redis is optional)
    let cache_ttl = settings.cache.ttl_secs.unwrap_or(300);
    let l1_cache_size = settings.cache.l1_cache_size.unwrap_or(1000);

    let cache = match &settings.cache.redis_url {
        Some(redis_url) => match CacheManager::new(redis_url, l1_cache_size, cache_ttl).await {
            Ok(c) => {
                info!("Cache manager initialized with Redis (L1: {} entries, TTL: {}s)", l1_cache_size, cache_ttl);
                c
            }
            Err(e) => {
                warn!("Failed to connect to Redis ({}), using in-process cache only", e);
                CacheManager::in_memory(l1_cache_size, cache_ttl)
            }
        },
        None => {
            info!("Cache manager initialized in-process (L1: {} entries, TTL: {}s)", l1_cache_size, cache_ttl);
            CacheManager::in_memory(l1_cache_size, cache_ttl)
        }
    };
    let cache = Arc::new(cache);

    // Initialize the provider catalog
    let mut supabase = None;
    let catalog = if let Some(remote) = &settings.supabase {
        let client = Arc::new(
            SupabaseClient::new(remote.url.clone(), remote.api_key.clone(), remote.schema.clone())
                .map_err(|e| to_io_error("Supabase client error", e))?,
        );

        let catalog = Arc::new(ProviderCatalog::unloaded());
        match refresh_from_remote(&catalog, &client, &cache).await {
            Ok(count) => info!("Loaded {} providers from remote store", count),
            Err(e) => error!("Initial catalog load failed, recommendations unavailable until refresh: {}", e),
        }

        spawn_remote_refresh(
            Arc::clone(&catalog),
            Arc::clone(&client),
            Arc::clone(&cache),
            Duration::from_secs(settings.catalog.refresh_secs),
        );

        supabase = Some(client);
        catalog
    } else if let Some(seed_path) = &settings.catalog.seed_path {
        Arc::new(ProviderCatalog::from_seed_file(seed_path).map_err(|e| to_io_error("Catalog seed error", e))?)
    } else {
        warn!("No remote store or seed file configured, starting with an empty catalog");
        Arc::new(ProviderCatalog::new(Vec::new()).map_err(|e| to_io_error("Catalog error", e))?)
    };

    // Initialize PostgreSQL client (optional - appointment routes answer 503 without it)
    let postgres = match &settings.database {
        Some(database) => {
            let client = PostgresClient::from_settings(
                &database.url,
                database.max_connections,
                database.min_connections,
                database.acquire_timeout_secs,
                database.idle_timeout_secs,
            )
            .await
            .map_err(|e| to_io_error("PostgreSQL connection error", e))?;

            info!("PostgreSQL client initialized");
            Some(Arc::new(client))
        }
        None => {
            warn!("No database configured, appointment storage disabled");
            None
        }
    };

    // Initialize recommender with configured weights
    let weights = ScoringWeights::from(&settings.recommendation.weights);
    let recommender = Recommender::new(
        weights,
        settings.recommendation.low_cost_threshold,
        settings.recommendation.max_results,
    );

    info!("Recommender initialized with weights: {:?}", weights);

    // Build application state
    let app_state = AppState {
        catalog,
        cache,
        supabase,
        postgres,
        recommender,
    };

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(routes::json_config())
            .app_data(routes::query_config())
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
