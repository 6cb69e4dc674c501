// Service exports
pub mod cache;
pub mod catalog;
pub mod postgres;
pub mod supabase;

pub use cache::{CacheError, CacheKey, CacheManager, CacheStats};
pub use catalog::{refresh_from_remote, spawn_remote_refresh, CatalogError, ProviderCatalog};
pub use postgres::{PostgresClient, PostgresError};
pub use supabase::{SupabaseClient, SupabaseError};
