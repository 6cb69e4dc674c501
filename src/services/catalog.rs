use crate::core::matches_search;
use crate::models::{Provider, ProviderSearch, Slot};
use crate::services::{CacheKey, CacheManager, SupabaseClient, SupabaseError};
use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;
use validator::Validate;

/// Errors that can occur with the provider catalog
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read catalog seed: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse catalog seed: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Duplicate provider id: {0}")]
    DuplicateId(String),

    #[error("Provider not found: {0}")]
    ProviderNotFound(String),

    #[error("Slot not found: {0}")]
    SlotNotFound(String),

    #[error("Provider catalog has not been loaded")]
    NotLoaded,

    #[error("Remote catalog error: {0}")]
    RemoteError(#[from] SupabaseError),
}

/// In-memory provider catalog
///
/// Readers get an `Arc` snapshot and run without holding the lock; writers
/// swap in a new snapshot and bump the generation while holding the write lock.
pub struct ProviderCatalog {
    providers: RwLock<Option<Arc<Vec<Provider>>>>,
    generation: AtomicU64,
}

impl ProviderCatalog {
    /// Create a loaded catalog from the given providers
    pub fn new(mut providers: Vec<Provider>) -> Result<Self, CatalogError> {
        ensure_unique_ids(&providers)?;
        providers.iter_mut().for_each(assign_slot_ids);
        Ok(Self {
            providers: RwLock::new(Some(Arc::new(providers))),
            generation: AtomicU64::new(1),
        })
    }

    /// Create a catalog that rejects reads until the first `replace`
    pub fn unloaded() -> Self {
        Self {
            providers: RwLock::new(None),
            generation: AtomicU64::new(0),
        }
    }

    /// Load providers from a JSON array on disk
    ///
    /// Records with out-of-range coordinates or ratings are skipped.
    pub fn from_seed_file<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let records: Vec<Provider> = serde_json::from_str(&contents)?;
        let total = records.len();

        let providers: Vec<Provider> = records
            .into_iter()
            .filter(|provider| match provider.validate() {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!("Skipping seed provider {}: {}", provider.id, e);
                    false
                }
            })
            .collect();

        tracing::info!(
            "Loaded {} providers from {} (records: {})",
            providers.len(),
            path.as_ref().display(),
            total
        );

        Self::new(providers)
    }

    /// Current snapshot of the catalog
    pub async fn snapshot(&self) -> Result<Arc<Vec<Provider>>, CatalogError> {
        self.versioned_snapshot().await.map(|(_, providers)| providers)
    }

    /// Snapshot together with the generation it belongs to
    ///
    /// The generation changes with every write, so anything derived from the
    /// snapshot can be keyed on it.
    pub async fn versioned_snapshot(&self) -> Result<(u64, Arc<Vec<Provider>>), CatalogError> {
        let guard = self.providers.read().await;
        let providers = guard.as_ref().map(Arc::clone).ok_or(CatalogError::NotLoaded)?;
        Ok((self.generation.load(Ordering::Acquire), providers))
    }

    pub async fn is_loaded(&self) -> bool {
        self.providers.read().await.is_some()
    }

    /// Number of providers, zero while unloaded
    pub async fn len(&self) -> usize {
        self.providers.read().await.as_ref().map_or(0, |p| p.len())
    }

    /// Replace the whole catalog
    pub async fn replace(&self, mut providers: Vec<Provider>) -> Result<(), CatalogError> {
        ensure_unique_ids(&providers)?;
        providers.iter_mut().for_each(assign_slot_ids);
        let count = providers.len();

        let mut guard = self.providers.write().await;
        *guard = Some(Arc::new(providers));
        self.generation.fetch_add(1, Ordering::AcqRel);
        drop(guard);

        tracing::debug!("Catalog replaced with {} providers", count);
        Ok(())
    }

    /// Add a provider, rejecting duplicate ids
    pub async fn insert(&self, mut provider: Provider) -> Result<(), CatalogError> {
        let mut guard = self.providers.write().await;
        let current = guard.as_ref().ok_or(CatalogError::NotLoaded)?;

        if current.iter().any(|p| p.id == provider.id) {
            return Err(CatalogError::DuplicateId(provider.id));
        }

        assign_slot_ids(&mut provider);

        let mut next = Vec::with_capacity(current.len() + 1);
        next.extend(current.iter().cloned());
        next.push(provider);
        *guard = Some(Arc::new(next));
        self.generation.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    /// Look up a provider by id
    pub async fn get(&self, id: &str) -> Result<Option<Provider>, CatalogError> {
        let snapshot = self.snapshot().await?;
        Ok(snapshot.iter().find(|p| p.id == id).cloned())
    }

    /// Providers matching the listing filters, in catalog order
    pub async fn search(&self, search: &ProviderSearch) -> Result<Vec<Provider>, CatalogError> {
        let snapshot = self.snapshot().await?;
        Ok(snapshot
            .iter()
            .filter(|provider| matches_search(provider, search))
            .cloned()
            .collect())
    }

    /// Publish new slots for a provider; returns the updated record
    pub async fn add_slots(&self, provider_id: &str, slots: Vec<Slot>) -> Result<Provider, CatalogError> {
        self.modify_provider(provider_id, move |provider| {
            provider.available_slots.extend(slots);
            Ok(())
        })
        .await
    }

    /// Overwrite one slot, keeping its id
    pub async fn update_slot(&self, provider_id: &str, slot_id: &str, mut slot: Slot) -> Result<Provider, CatalogError> {
        self.modify_provider(provider_id, |provider| {
            let existing = provider
                .available_slots
                .iter_mut()
                .find(|s| s.id.as_deref() == Some(slot_id))
                .ok_or_else(|| CatalogError::SlotNotFound(slot_id.to_string()))?;
            slot.id = Some(slot_id.to_string());
            *existing = slot;
            Ok(())
        })
        .await
    }

    /// Withdraw a slot
    pub async fn remove_slot(&self, provider_id: &str, slot_id: &str) -> Result<Provider, CatalogError> {
        self.modify_provider(provider_id, |provider| {
            let before = provider.available_slots.len();
            provider.available_slots.retain(|s| s.id.as_deref() != Some(slot_id));
            if provider.available_slots.len() == before {
                return Err(CatalogError::SlotNotFound(slot_id.to_string()));
            }
            Ok(())
        })
        .await
    }

    /// Copy-on-write edit of one provider; slots are re-sorted so the
    /// first one stays the next available
    async fn modify_provider<F>(&self, provider_id: &str, edit: F) -> Result<Provider, CatalogError>
    where
        F: FnOnce(&mut Provider) -> Result<(), CatalogError>,
    {
        let mut guard = self.providers.write().await;
        let current = guard.as_ref().ok_or(CatalogError::NotLoaded)?;

        let index = current
            .iter()
            .position(|p| p.id == provider_id)
            .ok_or_else(|| CatalogError::ProviderNotFound(provider_id.to_string()))?;

        let mut provider = current[index].clone();
        edit(&mut provider)?;
        assign_slot_ids(&mut provider);
        provider
            .available_slots
            .sort_by(|a, b| (a.date.as_str(), a.time.as_str()).cmp(&(b.date.as_str(), b.time.as_str())));

        let mut next: Vec<Provider> = current.iter().cloned().collect();
        next[index] = provider.clone();
        *guard = Some(Arc::new(next));
        self.generation.fetch_add(1, Ordering::AcqRel);

        Ok(provider)
    }
}

fn ensure_unique_ids(providers: &[Provider]) -> Result<(), CatalogError> {
    let mut seen = HashSet::with_capacity(providers.len());
    for provider in providers {
        if !seen.insert(provider.id.as_str()) {
            return Err(CatalogError::DuplicateId(provider.id.clone()));
        }
    }
    Ok(())
}

/// Give id-less slots an id derived from the provider id
fn assign_slot_ids(provider: &mut Provider) {
    let taken: HashSet<String> = provider.available_slots.iter().filter_map(|s| s.id.clone()).collect();
    let mut counter = 0usize;

    for slot in provider.available_slots.iter_mut().filter(|s| s.id.is_none()) {
        let id = loop {
            counter += 1;
            let candidate = format!("{}-slot-{}", provider.id, counter);
            if !taken.contains(&candidate) {
                break candidate;
            }
        };
        slot.id = Some(id);
    }
}

/// Pull the catalog from the remote store once and swap it in
pub async fn refresh_from_remote(
    catalog: &ProviderCatalog,
    supabase: &SupabaseClient,
    cache: &CacheManager,
) -> Result<usize, CatalogError> {
    let providers = supabase.fetch_providers().await?;
    let count = providers.len();
    catalog.replace(providers).await?;

    if let Err(e) = cache.invalidate_pattern(CacheKey::RECOMMENDATIONS_PATTERN).await {
        tracing::warn!("Failed to invalidate recommendation cache after refresh: {}", e);
    }

    Ok(count)
}

/// Periodically refresh the catalog from the remote store
///
/// A failed refresh keeps the previous snapshot.
pub fn spawn_remote_refresh(
    catalog: Arc<ProviderCatalog>,
    supabase: Arc<SupabaseClient>,
    cache: Arc<CacheManager>,
    period: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        // The first tick completes immediately; startup already loaded once
        interval.tick().await;

        loop {
            interval.tick().await;
            match refresh_from_remote(&catalog, &supabase, &cache).await {
                Ok(count) => tracing::info!("Catalog refreshed from remote store ({} providers)", count),
                Err(e) => tracing::error!("Catalog refresh failed, keeping previous snapshot: {}", e),
            }
        }
    })
}
