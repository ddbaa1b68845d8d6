//! Fetch/cache layer over a [`PokemonSource`].
//!
//! One `PokedexService` is built at startup and shared with the effect
//! handler. Records are cached in memory for the lifetime of the process and
//! the type weakness index is loaded once.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use futures_util::future::try_join_all;

use crate::api::{ApiError, PokemonSource};
use crate::search::{self, ROSTER_SIZE};
use crate::state::{PokemonCard, PokemonRecord};
use crate::weakness::{TypeWeaknessIndex, TYPE_NAMES};

pub struct PokedexService {
    source: Arc<dyn PokemonSource>,
    cache: Mutex<HashMap<String, PokemonRecord>>,
    weaknesses: OnceLock<TypeWeaknessIndex>,
    roster_limit: usize,
}

/// Cache key for a lookup: trimmed and lowercased.
pub fn normalize_key(id_or_name: &str) -> String {
    id_or_name.trim().to_lowercase()
}

impl PokedexService {
    pub fn new(source: Arc<dyn PokemonSource>) -> Self {
        Self {
            source,
            cache: Mutex::new(HashMap::new()),
            weaknesses: OnceLock::new(),
            roster_limit: ROSTER_SIZE as usize,
        }
    }

    pub fn with_roster_limit(mut self, limit: usize) -> Self {
        self.roster_limit = limit;
        self
    }

    /// Startup load: the autocomplete roster, then the weakness index.
    pub async fn initialize(&self) -> Result<Vec<String>, ApiError> {
        let roster = self.load_roster().await?;
        self.load_weakness_index().await?;
        tracing::info!(
            roster = roster.len(),
            types = self.weakness_index().map(|index| index.types().count()).unwrap_or(0),
            "pokedex initialized"
        );
        Ok(roster)
    }

    pub async fn load_roster(&self) -> Result<Vec<String>, ApiError> {
        self.source.list_names(self.roster_limit).await
    }

    /// Fetches damage relations for every type concurrently and installs the
    /// index. Later calls are no-ops once an index is present.
    pub async fn load_weakness_index(&self) -> Result<(), ApiError> {
        if self.weaknesses.get().is_some() {
            return Ok(());
        }
        let lookups = TYPE_NAMES.iter().map(|type_name| async move {
            let weaknesses = self.source.type_weaknesses(type_name).await?;
            Ok::<_, ApiError>((type_name.to_string(), weaknesses))
        });
        let entries = try_join_all(lookups).await?;
        let _ = self.weaknesses.set(entries.into_iter().collect());
        Ok(())
    }

    pub fn weakness_index(&self) -> Option<&TypeWeaknessIndex> {
        self.weaknesses.get()
    }

    /// Deduplicated union of the weaknesses of `types`. Empty until the index
    /// has been loaded.
    pub fn load_weaknesses(&self, types: &[String]) -> Vec<String> {
        self.weaknesses
            .get()
            .map(|index| index.weaknesses_for(types))
            .unwrap_or_default()
    }

    pub async fn fetch_pokemon(&self, id_or_name: &str) -> Result<PokemonRecord, ApiError> {
        let key = normalize_key(id_or_name);
        if key.is_empty() {
            return Err(ApiError::NotFound(id_or_name.to_string()));
        }
        if let Some(record) = self.cached(&key) {
            tracing::debug!(%key, "cache hit");
            return Ok(record);
        }

        tracing::debug!(%key, "cache miss");
        let record = self.source.pokemon(&key).await.inspect_err(|err| {
            tracing::warn!(%key, error = %err, "pokemon lookup failed");
        })?;
        self.store(&key, &record);
        Ok(record)
    }

    /// Fetches every id concurrently. Fails as a whole if any lookup fails.
    pub async fn fetch_batch(&self, ids: &[u16]) -> Result<Vec<PokemonRecord>, ApiError> {
        let lookups = ids
            .iter()
            .map(|id| async move { self.fetch_pokemon(&id.to_string()).await });
        try_join_all(lookups).await
    }

    pub async fn fetch_card(&self, id_or_name: &str) -> Result<PokemonCard, ApiError> {
        let record = self.fetch_pokemon(id_or_name).await?;
        Ok(self.card_for(record))
    }

    pub async fn fetch_cards(&self, ids: &[u16]) -> Result<Vec<PokemonCard>, ApiError> {
        let records = self.fetch_batch(ids).await?;
        Ok(records
            .into_iter()
            .map(|record| self.card_for(record))
            .collect())
    }

    /// `count` distinct random ids from the roster range, fetched as one batch.
    pub async fn fetch_random_cards(&self, count: usize) -> Result<Vec<PokemonCard>, ApiError> {
        let max = u16::try_from(self.roster_limit).unwrap_or(u16::MAX);
        let ids = search::random_ids(&mut rand::rng(), count, max);
        tracing::debug!(?ids, "random batch");
        self.fetch_cards(&ids).await
    }

    pub fn card_for(&self, record: PokemonRecord) -> PokemonCard {
        let weaknesses = self.load_weaknesses(&record.types);
        PokemonCard { record, weaknesses }
    }

    pub fn is_cached(&self, id_or_name: &str) -> bool {
        self.cached(&normalize_key(id_or_name)).is_some()
    }

    /// Number of cache keys, aliases included.
    pub fn cache_len(&self) -> usize {
        self.lock_cache().len()
    }

    fn cached(&self, key: &str) -> Option<PokemonRecord> {
        self.lock_cache().get(key).cloned()
    }

    /// Stores under the requested key plus the record's canonical name and id.
    fn store(&self, key: &str, record: &PokemonRecord) {
        let mut cache = self.lock_cache();
        for alias in [key.to_string(), record.name.to_lowercase(), record.id.to_string()] {
            cache.entry(alias).or_insert_with(|| record.clone());
        }
    }

    fn lock_cache(&self) -> std::sync::MutexGuard<'_, HashMap<String, PokemonRecord>> {
        self.cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
