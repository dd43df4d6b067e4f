//! Cache orchestration for upstream resources.
//!
//! Each read goes fresh row → single upstream refresh with write-through →
//! stale row → failure. Query parameters never take part in the key; one
//! persisted row per resource and language serves every query variant.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use metrics::{counter, histogram};
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{debug, info, warn};

use crate::{
    application::{
        inflight::InFlightFetches,
        query::{self, ItemQuery, QueryPage},
        repos::CacheStore,
        upstream::{UpstreamError, UpstreamSource},
    },
    domain::{
        error::DomainError,
        items::{ItemDetail, ItemRecord},
        keys::StoreKey,
        tasks::TaskRecord,
        traders::TraderRecord,
        types::{Language, ResourceKind},
    },
};

pub const METRIC_STORE_HIT: &str = "tarkov_wiki_store_hit_total";
pub const METRIC_STORE_MISS: &str = "tarkov_wiki_store_miss_total";
pub const METRIC_STALE_SERVED: &str = "tarkov_wiki_store_stale_served_total";
pub const METRIC_UPSTREAM_ERROR: &str = "tarkov_wiki_upstream_error_total";
pub const METRIC_FETCH_COALESCED: &str = "tarkov_wiki_fetch_coalesced_total";
pub const METRIC_UPSTREAM_FETCH_MS: &str = "tarkov_wiki_upstream_fetch_ms";

const TARGET: &str = "tarkov_wiki::catalog";
const MAX_ITEM_ID_LEN: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheSource {
    Database,
    External,
}

/// A resource value plus where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Loaded<T> {
    pub value: T,
    pub cached: bool,
    pub stale: bool,
    pub source: CacheSource,
    pub cached_at: OffsetDateTime,
}

impl<T> Loaded<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Loaded<U> {
        Loaded {
            value: f(self.value),
            cached: self.cached,
            stale: self.stale,
            source: self.source,
            cached_at: self.cached_at,
        }
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("no fresh or stale data available for `{key}`")]
    Upstream {
        key: String,
        #[source]
        source: UpstreamError,
    },
    #[error("item `{id}` not found")]
    NotFound { id: String },
    #[error(transparent)]
    Validation(#[from] DomainError),
}

#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub list_ttl: Duration,
    pub detail_ttl: Duration,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            list_ttl: Duration::from_secs(2 * 60 * 60),
            detail_ttl: Duration::from_secs(60 * 60),
        }
    }
}

/// Record counts written by [`CatalogService::warm`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WarmReport {
    pub items: usize,
    pub traders: usize,
    pub tasks: usize,
}

#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn CacheStore>,
    upstream: Arc<dyn UpstreamSource>,
    inflight: InFlightFetches,
    config: CatalogConfig,
}

impl CatalogService {
    pub fn new(
        store: Arc<dyn CacheStore>,
        upstream: Arc<dyn UpstreamSource>,
        config: CatalogConfig,
    ) -> Self {
        Self {
            store,
            upstream,
            inflight: InFlightFetches::new(),
            config,
        }
    }

    pub fn store(&self) -> &Arc<dyn CacheStore> {
        &self.store
    }

    pub async fn items(&self, lang: &Language) -> Result<Loaded<Vec<ItemRecord>>, CatalogError> {
        let key = StoreKey::list(ResourceKind::Items, lang);
        let fetch = async { self.upstream.fetch_items(lang).await.map(Some) };
        self.load(&key, self.config.list_ttl, fetch, || unreachable_absent(&key))
            .await
    }

    /// Loads the item list and runs `query` over it, stale data included.
    pub async fn query_items(
        &self,
        lang: &Language,
        query: &ItemQuery,
    ) -> Result<Loaded<QueryPage<ItemRecord>>, CatalogError> {
        let loaded = self.items(lang).await?;
        Ok(loaded.map(|records| query::run(records, query)))
    }

    pub async fn item(&self, id: &str, lang: &Language) -> Result<Loaded<ItemDetail>, CatalogError> {
        validate_item_id(id)?;
        let key = StoreKey::item_detail(id, lang);
        let fetch = self.upstream.fetch_item(id, lang);
        self.load(&key, self.config.detail_ttl, fetch, || CatalogError::NotFound {
            id: id.to_string(),
        })
        .await
    }

    pub async fn traders(
        &self,
        lang: &Language,
    ) -> Result<Loaded<Vec<TraderRecord>>, CatalogError> {
        let key = StoreKey::list(ResourceKind::Traders, lang);
        let fetch = async { self.upstream.fetch_traders(lang).await.map(Some) };
        self.load(&key, self.config.list_ttl, fetch, || unreachable_absent(&key))
            .await
    }

    pub async fn tasks(&self, lang: &Language) -> Result<Loaded<Vec<TaskRecord>>, CatalogError> {
        let key = StoreKey::list(ResourceKind::Tasks, lang);
        let fetch = async { self.upstream.fetch_tasks(lang).await.map(Some) };
        self.load(&key, self.config.list_ttl, fetch, || unreachable_absent(&key))
            .await
    }

    /// Category labels found in the persisted item list, fresh or not.
    ///
    /// Never triggers an upstream fetch; an absent or unreadable row yields an empty list.
    pub async fn cached_categories(&self, lang: &Language) -> Vec<String> {
        let key = StoreKey::list(ResourceKind::Items, lang);
        match self.store.read(key.as_str()).await {
            Ok(Some(entry)) => match entry.decode::<Vec<ItemRecord>>() {
                Ok(records) => query::collect_categories(&records),
                Err(err) => {
                    warn!(target: TARGET, key = %key, error = %err, "cached item list failed to decode");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(err) => {
                warn!(target: TARGET, key = %key, error = %err, "category scan could not read store");
                Vec::new()
            }
        }
    }

    /// Refetches every list resource for `lang` regardless of freshness.
    pub async fn warm(&self, lang: &Language) -> Result<WarmReport, CatalogError> {
        let ttl = self.config.list_ttl;

        let key = StoreKey::list(ResourceKind::Items, lang);
        let items = self.refresh(&key, self.upstream.fetch_items(lang)).await?;
        let items = self.write_through(&key, ttl, items).await.value.len();

        let key = StoreKey::list(ResourceKind::Traders, lang);
        let traders = self.refresh(&key, self.upstream.fetch_traders(lang)).await?;
        let traders = self.write_through(&key, ttl, traders).await.value.len();

        let key = StoreKey::list(ResourceKind::Tasks, lang);
        let tasks = self.refresh(&key, self.upstream.fetch_tasks(lang)).await?;
        let tasks = self.write_through(&key, ttl, tasks).await.value.len();

        let report = WarmReport {
            items,
            traders,
            tasks,
        };
        info!(target: TARGET, lang = %lang, items, traders, tasks, "list resources warmed");
        Ok(report)
    }

    async fn load<T, Fut>(
        &self,
        key: &StoreKey,
        ttl: Duration,
        fetch: Fut,
        on_absent: impl FnOnce() -> CatalogError,
    ) -> Result<Loaded<T>, CatalogError>
    where
        T: Serialize + DeserializeOwned + Send,
        Fut: Future<Output = Result<Option<T>, UpstreamError>> + Send,
    {
        if let Some(hit) = self.read_fresh(key).await {
            counter!(METRIC_STORE_HIT).increment(1);
            debug!(target: TARGET, key = %key, outcome = "hit", "served from store");
            return Ok(hit);
        }
        counter!(METRIC_STORE_MISS).increment(1);

        let guard = self.inflight.acquire(key.as_str()).await;
        if guard.waited() {
            if let Some(hit) = self.read_fresh(key).await {
                counter!(METRIC_FETCH_COALESCED).increment(1);
                debug!(target: TARGET, key = %key, outcome = "coalesced", "served refresh from another request");
                return Ok(hit);
            }
        }

        match self.refresh(key, fetch).await {
            Ok(Some(value)) => Ok(self.write_through(key, ttl, value).await),
            Ok(None) => match self.read_stale(key).await {
                Some(stale) => Ok(stale),
                None => Err(on_absent()),
            },
            Err(CatalogError::Upstream { key: failed, source }) => {
                match self.read_stale(key).await {
                    Some(stale) => Ok(stale),
                    None => Err(CatalogError::Upstream {
                        key: failed,
                        source,
                    }),
                }
            }
            Err(other) => Err(other),
        }
    }

    async fn refresh<T, Fut>(&self, key: &StoreKey, fetch: Fut) -> Result<T, CatalogError>
    where
        Fut: Future<Output = Result<T, UpstreamError>> + Send,
    {
        let started = Instant::now();
        let outcome = fetch.await;
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        histogram!(METRIC_UPSTREAM_FETCH_MS).record(elapsed_ms);

        outcome.map_err(|source| {
            counter!(METRIC_UPSTREAM_ERROR).increment(1);
            warn!(
                target: TARGET,
                key = %key,
                elapsed_ms,
                timeout = source.is_timeout(),
                error = %source,
                "upstream fetch failed"
            );
            CatalogError::Upstream {
                key: key.to_string(),
                source,
            }
        })
    }

    async fn write_through<T: Serialize>(&self, key: &StoreKey, ttl: Duration, value: T) -> Loaded<T> {
        let now = OffsetDateTime::now_utc();
        let mut cached_at = now;

        match serde_json::to_value(&value) {
            Ok(json) => match self.store.upsert(key.as_str(), &json, now + ttl).await {
                Ok(entry) => cached_at = entry.updated_at,
                Err(err) => {
                    warn!(target: TARGET, key = %key, error = %err, "fresh data not persisted");
                }
            },
            Err(err) => {
                warn!(target: TARGET, key = %key, error = %err, "fresh data not serializable");
            }
        }

        debug!(target: TARGET, key = %key, outcome = "refreshed", "fetched from upstream");
        Loaded {
            value,
            cached: false,
            stale: false,
            source: CacheSource::External,
            cached_at,
        }
    }

    async fn read_fresh<T: DeserializeOwned>(&self, key: &StoreKey) -> Option<Loaded<T>> {
        let entry = match self
            .store
            .read_fresh(key.as_str(), OffsetDateTime::now_utc())
            .await
        {
            Ok(entry) => entry?,
            Err(err) => {
                warn!(target: TARGET, key = %key, error = %err, "store read failed; treating as miss");
                return None;
            }
        };

        match entry.decode::<T>() {
            Ok(value) => Some(Loaded {
                value,
                cached: true,
                stale: false,
                source: CacheSource::Database,
                cached_at: entry.updated_at,
            }),
            Err(err) => {
                warn!(target: TARGET, key = %key, error = %err, "stored row failed to decode; treating as miss");
                None
            }
        }
    }

    async fn read_stale<T: DeserializeOwned>(&self, key: &StoreKey) -> Option<Loaded<T>> {
        let entry = match self.store.read(key.as_str()).await {
            Ok(entry) => entry?,
            Err(err) => {
                warn!(target: TARGET, key = %key, error = %err, "stale fallback could not read store");
                return None;
            }
        };

        match entry.decode::<T>() {
            Ok(value) => {
                counter!(METRIC_STALE_SERVED).increment(1);
                info!(target: TARGET, key = %key, outcome = "stale", expires_at = %entry.expires_at, "serving stale fallback");
                Some(Loaded {
                    value,
                    cached: true,
                    stale: true,
                    source: CacheSource::Database,
                    cached_at: entry.updated_at,
                })
            }
            Err(err) => {
                warn!(target: TARGET, key = %key, error = %err, "stale row failed to decode");
                None
            }
        }
    }
}

fn validate_item_id(id: &str) -> Result<(), DomainError> {
    let valid = !id.is_empty()
        && id.len() <= MAX_ITEM_ID_LEN
        && id
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_');
    if valid {
        Ok(())
    } else {
        Err(DomainError::validation("id", format!("`{id}` is not an item id")))
    }
}

// List fetches always produce `Some`; keep a typed error in case that changes.
fn unreachable_absent(key: &StoreKey) -> CatalogError {
    CatalogError::Upstream {
        key: key.to_string(),
        source: UpstreamError::Decode("upstream returned no list".to_string()),
    }
}
