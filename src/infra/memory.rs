//! Process-local adapters used when no database is configured.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::Value;
use time::{Duration, OffsetDateTime};

use crate::{
    application::repos::{CacheStore, RepoError, SessionLookup, SessionUser},
    cache::lock::{rw_read, rw_write},
    domain::cache_entry::CacheEntry,
};

const SOURCE: &str = "infra::memory";

/// [`CacheStore`] backed by a map; each write swaps the whole entry under one lock.
#[derive(Debug, Default)]
pub struct InMemoryCacheStore {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl InMemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        rw_read(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Writes a row with explicit timestamps, bypassing upsert bookkeeping.
    pub fn insert_raw(&self, entry: CacheEntry) {
        rw_write(&self.entries, SOURCE, "insert_raw").insert(entry.key.clone(), entry);
    }

    fn upsert_at(
        &self,
        key: &str,
        value: &Value,
        expires_at: OffsetDateTime,
        now: OffsetDateTime,
    ) -> CacheEntry {
        let mut entries = rw_write(&self.entries, SOURCE, "upsert");
        let entry = match entries.get(key) {
            Some(previous) => CacheEntry {
                key: key.to_string(),
                value: value.clone(),
                created_at: previous.created_at,
                updated_at: now.max(previous.updated_at + Duration::microseconds(1)),
                expires_at,
            },
            None => CacheEntry {
                key: key.to_string(),
                value: value.clone(),
                created_at: now,
                updated_at: now,
                expires_at,
            },
        };
        entries.insert(key.to_string(), entry.clone());
        entry
    }
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn read(&self, key: &str) -> Result<Option<CacheEntry>, RepoError> {
        Ok(rw_read(&self.entries, SOURCE, "read").get(key).cloned())
    }

    async fn read_fresh(
        &self,
        key: &str,
        now: OffsetDateTime,
    ) -> Result<Option<CacheEntry>, RepoError> {
        Ok(rw_read(&self.entries, SOURCE, "read_fresh")
            .get(key)
            .filter(|entry| entry.is_fresh_at(now))
            .cloned())
    }

    async fn upsert(
        &self,
        key: &str,
        value: &Value,
        expires_at: OffsetDateTime,
    ) -> Result<CacheEntry, RepoError> {
        Ok(self.upsert_at(key, value, expires_at, OffsetDateTime::now_utc()))
    }

    async fn delete_by_prefix(&self, prefix: &str) -> Result<u64, RepoError> {
        let mut entries = rw_write(&self.entries, SOURCE, "delete_by_prefix");
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        Ok((before - entries.len()) as u64)
    }

    async fn delete(&self, key: &str) -> Result<bool, RepoError> {
        Ok(rw_write(&self.entries, SOURCE, "delete")
            .remove(key)
            .is_some())
    }
}

/// Session lookup for deployments without an account database; nobody is signed in.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSessions;

#[async_trait]
impl SessionLookup for NoSessions {
    async fn find_active_session(
        &self,
        _token: &str,
        _now: OffsetDateTime,
    ) -> Result<Option<SessionUser>, RepoError> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::datetime;

    #[test]
    fn upsert_keeps_created_at_and_advances_updated_at() {
        let store = InMemoryCacheStore::new();
        let now = datetime!(2025-03-01 12:00 UTC);
        let expires = now + Duration::hours(2);

        let first = store.upsert_at("cache:items:list:ja:v1", &json!([1]), expires, now);
        let second = store.upsert_at("cache:items:list:ja:v1", &json!([1]), expires, now);

        assert_eq!(store.len(), 1);
        assert_eq!(second.created_at, first.created_at);
        assert!(second.updated_at > first.updated_at);
    }

    #[tokio::test]
    async fn stale_rows_are_misses_for_read_fresh_but_remain_readable() {
        let store = InMemoryCacheStore::new();
        let now = OffsetDateTime::now_utc();
        store.insert_raw(CacheEntry {
            key: "cache:tasks:list:en:v1".into(),
            value: json!([]),
            created_at: now - Duration::hours(3),
            updated_at: now - Duration::hours(3),
            expires_at: now - Duration::milliseconds(1),
        });

        let fresh = store
            .read_fresh("cache:tasks:list:en:v1", now)
            .await
            .expect("read_fresh");
        let stale = store.read("cache:tasks:list:en:v1").await.expect("read");

        assert!(fresh.is_none());
        assert!(stale.is_some());
    }

    #[tokio::test]
    async fn prefix_delete_only_touches_matching_rows() {
        let store = InMemoryCacheStore::new();
        let expires = OffsetDateTime::now_utc() + Duration::hours(1);
        for key in [
            "cache:item:detail:ja:a:v1",
            "cache:item:detail:ja:b:v1",
            "cache:item:detail:en:a:v1",
            "cache:items:list:ja:v1",
        ] {
            store.upsert(key, &json!({}), expires).await.expect("upsert");
        }

        let removed = store
            .delete_by_prefix("cache:item:detail:ja:")
            .await
            .expect("delete");

        assert_eq!(removed, 2);
        assert_eq!(store.len(), 2);
        assert!(store.read("cache:items:list:ja:v1").await.expect("read").is_some());
        assert!(!store.delete("cache:item:detail:ja:a:v1").await.expect("delete"));
    }
}
