//! Short-lived store of rendered responses, grouped by revalidation tag.

use std::sync::RwLock;
use std::time::Instant;

use bytes::Bytes;
use lru::LruCache;
use metrics::counter;

use super::config::TagTierConfig;
use super::keys::{ResponseKey, RevalidationTag};
use super::lock::{rw_read, rw_write};

pub const METRIC_TAG_TIER_HIT: &str = "tarkov_wiki_tag_tier_hit_total";
pub const METRIC_TAG_TIER_MISS: &str = "tarkov_wiki_tag_tier_miss_total";
pub const METRIC_TAG_TIER_EVICT: &str = "tarkov_wiki_tag_tier_evict_total";
pub const METRIC_TAG_INVALIDATED: &str = "tarkov_wiki_tag_invalidated_total";

const SOURCE: &str = "cache::store";

/// Cached HTTP response data.
#[derive(Debug, Clone)]
pub struct CachedResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

#[derive(Debug, Clone)]
struct TaggedResponse {
    tag: RevalidationTag,
    stored_at: Instant,
    response: CachedResponse,
}

pub struct TagTier {
    config: TagTierConfig,
    responses: RwLock<LruCache<ResponseKey, TaggedResponse>>,
}

impl TagTier {
    pub fn new(config: TagTierConfig) -> Self {
        let capacity = config.response_limit_non_zero();
        Self {
            config,
            responses: RwLock::new(LruCache::new(capacity)),
        }
    }

    pub fn config(&self) -> &TagTierConfig {
        &self.config
    }

    /// Returns a stored response younger than the configured TTL.
    pub fn get(&self, key: &ResponseKey) -> Option<CachedResponse> {
        self.get_at(key, Instant::now())
    }

    fn get_at(&self, key: &ResponseKey, now: Instant) -> Option<CachedResponse> {
        let mut responses = rw_write(&self.responses, SOURCE, "get");
        let expired = match responses.get(key) {
            Some(entry) if now.duration_since(entry.stored_at) < self.config.ttl => {
                counter!(METRIC_TAG_TIER_HIT).increment(1);
                return Some(entry.response.clone());
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            responses.pop(key);
        }
        counter!(METRIC_TAG_TIER_MISS).increment(1);
        None
    }

    /// Stores a response; returns the key pushed out by the LRU bound, if any.
    pub fn set(
        &self,
        key: ResponseKey,
        tag: RevalidationTag,
        response: CachedResponse,
    ) -> Option<ResponseKey> {
        let entry = TaggedResponse {
            tag,
            stored_at: Instant::now(),
            response,
        };
        let evicted = rw_write(&self.responses, SOURCE, "set")
            .push(key.clone(), entry)
            .and_then(|(evicted_key, _)| (evicted_key != key).then_some(evicted_key));
        if evicted.is_some() {
            counter!(METRIC_TAG_TIER_EVICT).increment(1);
        }
        evicted
    }

    /// Drops every response stored under `tag`; returns how many were removed.
    pub fn invalidate_tag(&self, tag: &RevalidationTag) -> usize {
        let mut responses = rw_write(&self.responses, SOURCE, "invalidate_tag");
        let doomed: Vec<ResponseKey> = responses
            .iter()
            .filter(|(_, entry)| &entry.tag == tag)
            .map(|(key, _)| key.clone())
            .collect();
        for key in &doomed {
            responses.pop(key);
        }
        counter!(METRIC_TAG_INVALIDATED).increment(1);
        doomed.len()
    }

    pub fn len(&self) -> usize {
        rw_read(&self.responses, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{AssertUnwindSafe, catch_unwind};
    use std::time::Duration;

    use super::*;

    fn response(body: &'static str) -> CachedResponse {
        CachedResponse {
            status: 200,
            headers: vec![("content-type".into(), "application/json".into())],
            body: Bytes::from_static(body.as_bytes()),
        }
    }

    fn tag(raw: &str) -> RevalidationTag {
        RevalidationTag::parse(raw).expect("tag")
    }

    #[test]
    fn invalidating_a_tag_leaves_other_tags_alone() {
        let tier = TagTier::new(TagTierConfig::default());
        tier.set(ResponseKey::new("/cache/items", "lang=ja"), tag("items:ja"), response("ja"));
        tier.set(
            ResponseKey::new("/cache/items", "lang=ja&page=2"),
            tag("items:ja"),
            response("ja2"),
        );
        tier.set(ResponseKey::new("/cache/items", "lang=en"), tag("items:en"), response("en"));

        assert_eq!(tier.invalidate_tag(&tag("items:ja")), 2);
        assert_eq!(tier.len(), 1);
        assert!(tier.get(&ResponseKey::new("/cache/items", "lang=en")).is_some());
        assert_eq!(tier.invalidate_tag(&tag("items:ja")), 0);
    }

    #[test]
    fn every_query_string_gets_its_own_response() {
        let tier = TagTier::new(TagTierConfig::default());
        let queries: Vec<String> = (0..200).map(|page| format!("lang=ja&page={page}")).collect();
        for query in &queries {
            tier.set(
                ResponseKey::new("/cache/items", query),
                tag("items:ja"),
                CachedResponse {
                    status: 200,
                    headers: Vec::new(),
                    body: Bytes::from(query.clone()),
                },
            );
        }

        assert_eq!(tier.len(), queries.len());
        for query in &queries {
            let cached = tier
                .get(&ResponseKey::new("/cache/items", query))
                .expect("stored response");
            assert_eq!(cached.body, Bytes::from(query.clone()));
        }
    }

    #[test]
    fn entries_expire_after_ttl() {
        let tier = TagTier::new(TagTierConfig {
            ttl: Duration::from_secs(60),
            ..Default::default()
        });
        let key = ResponseKey::new("/cache/traders", "");
        tier.set(key.clone(), tag("traders:ja"), response("[]"));

        let later = Instant::now() + Duration::from_secs(61);
        assert!(tier.get_at(&key, later).is_none());
        assert!(tier.is_empty());
    }

    #[test]
    fn capacity_evicts_least_recent() {
        let tier = TagTier::new(TagTierConfig {
            response_limit: 1,
            ..Default::default()
        });
        let first = ResponseKey::new("/cache/items", "page=1");
        tier.set(first.clone(), tag("items:ja"), response("1"));
        let evicted = tier.set(ResponseKey::new("/cache/items", "page=2"), tag("items:ja"), response("2"));

        assert_eq!(evicted, Some(first));
        assert_eq!(tier.len(), 1);
    }

    #[test]
    fn replacing_a_key_is_not_an_eviction() {
        let tier = TagTier::new(TagTierConfig::default());
        let key = ResponseKey::new("/cache/tasks", "lang=en");
        tier.set(key.clone(), tag("tasks:en"), response("old"));
        assert_eq!(tier.set(key.clone(), tag("tasks:en"), response("new")), None);
        assert_eq!(tier.get(&key).map(|cached| cached.body), Some(Bytes::from_static(b"new")));
    }

    #[test]
    fn poisoned_lock_is_recovered() {
        let tier = TagTier::new(TagTierConfig::default());
        let _ = catch_unwind(AssertUnwindSafe(|| {
            let _guard = tier.responses.write().expect("lock");
            panic!("poison the lock");
        }));

        tier.set(ResponseKey::new("/cache/items", ""), tag("items:ja"), response("ok"));
        assert_eq!(tier.len(), 1);
    }
}
