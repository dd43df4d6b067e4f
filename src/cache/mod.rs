//! Revalidation tag tier.
//!
//! A bounded, short-lived store of rendered GET responses in front of the
//! catalog handlers. Every stored response carries the tag of its resource
//! and language (`items:ja`, `traders:en`, ...); invalidating a tag drops all
//! of them at once while the persisted rows stay untouched.
//!
//! ```toml
//! [revalidation]
//! enabled = true
//! ttl_seconds = 60
//! response_limit = 256
//! ```

mod config;
mod keys;
pub(crate) mod lock;
mod middleware;
mod store;

pub use config::TagTierConfig;
pub use keys::{ResponseKey, RevalidationTag};
pub use middleware::{RevalidationState, StaleResponse, revalidation_layer};
pub use store::{
    CachedResponse, METRIC_TAG_INVALIDATED, METRIC_TAG_TIER_EVICT, METRIC_TAG_TIER_HIT,
    METRIC_TAG_TIER_MISS, TagTier,
};
