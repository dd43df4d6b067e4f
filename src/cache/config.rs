//! Revalidation tag tier configuration.

use std::num::NonZeroUsize;
use std::time::Duration;

const DEFAULT_TTL_SECONDS: u64 = 60;
const DEFAULT_RESPONSE_LIMIT: usize = 256;
const DEFAULT_BODY_LIMIT_BYTES: usize = 4 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct TagTierConfig {
    /// Serve and store rendered responses at all.
    pub enabled: bool,
    /// How long a stored response may be served before it is dropped.
    pub ttl: Duration,
    /// Maximum responses kept before LRU eviction.
    pub response_limit: usize,
    /// Responses with larger bodies are passed through uncached.
    pub body_limit_bytes: usize,
}

impl Default for TagTierConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl: Duration::from_secs(DEFAULT_TTL_SECONDS),
            response_limit: DEFAULT_RESPONSE_LIMIT,
            body_limit_bytes: DEFAULT_BODY_LIMIT_BYTES,
        }
    }
}

impl From<&crate::config::RevalidationSettings> for TagTierConfig {
    fn from(settings: &crate::config::RevalidationSettings) -> Self {
        Self {
            enabled: settings.enabled,
            ttl: Duration::from_secs(u64::from(settings.ttl_seconds.get())),
            response_limit: settings.response_limit.get() as usize,
            body_limit_bytes: settings.body_limit_bytes.get() as usize,
        }
    }
}

impl TagTierConfig {
    /// Capacity for the LRU, clamping zero to one.
    pub fn response_limit_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.response_limit).unwrap_or(NonZeroUsize::MIN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_limit_clamps_to_one() {
        let config = TagTierConfig {
            response_limit: 0,
            ..Default::default()
        };
        assert_eq!(config.response_limit_non_zero().get(), 1);
    }

    #[test]
    fn defaults_are_short_lived() {
        let config = TagTierConfig::default();
        assert!(config.enabled);
        assert_eq!(config.ttl, Duration::from_secs(60));
        assert_eq!(config.response_limit, 256);
    }
}
