use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use time::OffsetDateTime;

/// One persisted upstream payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheEntry {
    pub key: String,
    pub value: Value,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
}

impl CacheEntry {
    pub fn is_fresh_at(&self, now: OffsetDateTime) -> bool {
        self.expires_at > now
    }

    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;
    use time::macros::datetime;

    #[test]
    fn freshness_is_exclusive_at_expiry() {
        let now = datetime!(2025-01-01 00:00 UTC);
        let entry = CacheEntry {
            key: "cache:items:list:ja:v1".into(),
            value: serde_json::json!([]),
            created_at: now,
            updated_at: now,
            expires_at: now + Duration::hours(2),
        };

        assert!(entry.is_fresh_at(now + Duration::minutes(119)));
        assert!(!entry.is_fresh_at(now + Duration::hours(2)));
    }
}
