//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::cache_entry::CacheEntry;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Key-value store of upstream payloads with per-row freshness.
///
/// Rows past `expires_at` are never removed by reads; they stay available for
/// stale fallback until replaced by an upsert or removed by an explicit delete.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Returns the row regardless of freshness.
    async fn read(&self, key: &str) -> Result<Option<CacheEntry>, RepoError>;

    /// Returns the row only when `expires_at > now`.
    async fn read_fresh(
        &self,
        key: &str,
        now: OffsetDateTime,
    ) -> Result<Option<CacheEntry>, RepoError>;

    /// Replaces the value and expiry of `key` in one step, keeping `created_at`
    /// from the first write and strictly advancing `updated_at`.
    async fn upsert(
        &self,
        key: &str,
        value: &Value,
        expires_at: OffsetDateTime,
    ) -> Result<CacheEntry, RepoError>;

    /// Removes every row whose key starts with `prefix`; returns the count.
    async fn delete_by_prefix(&self, prefix: &str) -> Result<u64, RepoError>;

    async fn delete(&self, key: &str) -> Result<bool, RepoError>;

    async fn health_check(&self) -> Result<(), RepoError> {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionUser {
    pub id: Uuid,
    pub email: String,
    pub username: Option<String>,
}

/// Read-only view of the account subsystem's sessions.
#[async_trait]
pub trait SessionLookup: Send + Sync {
    /// Resolves a session token to its user when the session has not expired.
    async fn find_active_session(
        &self,
        token: &str,
        now: OffsetDateTime,
    ) -> Result<Option<SessionUser>, RepoError>;
}
