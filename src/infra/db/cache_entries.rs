use async_trait::async_trait;
use serde_json::Value;
use time::OffsetDateTime;

use crate::{
    application::repos::{CacheStore, RepoError},
    domain::cache_entry::CacheEntry,
};

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct CacheEntryRow {
    key: String,
    value: Value,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
    expires_at: OffsetDateTime,
}

impl From<CacheEntryRow> for CacheEntry {
    fn from(row: CacheEntryRow) -> Self {
        Self {
            key: row.key,
            value: row.value,
            created_at: row.created_at,
            updated_at: row.updated_at,
            expires_at: row.expires_at,
        }
    }
}

#[async_trait]
impl CacheStore for PostgresRepositories {
    async fn read(&self, key: &str) -> Result<Option<CacheEntry>, RepoError> {
        let row = sqlx::query_as::<_, CacheEntryRow>(
            r#"
            SELECT key, value, created_at, updated_at, expires_at
            FROM cache_entries
            WHERE key = $1
            "#,
        )
        .bind(key)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(CacheEntry::from))
    }

    async fn read_fresh(
        &self,
        key: &str,
        now: OffsetDateTime,
    ) -> Result<Option<CacheEntry>, RepoError> {
        let row = sqlx::query_as::<_, CacheEntryRow>(
            r#"
            SELECT key, value, created_at, updated_at, expires_at
            FROM cache_entries
            WHERE key = $1 AND expires_at > $2
            "#,
        )
        .bind(key)
        .bind(now)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(CacheEntry::from))
    }

    async fn upsert(
        &self,
        key: &str,
        value: &Value,
        expires_at: OffsetDateTime,
    ) -> Result<CacheEntry, RepoError> {
        let now = OffsetDateTime::now_utc();
        let row = sqlx::query_as::<_, CacheEntryRow>(
            r#"
            INSERT INTO cache_entries (key, value, created_at, updated_at, expires_at)
            VALUES ($1, $2, $3, $3, $4)
            ON CONFLICT (key) DO UPDATE
            SET value = EXCLUDED.value,
                expires_at = EXCLUDED.expires_at,
                updated_at = GREATEST(
                    EXCLUDED.updated_at,
                    cache_entries.updated_at + INTERVAL '1 microsecond'
                )
            RETURNING key, value, created_at, updated_at, expires_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(now)
        .bind(expires_at)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn delete_by_prefix(&self, prefix: &str) -> Result<u64, RepoError> {
        let result = sqlx::query(
            r#"
            DELETE FROM cache_entries
            WHERE left(key, length($1)) = $1
            "#,
        )
        .bind(prefix)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }

    async fn delete(&self, key: &str) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM cache_entries WHERE key = $1")
            .bind(key)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn health_check(&self) -> Result<(), RepoError> {
        self.ping().await.map_err(map_sqlx_error)
    }
}
