//! JSON bodies of the cache HTTP surface.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    application::{
        catalog::{CacheSource, Loaded},
        invalidation::TagOutcome,
        query::{CategoryMode, SortKey, SortOrder},
        repos::SessionUser,
    },
    domain::items::ItemRecord,
};

/// Provenance fields shared by every cached read.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheMeta {
    pub cached: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub stale: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub cached_at: OffsetDateTime,
    pub cache_source: CacheSource,
}

impl CacheMeta {
    pub fn of<T>(loaded: &Loaded<T>) -> Self {
        Self {
            cached: loaded.cached,
            stale: loaded.stale,
            cached_at: loaded.cached_at,
            cache_source: loaded.source,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemListResponse {
    pub data: Vec<ItemRecord>,
    pub total: usize,
    /// Zero when paging is disabled.
    pub limit: usize,
    pub offset: usize,
    pub page: usize,
    pub page_size: usize,
    pub sort: SortKey,
    pub order: SortOrder,
    pub query: String,
    pub categories: Vec<String>,
    pub category_mode: CategoryMode,
    #[serde(flatten)]
    pub meta: CacheMeta,
}

#[derive(Debug, Serialize)]
pub struct DocumentResponse<T> {
    pub data: T,
    #[serde(flatten)]
    pub meta: CacheMeta,
}

#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub data: Vec<T>,
    pub total: usize,
    #[serde(flatten)]
    pub meta: CacheMeta,
}

#[derive(Debug, Serialize)]
pub struct CategoriesResponse {
    pub categories: Vec<String>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct TypesResponse {
    pub types: Vec<String>,
    pub count: usize,
}

#[derive(Debug, Default, Deserialize)]
pub struct InvalidateItemsRequest {
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidateItemsResponse {
    pub success: bool,
    pub message: String,
    pub invalidated_tag: String,
    pub purged_responses: usize,
}

#[derive(Debug, Deserialize)]
pub struct RevalidateRequest {
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevalidateResponse {
    pub success: bool,
    pub message: String,
    pub invalidated_tag: String,
    pub purged_responses: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purged_rows: Option<u64>,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

#[derive(Debug, Deserialize)]
pub struct BatchRevalidateRequest {
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct BatchRevalidateResponse {
    pub success: bool,
    pub message: String,
    pub results: Vec<TagOutcome>,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user: SessionUser,
}
