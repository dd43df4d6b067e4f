use axum::{
    Json,
    extract::{Query, RawQuery, State, rejection::JsonRejection},
    response::Response,
};
use serde::Deserialize;

use crate::{
    cache::RevalidationTag,
    domain::types::ResourceKind,
    infra::http::{
        HttpState,
        error::ApiError,
        models::{
            CacheMeta, CategoriesResponse, InvalidateItemsRequest, InvalidateItemsResponse,
            ItemListResponse, TypesResponse,
        },
        params::ItemListParams,
    },
};

use super::{cached_json, json_body};

pub(crate) async fn list_items(
    State(state): State<HttpState>,
    RawQuery(raw): RawQuery,
) -> Result<Response, ApiError> {
    let params = ItemListParams::parse(raw.as_deref().unwrap_or(""), state.default_page_size.get())?;
    let lang = state.languages.resolve(params.lang.as_deref());
    let query = params.query;

    let loaded = state.catalog.query_items(&lang, &query).await?;
    let meta = CacheMeta::of(&loaded);
    let stale = loaded.stale;
    let page = loaded.value;

    let offset = query.pagination.offset();
    let limit = query.pagination.limit().unwrap_or(0);
    let body = ItemListResponse {
        data: page.records,
        total: page.total,
        limit,
        offset,
        page: if limit == 0 { 1 } else { offset / limit + 1 },
        page_size: limit,
        sort: query.sort,
        order: query.order,
        query: query.text,
        categories: query.categories,
        category_mode: query.mode,
        meta,
    };
    Ok(cached_json(body, stale))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct LangQuery {
    lang: Option<String>,
}

impl LangQuery {
    pub(crate) fn lang(&self) -> Option<&str> {
        self.lang.as_deref()
    }
}

pub(crate) async fn list_categories(
    State(state): State<HttpState>,
    Query(query): Query<LangQuery>,
) -> Json<CategoriesResponse> {
    let lang = state.languages.resolve(query.lang());
    let categories = state.catalog.cached_categories(&lang).await;
    Json(CategoriesResponse {
        count: categories.len(),
        categories,
    })
}

pub(crate) async fn list_types(
    State(state): State<HttpState>,
    Query(query): Query<LangQuery>,
) -> Json<TypesResponse> {
    let lang = state.languages.resolve(query.lang());
    let types = state.catalog.cached_categories(&lang).await;
    Json(TypesResponse {
        count: types.len(),
        types,
    })
}

/// Drops the rendered item responses of one language; persisted rows stay.
pub(crate) async fn invalidate_items(
    State(state): State<HttpState>,
    payload: Result<Json<InvalidateItemsRequest>, JsonRejection>,
) -> Result<Json<InvalidateItemsResponse>, ApiError> {
    let request = json_body(payload)?;
    let lang = state.languages.resolve(request.language.as_deref());
    let tag = RevalidationTag::for_resource(ResourceKind::Items, &lang);
    let purged_responses = state.invalidation.invalidate_tag(&tag);

    Ok(Json(InvalidateItemsResponse {
        success: true,
        message: format!("Cache invalidated for {tag}"),
        invalidated_tag: tag.to_string(),
        purged_responses,
    }))
}
