use axum::{
    extract::{Path, Query, State},
    response::Response,
};

use crate::infra::http::{
    HttpState,
    error::ApiError,
    models::{CacheMeta, DocumentResponse, ListResponse},
};

use super::{cached_json, items::LangQuery};

pub(crate) async fn item_detail(
    State(state): State<HttpState>,
    Path(id): Path<String>,
    Query(query): Query<LangQuery>,
) -> Result<Response, ApiError> {
    let lang = state.languages.resolve(query.lang());
    let loaded = state.catalog.item(&id, &lang).await?;
    let meta = CacheMeta::of(&loaded);
    let stale = loaded.stale;

    Ok(cached_json(
        DocumentResponse {
            data: loaded.value,
            meta,
        },
        stale,
    ))
}

pub(crate) async fn list_traders(
    State(state): State<HttpState>,
    Query(query): Query<LangQuery>,
) -> Result<Response, ApiError> {
    let lang = state.languages.resolve(query.lang());
    let loaded = state.catalog.traders(&lang).await?;
    let meta = CacheMeta::of(&loaded);
    let stale = loaded.stale;

    Ok(cached_json(
        ListResponse {
            total: loaded.value.len(),
            data: loaded.value,
            meta,
        },
        stale,
    ))
}

pub(crate) async fn list_tasks(
    State(state): State<HttpState>,
    Query(query): Query<LangQuery>,
) -> Result<Response, ApiError> {
    let lang = state.languages.resolve(query.lang());
    let loaded = state.catalog.tasks(&lang).await?;
    let meta = CacheMeta::of(&loaded);
    let stale = loaded.stale;

    Ok(cached_json(
        ListResponse {
            total: loaded.value.len(),
            data: loaded.value,
            meta,
        },
        stale,
    ))
}
