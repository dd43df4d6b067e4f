use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use time::OffsetDateTime;

use crate::{
    domain::types::Language,
    infra::http::{
        HttpState,
        error::ApiError,
        models::{
            BatchRevalidateRequest, BatchRevalidateResponse, RevalidateRequest,
            RevalidateResponse,
        },
    },
};

use super::json_body;

/// Invalidates one tag; with a language the matching persisted rows go too.
pub(crate) async fn revalidate_tag(
    State(state): State<HttpState>,
    payload: Result<Json<RevalidateRequest>, JsonRejection>,
) -> Result<Json<RevalidateResponse>, ApiError> {
    let request = json_body(payload)?;
    let tag = request
        .tag
        .filter(|tag| !tag.trim().is_empty())
        .ok_or_else(|| ApiError::invalid_input("Tag is required", None))?;
    let language = request
        .language
        .as_deref()
        .filter(|value| !value.trim().is_empty())
        .map(Language::parse)
        .transpose()?;

    let outcome = state
        .invalidation
        .invalidate(&tag, language.as_ref())
        .await?;

    Ok(Json(RevalidateResponse {
        success: true,
        message: format!("Cache invalidated for {}", outcome.tag),
        invalidated_tag: outcome.tag,
        purged_responses: outcome.purged_responses,
        purged_rows: outcome.purged_rows,
        timestamp: OffsetDateTime::now_utc(),
    }))
}

/// Invalidates each tag independently and reports per-tag outcomes.
pub(crate) async fn revalidate_batch(
    State(state): State<HttpState>,
    payload: Result<Json<BatchRevalidateRequest>, JsonRejection>,
) -> Result<Json<BatchRevalidateResponse>, ApiError> {
    let request = json_body(payload)?;
    let tags = request
        .tags
        .filter(|tags| !tags.is_empty())
        .ok_or_else(|| ApiError::invalid_input("Tags array is required", None))?;

    let results = state.invalidation.invalidate_many(&tags);

    Ok(Json(BatchRevalidateResponse {
        success: true,
        message: "Batch cache invalidation completed".to_string(),
        results,
        timestamp: OffsetDateTime::now_utc(),
    }))
}
