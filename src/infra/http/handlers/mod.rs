pub(super) mod health;
pub(super) mod items;
pub(super) mod resources;
pub(super) mod revalidate;
pub(super) mod session;

use axum::{
    Json,
    extract::rejection::JsonRejection,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::cache::StaleResponse;

use super::error::ApiError;

/// Serializes `body` and marks stale fallbacks so the tag tier skips them.
fn cached_json<T: Serialize>(body: T, stale: bool) -> Response {
    let mut response = Json(body).into_response();
    if stale {
        response.extensions_mut().insert(StaleResponse);
    }
    response
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload.map(|Json(body)| body).map_err(|rejection| {
        ApiError::invalid_input("Request body is not valid JSON", Some(rejection.body_text()))
    })
}
