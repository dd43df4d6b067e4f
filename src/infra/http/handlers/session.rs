use axum::{
    Json,
    extract::State,
    http::{HeaderMap, header::COOKIE},
};
use time::OffsetDateTime;

use crate::infra::http::{HttpState, error::ApiError, models::SessionResponse};

const SESSION_COOKIE: &str = "session-token";

pub(crate) async fn current_user(
    State(state): State<HttpState>,
    headers: HeaderMap,
) -> Result<Json<SessionResponse>, ApiError> {
    let token = session_token(&headers).ok_or_else(|| ApiError::unauthorized("Not signed in"))?;

    let user = state
        .sessions
        .find_active_session(&token, OffsetDateTime::now_utc())
        .await?
        .ok_or_else(|| ApiError::unauthorized("Session is invalid or expired"))?;

    Ok(Json(SessionResponse { user }))
}

fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
