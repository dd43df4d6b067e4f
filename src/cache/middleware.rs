//! Revalidation tag tier middleware.
//!
//! Serves recently rendered GET responses and stores new 200 responses under
//! the tag of the route's resource and the request language.

use std::sync::Arc;

use axum::{
    body::{Body, HttpBody},
    extract::State,
    http::{HeaderValue, Method, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, instrument, warn};

use crate::domain::types::{LanguagePolicy, ResourceKind};

use super::{
    TagTier,
    keys::{ResponseKey, RevalidationTag},
    store::CachedResponse,
};

/// Response extension set by handlers whose body came from a stale fallback.
#[derive(Debug, Clone, Copy)]
pub struct StaleResponse;

/// Per-route-group state for [`revalidation_layer`].
#[derive(Clone)]
pub struct RevalidationState {
    pub tier: Arc<TagTier>,
    pub resource: ResourceKind,
    pub languages: Arc<LanguagePolicy>,
}

#[instrument(skip_all, fields(path = %request.uri().path(), resource = %state.resource))]
pub async fn revalidation_layer(
    State(state): State<RevalidationState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !state.tier.config().enabled || request.method() != Method::GET {
        return next.run(request).await;
    }

    let path = request.uri().path().to_string();
    let query = request.uri().query().unwrap_or("").to_string();
    let lang = state.languages.resolve(lang_param(&query).as_deref());
    let tag = RevalidationTag::for_resource(state.resource, &lang);
    let key = ResponseKey::new(&path, &query);

    if let Some(cached) = state.tier.get(&key) {
        debug!(cache = "tag_tier", outcome = "hit", tag = %tag, "serving rendered response");
        return build_response(cached);
    }

    debug!(cache = "tag_tier", outcome = "miss", tag = %tag, "executing handler");
    let response = next.run(request).await;

    if response.status() != StatusCode::OK || response.extensions().get::<StaleResponse>().is_some()
    {
        return response;
    }

    let limit = state.tier.config().body_limit_bytes;
    let too_large = response
        .body()
        .size_hint()
        .upper()
        .is_none_or(|upper| upper > limit as u64);
    if too_large {
        debug!(cache = "tag_tier", outcome = "skip_oversized", tag = %tag, "response not stored");
        return response;
    }

    let (parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, limit).await {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!(cache = "tag_tier", error = %err, "failed to buffer response body");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let cached = CachedResponse {
        status: parts.status.as_u16(),
        headers: parts
            .headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.to_string(), value.to_string()))
            })
            .collect(),
        body: bytes.clone(),
    };
    state.tier.set(key, tag, cached);

    Response::from_parts(parts, Body::from(bytes))
}

fn lang_param(query: &str) -> Option<String> {
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(name, _)| name == "lang")
        .map(|(_, value)| value.into_owned())
}

fn build_response(cached: CachedResponse) -> Response {
    let mut builder = Response::builder().status(cached.status);

    for (name, value) in cached.headers {
        if let Ok(header_value) = HeaderValue::from_str(&value) {
            builder = builder.header(name, header_value);
        }
    }

    builder
        .body(Body::from(cached.body))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::{Router, middleware, routing::get};
    use tower::ServiceExt;

    use super::*;
    use crate::cache::TagTierConfig;
    use crate::domain::types::Language;

    fn state(tier: Arc<TagTier>) -> RevalidationState {
        RevalidationState {
            tier,
            resource: ResourceKind::Items,
            languages: Arc::new(LanguagePolicy::default()),
        }
    }

    fn request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).expect("request")
    }

    #[tokio::test]
    async fn second_get_is_served_from_the_tier_until_invalidated() {
        let calls = Arc::new(AtomicUsize::new(0));
        let tier = Arc::new(TagTier::new(TagTierConfig::default()));
        let counter = Arc::clone(&calls);
        let app = Router::new()
            .route(
                "/cache/items",
                get(move || {
                    let counter = Arc::clone(&counter);
                    async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                        "rendered"
                    }
                }),
            )
            .layer(middleware::from_fn_with_state(
                state(Arc::clone(&tier)),
                revalidation_layer,
            ));

        for _ in 0..2 {
            let response = app
                .clone()
                .oneshot(request("/cache/items?lang=en"))
                .await
                .expect("response");
            assert_eq!(response.status(), StatusCode::OK);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let en = Language::parse("en").expect("language");
        let removed = tier.invalidate_tag(&RevalidationTag::for_resource(ResourceKind::Items, &en));
        assert_eq!(removed, 1);

        app.oneshot(request("/cache/items?lang=en"))
            .await
            .expect("response");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn stale_and_error_responses_are_not_stored() {
        let tier = Arc::new(TagTier::new(TagTierConfig::default()));
        let app = Router::new()
            .route(
                "/cache/items",
                get(|| async {
                    let mut response = "stale body".into_response();
                    response.extensions_mut().insert(StaleResponse);
                    response
                }),
            )
            .route(
                "/cache/items/broken",
                get(|| async { StatusCode::BAD_GATEWAY }),
            )
            .layer(middleware::from_fn_with_state(
                state(Arc::clone(&tier)),
                revalidation_layer,
            ));

        app.clone()
            .oneshot(request("/cache/items"))
            .await
            .expect("response");
        app.oneshot(request("/cache/items/broken"))
            .await
            .expect("response");

        assert!(tier.is_empty());
    }

    #[test]
    fn lang_param_reads_the_query() {
        assert_eq!(lang_param("q=ak&lang=en").as_deref(), Some("en"));
        assert_eq!(lang_param("q=ak"), None);
    }
}
