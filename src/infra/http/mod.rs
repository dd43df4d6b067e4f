//! HTTP surface of the cache: catalog reads, invalidation, session lookup and health.

pub mod error;
mod handlers;
mod middleware;
mod models;
mod params;
pub mod rate_limit;

pub use middleware::RequestContext;
pub use rate_limit::RateLimiter;

use std::{num::NonZeroU32, sync::Arc};

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};

use crate::{
    application::{
        catalog::CatalogService, invalidation::InvalidationService, repos::SessionLookup,
    },
    cache::{RevalidationState, TagTier, revalidation_layer},
    domain::types::{LanguagePolicy, ResourceKind},
};

use self::{
    handlers::{health, items, resources, revalidate, session},
    middleware::{enforce_rate_limit, log_responses, set_request_context},
};

#[derive(Clone)]
pub struct HttpState {
    pub catalog: Arc<CatalogService>,
    pub invalidation: Arc<InvalidationService>,
    pub sessions: Arc<dyn SessionLookup>,
    pub languages: Arc<LanguagePolicy>,
    pub default_page_size: NonZeroU32,
    /// `None` when the revalidation tag tier is disabled.
    pub tier: Option<Arc<TagTier>>,
    pub rate_limiter: RateLimiter,
}

pub fn build_router(state: HttpState) -> Router {
    let item_routes = Router::new().route(
        "/cache/items",
        get(items::list_items).post(items::invalidate_items),
    );

    // Category scans read the current row on every call; the tier would pin an early empty scan.
    let category_routes = Router::new()
        .route("/cache/items/categories", get(items::list_categories))
        .route("/cache/items/types", get(items::list_types));

    let cache_routes = with_tag_tier(item_routes, &state, ResourceKind::Items)
        .merge(category_routes)
        .merge(with_tag_tier(
            Router::new().route("/cache/item/{id}", get(resources::item_detail)),
            &state,
            ResourceKind::Item,
        ))
        .merge(with_tag_tier(
            Router::new().route("/cache/traders", get(resources::list_traders)),
            &state,
            ResourceKind::Traders,
        ))
        .merge(with_tag_tier(
            Router::new().route("/cache/tasks", get(resources::list_tasks)),
            &state,
            ResourceKind::Tasks,
        ))
        .route(
            "/cache/revalidate",
            post(revalidate::revalidate_tag).put(revalidate::revalidate_batch),
        )
        .layer(axum_middleware::from_fn_with_state(
            state.rate_limiter.clone(),
            enforce_rate_limit,
        ));

    let service_routes = Router::new()
        .route("/api/auth/me", get(session::current_user))
        .route("/_health/store", get(health::store_health));

    cache_routes
        .merge(service_routes)
        .with_state(state)
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
}

fn with_tag_tier(
    routes: Router<HttpState>,
    state: &HttpState,
    resource: ResourceKind,
) -> Router<HttpState> {
    match state.tier.clone() {
        Some(tier) => routes.layer(axum_middleware::from_fn_with_state(
            RevalidationState {
                tier,
                resource,
                languages: Arc::clone(&state.languages),
            },
            revalidation_layer,
        )),
        None => routes,
    }
}
