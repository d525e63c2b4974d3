pub mod health;
pub mod questions;
pub mod share_link;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::middleware::rate_limit::{limit_requests, RateLimiter};
use crate::AppState;

/// Authoring routes and the public play route, each behind its own limiter.
pub fn app_router(state: AppState, public_rps: u32, integration_rps: u32) -> Router {
    let authoring_api = Router::new()
        .route(
            "/api/assignments/:id/share-link",
            post(share_link::issue_share_link),
        )
        .route(
            "/api/assignments/:id/questions",
            put(questions::save_questions),
        )
        .layer(axum::middleware::from_fn_with_state(
            RateLimiter::per_second(integration_rps),
            limit_requests,
        ));

    let public_api = Router::new()
        .route(
            "/api/public/assignments/play/:token",
            get(share_link::play_assignment),
        )
        .layer(axum::middleware::from_fn_with_state(
            RateLimiter::per_second(public_rps),
            limit_requests,
        ));

    Router::new()
        .route("/health", get(health::health))
        .merge(authoring_api)
        .merge(public_api)
        .with_state(state)
}
