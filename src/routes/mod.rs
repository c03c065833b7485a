pub mod candidates;
pub mod health;
pub mod tags;
pub mod telegram;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};

use crate::middleware::{
    auth::require_api_key,
    rate_limit::{rps_middleware, RateLimiter},
};
use crate::AppState;

/// Builds the full HTTP surface. Intake requires the API key and is rate
/// limited. The chat webhook must answer every update with a 200, so it has
/// no limiter.
pub fn router(state: AppState) -> Router {
    let intake = post(candidates::create_candidate)
        .layer(from_fn_with_state(state.api_key.clone(), require_api_key))
        .layer(from_fn_with_state(
            RateLimiter::new(state.public_rps),
            rps_middleware,
        ));

    Router::new()
        .route("/health", get(health::health))
        .route(
            "/api/candidates",
            get(candidates::list_candidates).merge(intake),
        )
        .route(
            "/api/candidates/:id",
            get(candidates::get_candidate).patch(candidates::review_candidate),
        )
        .route(
            "/api/telegram/webhook",
            get(telegram::webhook_status).post(telegram::handle_webhook),
        )
        .route("/api/tags", get(tags::list_tags).post(tags::create_tag))
        .with_state(state)
}
