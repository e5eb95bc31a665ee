use axum::{Router, middleware::from_fn_with_state, routing::get};
use tower_http::trace::TraceLayer;

use crate::{AppState, routes};

pub(crate) mod auth;

pub fn router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .merge(routes::auth::router())
        .merge(routes::todos::router())
        .merge(routes::subtasks::router())
        .merge(routes::trash::router())
        .merge(routes::categories::router())
        .merge(routes::tags::router())
        .merge(routes::shares::router())
        .merge(routes::activities::router())
        .layer(from_fn_with_state(state.clone(), auth::require_user));

    let api_routes = Router::new()
        .merge(routes::auth::public_router())
        .merge(routes::cron::router())
        .merge(protected_routes);

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
