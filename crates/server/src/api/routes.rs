use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::{conversions, handlers, middleware::metrics_middleware};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // API routes
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .route("/capabilities", get(handlers::capabilities))
        // Conversions
        .route("/conversions", post(conversions::create_conversion))
        .route("/conversions/inline", post(conversions::convert_inline))
        .route("/conversions/{task_id}", get(conversions::get_conversion))
        .route("/conversions/{task_id}", delete(conversions::delete_conversion))
        .route("/conversions/{task_id}/ready", get(conversions::conversion_ready))
        // Artifacts
        .route("/artifacts", delete(conversions::delete_artifact))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::metrics))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
}
