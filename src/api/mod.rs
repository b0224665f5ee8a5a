mod dto;
mod error;
mod handlers;
mod state;

pub use state::AppState;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Build the application router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::status))
        .route(
            "/prof_feedback/{id}/{course}/{course_display}/{prompt}",
            get(handlers::prof_feedback),
        )
        .route(
            "/stream_prof_feedback/{id}/{course}/{course_display}/{prompt}",
            get(handlers::stream_prof_feedback),
        )
        .route("/professors/basic", post(handlers::basic))
        .route("/professors/details", post(handlers::details))
        .route("/professors/search", post(handlers::search))
        .layer(TraceLayer::new_for_http())
        // Called cross-origin from the browser extension
        .layer(CorsLayer::permissive())
        .with_state(state)
}
