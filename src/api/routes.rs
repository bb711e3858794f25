use crate::api::handlers::{ask, health, page};
use crate::AppState;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Room for the question field and multipart framing on top of the file.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn create_router(state: AppState) -> Router {
    let body_limit = state.config.server.max_upload_bytes + FORM_OVERHEAD_BYTES;

    let api = Router::new()
        .route("/ask", post(ask::ask))
        .route("/health", get(health::health));

    Router::new()
        .route("/", get(page::index))
        .nest("/api", api)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
