use crate::{types::HealthResponse, AppState};
use axum::{extract::State, Json};

/// Report liveness, the vector store in use, its size and the indexed file.
///
/// Never waits on the session: while a request holds it the status is `busy`.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let (status, current_file) = match state.session.try_lock() {
        Ok(session) => (
            "ok",
            session.current_file.as_ref().map(|f| f.name.clone()),
        ),
        Err(_) => ("busy", None),
    };

    let store = state.pipeline.store();
    let vector_count = match store.count().await {
        Ok(count) => Some(count),
        Err(e) => {
            tracing::warn!(error = %e, "Could not count vectors");
            None
        }
    };

    Json(HealthResponse {
        status: status.to_string(),
        vector_store: store.provider_name().to_string(),
        vector_count,
        current_file,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
