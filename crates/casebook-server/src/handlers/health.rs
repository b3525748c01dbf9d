//! Health check

use crate::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// `db` is true only when the relational backend answered
pub async fn health(State(state): State<AppState>) -> Response {
    match state.store.ping().await {
        Ok(db) => Json(json!({ "ok": true, "db": db })).into_response(),
        Err(e) => {
            tracing::error!("Health check failed ({} backend): {}", state.store.backend(), e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "ok": false, "error": e.to_string() })),
            )
                .into_response()
        }
    }
}
