use axum::body::{Body, to_bytes};
use axum::extract::{Request, State};
use axum::http::{self, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};

use crate::state::AppState;

const MAX_BODY_BYTES: usize = 1 << 20;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/healthz", get(healthz))
        .fallback(table)
}

async fn healthz() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Hands every other request to the table adapter.
async fn table(State(state): State<AppState>, req: Request) -> Response {
    let (parts, body) = req.into_parts();
    let body = match to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes.to_vec(),
        Err(e) => {
            let body = serde_json::json!({ "error": e.to_string() });
            return (StatusCode::PAYLOAD_TOO_LARGE, Json(body)).into_response();
        }
    };

    let cancel = state.shutdown.child_token();
    let response = state
        .table
        .handle_with_cancel(http::Request::from_parts(parts, body), &cancel)
        .await;

    let (parts, body) = response.into_parts();
    Response::from_parts(parts, Body::from(body))
}
