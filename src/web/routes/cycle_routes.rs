use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::get,
};
use serde_json::{Value, json};
use std::sync::Arc;

use crate::checker::TriggerDecision;
use crate::web::extractors::bearer_token;
use crate::web::{AppError, AppState};

pub fn create_cycle_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/trigger", get(trigger_with_header).post(trigger_with_header))
        .route("/trigger/{token}", get(trigger_with_path).post(trigger_with_path))
}

async fn trigger_with_path(
    State(app_state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    schedule_cycle(&app_state, &token)
}

async fn trigger_with_header(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<(StatusCode, Json<Value>), AppError> {
    schedule_cycle(&app_state, bearer_token(&headers).unwrap_or_default())
}

fn schedule_cycle(app_state: &AppState, token: &str) -> Result<(StatusCode, Json<Value>), AppError> {
    match app_state.trigger_gate.trigger(token) {
        // The cycle keeps running after the handle is dropped.
        TriggerDecision::Accepted { cycle, .. } => Ok((
            StatusCode::ACCEPTED,
            Json(json!({ "status": "accepted", "message": "Check cycle scheduled.", "cycle": cycle })),
        )),
        TriggerDecision::Rejected => Err(AppError::Forbidden("Invalid trigger token".to_string())),
    }
}
