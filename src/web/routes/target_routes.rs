use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::db::entities::{check_log, target};
use crate::db::services::{DEFAULT_LOG_LIMIT, check_log_service, target_service};
use crate::web::extractors::OwnerId;
use crate::web::{AppError, AppState};

#[derive(Debug, Deserialize)]
pub struct CreateTarget {
    pub url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetDetails {
    #[serde(flatten)]
    pub target: target::Model,
    pub logs: Vec<check_log::Model>,
}

pub fn create_target_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_targets).post(create_target))
        .route("/{id}", get(get_target).delete(delete_target))
}

async fn list_targets(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Vec<target::Model>>, AppError> {
    let targets = target_service::list_targets(&app_state.db_pool).await?;
    Ok(Json(targets))
}

async fn create_target(
    State(app_state): State<Arc<AppState>>,
    OwnerId(owner): OwnerId,
    Json(payload): Json<CreateTarget>,
) -> Result<(StatusCode, Json<target::Model>), AppError> {
    let created = target_service::create_target(&app_state.db_pool, &payload.url, &owner).await?;
    info!(target_id = created.id, url = %created.url, owner = %owner, "Target registered.");
    Ok((StatusCode::CREATED, Json(created)))
}

async fn get_target(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<TargetDetails>, AppError> {
    let target = target_service::get_target(&app_state.db_pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Target not found".to_string()))?;
    let logs =
        check_log_service::get_logs_for_target(&app_state.db_pool, id, DEFAULT_LOG_LIMIT).await?;

    Ok(Json(TargetDetails { target, logs }))
}

async fn delete_target(
    State(app_state): State<Arc<AppState>>,
    OwnerId(owner): OwnerId,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    target_service::delete_target(&app_state.db_pool, id, &owner).await?;
    info!(target_id = id, owner = %owner, "Target deleted.");
    Ok(StatusCode::NO_CONTENT)
}
