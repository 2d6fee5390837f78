use axum::{Router, extract::FromRef, http::Method, response::IntoResponse, routing::get};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::checker::TriggerGate;
use crate::web::extractors::ClientAddressSource;
use crate::web::routes::{cycle_routes, target_routes};

pub mod error;
pub mod extractors;
pub mod routes;

pub use error::AppError;

#[derive(Clone)]
pub struct AppState {
    pub db_pool: DatabaseConnection,
    pub trigger_gate: Arc<TriggerGate>,
    pub client_address_source: ClientAddressSource,
}

impl FromRef<Arc<AppState>> for ClientAddressSource {
    fn from_ref(app_state: &Arc<AppState>) -> Self {
        app_state.client_address_source
    }
}

async fn health_check_handler() -> impl IntoResponse {
    "OK"
}

pub fn create_axum_router(
    db_pool: DatabaseConnection,
    trigger_gate: Arc<TriggerGate>,
    client_address_source: ClientAddressSource,
) -> Router {
    let app_state = Arc::new(AppState {
        db_pool,
        trigger_gate,
        client_address_source,
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(vec![Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health_check_handler))
        .nest("/api/cycles", cycle_routes::create_cycle_router())
        .nest("/api/targets", target_routes::create_target_router())
        .with_state(app_state)
        .layer(cors)
}
