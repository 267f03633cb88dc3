//! API service routes

use axum::{
    Json, Router,
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::json;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::AppState;

pub mod products;
pub mod users;

/// Create the router for the API service
pub fn create_router(state: AppState) -> Router {
    let uploads_root = state.image_store.root().to_path_buf();

    Router::new()
        .route("/health", get(health_check))
        .route("/", post(users::register))
        .route("/login", post(users::login))
        .route("/verify-token", get(users::verify_token))
        .nest("/products", products::router(state.clone()))
        .nest_service("/uploads", ServeDir::new(uploads_root))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "stockroom-api"
    }))
}
