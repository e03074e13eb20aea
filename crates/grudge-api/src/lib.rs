pub mod auth;
pub mod enemies;
pub mod error;
pub mod grievances;
pub mod middleware;
pub mod position;
pub mod sync;

use axum::{
    Json, Router,
    routing::{delete, get, post},
};
use serde_json::json;

use crate::auth::AppState;
use crate::middleware::require_auth;

/// Assemble the full REST surface over the given state. Also what the
/// in-process router tests drive.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/enemies", get(enemies::list_enemies).post(enemies::create_enemy))
        .route("/enemies/{id}", delete(enemies::delete_enemy))
        .route("/enemies/{id}/grievances", post(grievances::create_grievance))
        .route("/grievances/{id}", delete(grievances::delete_grievance))
        .route("/sync", post(sync::sync))
        .route("/position", post(position::update_position))
        .layer(axum::middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state);

    Router::new().merge(public_routes).merge(protected_routes)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}
