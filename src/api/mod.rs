pub mod auth;
mod draft;
pub mod error;
mod maps;
pub mod validation;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::AppState;

use error::ApiError;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Auth routes (public)
    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/magic-link", post(auth::magic_link))
        .route("/session", get(auth::session));

    let api_routes = Router::new()
        // Maps
        .route("/maps", get(maps::list_maps).post(maps::create_map))
        .route("/maps/share", post(maps::share))
        .route("/maps/:id", get(maps::get_map).put(maps::update_map))
        .route("/share/:id", get(maps::get_shared))
        // Draft
        .route(
            "/draft",
            get(draft::get_draft)
                .put(draft::put_draft)
                .delete(draft::reset_draft),
        )
        .route("/draft/toggle", post(draft::toggle_state))
        // Map data & liveness
        .route("/boundaries", get(boundaries))
        .route("/health-check", get(health_check));

    Router::new()
        // Magic-link landing: consumes ?token= and strips it
        .route("/login", get(auth::login_link))
        .nest("/api/auth", auth_routes)
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// US-state boundary GeoJSON, fetched upstream and cached. A failed
/// fetch is a 503; the client shows its banner and the map simply has no
/// choropleth layer until a retry succeeds.
async fn boundaries(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    Ok(Json(state.boundaries.get().await?))
}
