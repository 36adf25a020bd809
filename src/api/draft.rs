//! Draft endpoints: the in-progress selection lives server-side so
//! unsaved clicks survive a page reload or restart. No login is
//! required; the draft exists before the viewer does.

use axum::{extract::State, Json};
use serde::Deserialize;
use std::sync::Arc;

use crate::model::Draft;
use crate::AppState;

use super::error::ApiError;

pub async fn get_draft(State(state): State<Arc<AppState>>) -> Json<Draft> {
    Json(state.draft.get())
}

pub async fn put_draft(
    State(state): State<Arc<AppState>>,
    Json(req): Json<Draft>,
) -> Result<Json<Draft>, ApiError> {
    state.draft.put(&req)?;
    Ok(Json(req))
}

#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    pub state: String,
}

/// Toggle one state in the selection, as a map click does.
pub async fn toggle_state(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ToggleRequest>,
) -> Result<Json<Draft>, ApiError> {
    Ok(Json(state.draft.toggle(&req.state)?))
}

/// Clear the selection.
pub async fn reset_draft(State(state): State<Arc<AppState>>) -> Result<Json<Draft>, ApiError> {
    Ok(Json(state.draft.reset()?))
}
