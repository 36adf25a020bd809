//! Map endpoints: owned listing, CRUD, and the share surface.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::auth::Viewer;
use crate::maps::{resolve_id, Visibility};
use crate::model::{
    MapDocument, MapView, SaveMap, SaveMapRequest, Session, ShareRequest, ShareResponse,
    SharedMapView,
};
use crate::states::visit_stats;
use crate::AppState;

use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{validate_states, validate_title};

fn validate_save_request(title: &str, states: &[String]) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();

    if let Err(e) = validate_title(title) {
        errors.add("title", e);
    }

    if let Err(e) = validate_states(states) {
        errors.add("states", e);
    }

    errors.finish()
}

/// The caller's own maps, most recently updated first.
pub async fn list_maps(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Json<Vec<MapDocument>> {
    Json(state.maps.list_owned_by(&session.email))
}

/// A single map, gated by visibility. Private maps of other people are a
/// plain 404.
pub async fn get_map(
    State(state): State<Arc<AppState>>,
    viewer: Viewer,
    Path(id): Path<String>,
) -> Result<Json<MapView>, ApiError> {
    let (map, visibility) = resolve_id(&state.maps, &id, viewer.email())?;
    Ok(Json(MapView {
        map,
        editable: visibility == Visibility::Editable,
    }))
}

/// Save a new map.
pub async fn create_map(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(req): Json<SaveMapRequest>,
) -> Result<(StatusCode, Json<MapDocument>), ApiError> {
    validate_save_request(&req.title, &req.states)?;

    let saved = state.maps.save(
        SaveMap {
            id: None,
            title: req.title,
            states: req.states.into_iter().collect(),
            is_public: req.is_public,
        },
        &Viewer::Authenticated(session),
    )?;

    Ok((StatusCode::CREATED, Json(saved)))
}

/// Overwrite an existing map. Only the owner may save; read-only viewers
/// get told so.
pub async fn update_map(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<String>,
    Json(req): Json<SaveMapRequest>,
) -> Result<Json<MapDocument>, ApiError> {
    validate_save_request(&req.title, &req.states)?;

    let (_, visibility) = resolve_id(&state.maps, &id, Some(&session.email))?;
    if visibility != Visibility::Editable {
        return Err(ApiError::forbidden(
            "You are viewing someone else's map. Changes cannot be saved.",
        ));
    }

    let saved = state.maps.save(
        SaveMap {
            id: Some(id),
            title: req.title,
            states: req.states.into_iter().collect(),
            is_public: req.is_public,
        },
        &Viewer::Authenticated(session),
    )?;

    Ok(Json(saved))
}

/// Produce a shareable link, saving the map first if it has never been
/// saved. Anonymous callers are prompted to log in; an empty selection
/// has nothing to share.
pub async fn share(
    State(state): State<Arc<AppState>>,
    viewer: Viewer,
    Json(req): Json<ShareRequest>,
) -> Result<Json<ShareResponse>, ApiError> {
    if req.id.is_none() && req.states.is_empty() {
        return Err(ApiError::validation_field(
            "states",
            "Please select at least one state before sharing",
        ));
    }

    let session = viewer.session()?.clone();
    validate_save_request(&req.title, &req.states)?;

    let id = match req.id {
        Some(id) => {
            // Already saved: verify it is really the caller's map
            let (map, visibility) = resolve_id(&state.maps, &id, Some(&session.email))?;
            if visibility != Visibility::Editable {
                return Err(ApiError::forbidden("Only the owner can share a map"));
            }
            map.id
        }
        None => {
            let saved = state.maps.save(
                SaveMap {
                    id: None,
                    title: req.title,
                    states: req.states.into_iter().collect(),
                    is_public: req.is_public,
                },
                &Viewer::Authenticated(session),
            )?;
            saved.id
        }
    };

    let url = format!("{}/shared?mapId={}", state.config.server.public_url(), id);
    Ok(Json(ShareResponse { id, url }))
}

/// Payload for the read-only shared page: visited list sorted for
/// display, visit stats, and whether this viewer may edit.
pub async fn get_shared(
    State(state): State<Arc<AppState>>,
    viewer: Viewer,
    Path(id): Path<String>,
) -> Result<Json<SharedMapView>, ApiError> {
    let (map, visibility) = resolve_id(&state.maps, &id, viewer.email())?;

    let states: Vec<String> = map.states.iter().cloned().collect();
    let stats = visit_stats(states.len());

    Ok(Json(SharedMapView {
        id: map.id,
        title: map.title,
        owner_email: map.owner_email,
        states,
        is_public: map.is_public,
        editable: visibility == Visibility::Editable,
        stats,
        updated_at: map.updated_at,
    }))
}
