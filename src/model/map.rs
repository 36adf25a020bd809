//! Map documents and their DTOs.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::states::VisitStats;

/// A saved travel map. Owned by exactly one user (the email is the
/// de-facto foreign key); never deleted, only overwritten.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapDocument {
    pub id: String,
    pub owner_id: String,
    pub owner_email: String,
    pub title: String,
    /// Visited state names. A set, serialized sorted.
    pub states: BTreeSet<String>,
    pub is_public: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// An edit heading for `MapRepository::save`: no id means a new document,
/// an id means overwrite-in-place.
#[derive(Debug, Clone)]
pub struct SaveMap {
    pub id: Option<String>,
    pub title: String,
    pub states: BTreeSet<String>,
    pub is_public: bool,
}

/// The in-progress selection, before or between saves. Mirrored to the
/// store so a restart does not lose unsaved clicks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Draft {
    pub title: String,
    pub states: BTreeSet<String>,
    pub is_public: bool,
}

/// Request body for creating or updating a map.
#[derive(Debug, Deserialize)]
pub struct SaveMapRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub states: Vec<String>,
    #[serde(default)]
    pub is_public: bool,
}

/// Request body for the share endpoint: an optional already-saved id plus
/// the current edit, so an unsaved map is saved on the way to its link.
#[derive(Debug, Deserialize)]
pub struct ShareRequest {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub states: Vec<String>,
    #[serde(default)]
    pub is_public: bool,
}

#[derive(Debug, Serialize)]
pub struct ShareResponse {
    pub id: String,
    pub url: String,
}

/// A map as returned to a viewer, with the resolved edit permission.
#[derive(Debug, Serialize)]
pub struct MapView {
    #[serde(flatten)]
    pub map: MapDocument,
    pub editable: bool,
}

/// The read-only shared page payload: the visited list sorted for
/// display, plus visit statistics.
#[derive(Debug, Serialize)]
pub struct SharedMapView {
    pub id: String,
    pub title: String,
    pub owner_email: String,
    pub states: Vec<String>,
    pub is_public: bool,
    pub editable: bool,
    pub stats: VisitStats,
    pub updated_at: String,
}
