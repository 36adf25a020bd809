//! Visibility resolution for shared maps.

use serde::Serialize;

use crate::error::{Error, Result};
use crate::model::MapDocument;

use super::MapRepository;

/// What a viewer may do with a map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    /// The owner: full control, whether or not the map is public.
    Editable,
    /// A public map for anyone who is not the owner, anonymous included.
    /// Mutating controls must be disabled and click handlers detached.
    ReadOnly,
    /// Private and not the owner. Indistinguishable from a missing map.
    Denied,
}

/// Resolve what a viewer (by email, `None` when anonymous) may do with
/// `map`.
pub fn resolve(map: &MapDocument, viewer_email: Option<&str>) -> Visibility {
    match viewer_email {
        Some(email) if email == map.owner_email => Visibility::Editable,
        _ if map.is_public => Visibility::ReadOnly,
        _ => Visibility::Denied,
    }
}

/// Look up `id` and resolve it in one step, folding Denied and absent
/// into the same error so private maps cannot be probed for existence.
pub fn resolve_id(
    repo: &MapRepository,
    id: &str,
    viewer_email: Option<&str>,
) -> Result<(MapDocument, Visibility)> {
    let map = repo.find_by_id(id).ok_or(Error::MapNotFoundOrPrivate)?;
    match resolve(&map, viewer_email) {
        Visibility::Denied => Err(Error::MapNotFoundOrPrivate),
        visibility => Ok((map, visibility)),
    }
}
