//! Session records.

use serde::{Deserialize, Serialize};

use super::{MapDocument, UserResponse};

/// An authenticated session: the identity `{user_id, email}` plus the
/// hash of its bearer token. Persisted so a restart does not log anyone
/// out; destroyed on logout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub token_hash: String,
    pub user_id: String,
    pub email: String,
    pub created_at: String,
}

/// Returned on every transition to Authenticated (login, register,
/// magic-link redemption): the bearer token, the identity, and a fresh
/// owned-maps listing.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserResponse,
    pub maps: Vec<MapDocument>,
}

/// Current-identity payload for an established session.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user: UserResponse,
    pub maps: Vec<MapDocument>,
}
