//! Domain errors shared across the store-backed core.

use thiserror::Error;

/// Errors surfaced by the core components.
///
/// Malformed persisted data rarely appears here: the store treats an
/// unreadable value as absent and logs a warning, so `MalformedData` only
/// shows up where a decode failure has to be reported to the caller.
#[derive(Error, Debug)]
pub enum Error {
    #[error("An account with this email already exists")]
    DuplicateEmail,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("You must be logged in to do that")]
    NotAuthenticated,

    #[error("Map not found or is private")]
    MapNotFoundOrPrivate,

    #[error("Unknown state name: {0}")]
    UnknownState(String),

    #[error("Failed to fetch boundary data: {0}")]
    BoundaryFetch(String),

    #[error("Persisted data was malformed: {0}")]
    MalformedData(#[from] serde_json::Error),

    #[error("Store I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
