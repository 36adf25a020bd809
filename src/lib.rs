pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod geo;
pub mod maps;
pub mod model;
pub mod states;
pub mod store;

pub use error::{Error, Result};

use std::sync::Arc;

use auth::{MagicLinkIssuer, Sessions, UserDirectory};
use config::Config;
use geo::Boundaries;
use maps::{DraftStore, MapRepository};
use store::KvStore;

/// Shared application state for the file-store backend. Every component
/// works against the same store; the map collection is loaded once here
/// and lives for the process.
pub struct AppState {
    pub config: Config,
    pub store: Arc<KvStore>,
    pub users: UserDirectory,
    pub sessions: Sessions,
    pub magic: MagicLinkIssuer,
    pub maps: MapRepository,
    pub draft: DraftStore,
    pub boundaries: Boundaries,
}

impl AppState {
    pub fn new(config: Config, store: KvStore) -> Self {
        let store = Arc::new(store);
        let users = UserDirectory::new(store.clone());
        let sessions = Sessions::new(store.clone());
        let magic = MagicLinkIssuer::new(store.clone(), config.server.public_url());
        let maps = MapRepository::load(store.clone());
        let draft = DraftStore::new(store.clone());
        let boundaries = Boundaries::new(config.boundaries.url.clone());

        Self {
            config,
            store,
            users,
            sessions,
            magic,
            maps,
            draft,
            boundaries,
        }
    }
}
