//! The map-document repository.
//!
//! The full collection is loaded once at startup, held in memory for the
//! process lifetime, and written back wholesale after every save. There
//! is no delete operation and no incremental sync; a concurrent writer
//! outside this process simply wins or loses the whole file.

mod draft;
mod sharing;

pub use draft::DraftStore;
pub use sharing::{resolve, resolve_id, Visibility};

use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::auth::Viewer;
use crate::error::{Error, Result};
use crate::model::{MapDocument, SaveMap};
use crate::states;
use crate::store::{keys, KvStore};

/// Title applied when a map is saved without one.
const DEFAULT_TITLE: &str = "My Travel Map";

pub struct MapRepository {
    store: Arc<KvStore>,
    maps: RwLock<Vec<MapDocument>>,
}

impl MapRepository {
    /// Load the collection from the store.
    pub fn load(store: Arc<KvStore>) -> Self {
        let maps: Vec<MapDocument> = store.get_as(keys::MAPS).unwrap_or_default();
        Self {
            store,
            maps: RwLock::new(maps),
        }
    }

    /// Raw lookup by id. Visibility is the sharing resolver's business.
    pub fn find_by_id(&self, id: &str) -> Option<MapDocument> {
        self.maps.read().iter().find(|m| m.id == id).cloned()
    }

    /// Maps owned by `email`, most recently updated first.
    pub fn list_owned_by(&self, email: &str) -> Vec<MapDocument> {
        let mut owned: Vec<MapDocument> = self
            .maps
            .read()
            .iter()
            .filter(|m| m.owner_email == email)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        owned
    }

    /// Save an edit. Requires an authenticated viewer. A new edit gets a
    /// random id and is appended; an existing id is overwritten in place
    /// with a refreshed `updated_at`. The whole collection is persisted
    /// afterwards.
    pub fn save(&self, edit: SaveMap, viewer: &Viewer) -> Result<MapDocument> {
        let session = viewer.session()?;

        if let Some(name) = edit.states.iter().find(|s| !states::is_state(s)) {
            return Err(Error::UnknownState(name.clone()));
        }

        let title = if edit.title.trim().is_empty() {
            DEFAULT_TITLE.to_string()
        } else {
            edit.title
        };
        let now = Utc::now().to_rfc3339();

        let mut maps = self.maps.write();
        let saved = match edit.id {
            Some(id) => {
                let doc = maps
                    .iter_mut()
                    .find(|m| m.id == id)
                    .ok_or(Error::MapNotFoundOrPrivate)?;
                doc.title = title;
                doc.states = edit.states;
                doc.is_public = edit.is_public;
                doc.updated_at = now;
                doc.clone()
            }
            None => {
                let doc = MapDocument {
                    id: Uuid::new_v4().to_string(),
                    owner_id: session.user_id.clone(),
                    owner_email: session.email.clone(),
                    title,
                    states: edit.states,
                    is_public: edit.is_public,
                    created_at: now.clone(),
                    updated_at: now,
                };
                maps.push(doc.clone());
                doc
            }
        };

        self.store.set(keys::MAPS, &*maps)?;
        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{MagicLinkIssuer, Sessions, UserDirectory};
    use std::collections::BTreeSet;

    struct Fixture {
        _dir: tempfile::TempDir,
        store: Arc<KvStore>,
        users: UserDirectory,
        sessions: Sessions,
        repo: MapRepository,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(KvStore::open(dir.path().join("store.json")).unwrap());
        Fixture {
            _dir: dir,
            users: UserDirectory::new(store.clone()),
            sessions: Sessions::new(store.clone()),
            repo: MapRepository::load(store.clone()),
            store,
        }
    }

    fn login(fx: &Fixture, email: &str) -> Viewer {
        let user = fx.users.register(email, "pw").unwrap();
        let (session, _token) = fx.sessions.create(&user).unwrap();
        Viewer::Authenticated(session)
    }

    fn states_of(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn edit(id: Option<&str>, title: &str, names: &[&str], is_public: bool) -> SaveMap {
        SaveMap {
            id: id.map(String::from),
            title: title.to_string(),
            states: states_of(names),
            is_public,
        }
    }

    #[test]
    fn test_save_requires_authentication() {
        let fx = fixture();
        let err = fx
            .repo
            .save(edit(None, "Trip", &["Texas"], false), &Viewer::Anonymous)
            .unwrap_err();
        assert!(matches!(err, Error::NotAuthenticated));
    }

    #[test]
    fn test_save_new_allocates_id_and_appends() {
        let fx = fixture();
        let viewer = login(&fx, "a@x.com");

        let saved = fx
            .repo
            .save(edit(None, "Trip", &["California", "Texas"], true), &viewer)
            .unwrap();
        assert!(!saved.id.is_empty());
        assert_eq!(saved.owner_email, "a@x.com");
        assert_eq!(saved.created_at, saved.updated_at);

        // Round-trip: find_by_id returns an equal document
        let found = fx.repo.find_by_id(&saved.id).unwrap();
        assert_eq!(found.title, saved.title);
        assert_eq!(found.states, saved.states);
        assert_eq!(found.is_public, saved.is_public);
        assert_eq!(found.updated_at, saved.updated_at);
    }

    #[test]
    fn test_save_existing_overwrites_in_place() {
        let fx = fixture();
        let viewer = login(&fx, "a@x.com");

        let first = fx
            .repo
            .save(edit(None, "Trip", &["Texas"], false), &viewer)
            .unwrap();
        let second = fx
            .repo
            .save(
                edit(Some(&first.id), "Big Trip", &["Texas", "Utah"], true),
                &viewer,
            )
            .unwrap();

        assert_eq!(second.id, first.id);
        assert_eq!(second.created_at, first.created_at);
        assert_eq!(second.title, "Big Trip");
        assert!(second.is_public);

        // Still one document
        assert_eq!(fx.repo.list_owned_by("a@x.com").len(), 1);
    }

    #[test]
    fn test_resave_without_edits_only_advances_updated_at() {
        let fx = fixture();
        let viewer = login(&fx, "a@x.com");

        let first = fx
            .repo
            .save(edit(None, "Trip", &["Texas"], false), &viewer)
            .unwrap();
        let again = fx
            .repo
            .save(edit(Some(&first.id), "Trip", &["Texas"], false), &viewer)
            .unwrap();

        assert_eq!(again.title, first.title);
        assert_eq!(again.states, first.states);
        assert_eq!(again.is_public, first.is_public);
        assert!(again.updated_at >= first.updated_at);
    }

    #[test]
    fn test_save_rejects_unknown_state() {
        let fx = fixture();
        let viewer = login(&fx, "a@x.com");

        let err = fx
            .repo
            .save(edit(None, "Trip", &["Atlantis"], false), &viewer)
            .unwrap_err();
        assert!(matches!(err, Error::UnknownState(name) if name == "Atlantis"));
    }

    #[test]
    fn test_save_unknown_id_fails() {
        let fx = fixture();
        let viewer = login(&fx, "a@x.com");

        let err = fx
            .repo
            .save(edit(Some("missing"), "Trip", &["Texas"], false), &viewer)
            .unwrap_err();
        assert!(matches!(err, Error::MapNotFoundOrPrivate));
    }

    #[test]
    fn test_empty_title_gets_default() {
        let fx = fixture();
        let viewer = login(&fx, "a@x.com");

        let saved = fx
            .repo
            .save(edit(None, "  ", &["Texas"], false), &viewer)
            .unwrap();
        assert_eq!(saved.title, DEFAULT_TITLE);
    }

    #[test]
    fn test_list_owned_by_sorts_updated_desc() {
        let fx = fixture();
        let viewer = login(&fx, "a@x.com");

        let first = fx
            .repo
            .save(edit(None, "First", &["Texas"], false), &viewer)
            .unwrap();
        let _second = fx
            .repo
            .save(edit(None, "Second", &["Utah"], false), &viewer)
            .unwrap();
        // Touch the first map so it becomes the most recent
        fx.repo
            .save(edit(Some(&first.id), "First", &["Texas"], false), &viewer)
            .unwrap();

        let owned = fx.repo.list_owned_by("a@x.com");
        assert_eq!(owned.len(), 2);
        assert_eq!(owned[0].title, "First");
        assert_eq!(owned[1].title, "Second");

        assert!(fx.repo.list_owned_by("other@x.com").is_empty());
    }

    #[test]
    fn test_collection_survives_reload() {
        let fx = fixture();
        let viewer = login(&fx, "a@x.com");
        let saved = fx
            .repo
            .save(edit(None, "Trip", &["Texas"], true), &viewer)
            .unwrap();

        // A fresh repository over the same store sees the saved map
        let reloaded = MapRepository::load(fx.store.clone());
        let found = reloaded.find_by_id(&saved.id).unwrap();
        assert_eq!(found.title, "Trip");
    }

    // The full share flow: an anonymous visitor selects states, is turned
    // away at save time, logs in via magic link, saves, and the resulting
    // map renders read-only for everyone else.
    #[test]
    fn test_share_flow_end_to_end() {
        let fx = fixture();
        let magic = MagicLinkIssuer::new(fx.store.clone(), "http://localhost:3000");
        let draft = DraftStore::new(fx.store.clone());

        draft.toggle("California").unwrap();
        draft.toggle("Texas").unwrap();

        let pending = draft.get();
        let attempt = fx.repo.save(
            SaveMap {
                id: None,
                title: pending.title.clone(),
                states: pending.states.clone(),
                is_public: true,
            },
            &Viewer::Anonymous,
        );
        assert!(matches!(attempt.unwrap_err(), Error::NotAuthenticated));

        // Log in through a magic link, then the save goes through
        let link = magic.issue("a@x.com").unwrap();
        let token = link.split("token=").nth(1).unwrap();
        let user = magic.redeem(token).unwrap().unwrap();
        let (session, _) = fx.sessions.create(&user).unwrap();
        let viewer = Viewer::Authenticated(session);

        let saved = fx
            .repo
            .save(
                SaveMap {
                    id: None,
                    title: pending.title,
                    states: pending.states,
                    is_public: true,
                },
                &viewer,
            )
            .unwrap();

        // A different anonymous viewer sees both states, read-only
        let (map, visibility) = resolve_id(&fx.repo, &saved.id, None).unwrap();
        assert_eq!(visibility, Visibility::ReadOnly);
        assert!(map.states.contains("California"));
        assert!(map.states.contains("Texas"));
    }
}
