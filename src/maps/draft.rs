//! The in-progress map selection.
//!
//! Clicking a state toggles its membership in the draft. The draft is
//! mirrored to three store keys so unsaved clicks survive a restart, and
//! cleared piecewise: reset touches only the selection, matching the
//! reset control.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::model::Draft;
use crate::states;
use crate::store::{keys, KvStore};

#[derive(Clone)]
pub struct DraftStore {
    store: Arc<KvStore>,
}

impl DraftStore {
    pub fn new(store: Arc<KvStore>) -> Self {
        Self { store }
    }

    /// The current draft; absent keys read as an empty draft.
    pub fn get(&self) -> Draft {
        Draft {
            title: self.store.get_as(keys::DRAFT_TITLE).unwrap_or_default(),
            states: self.store.get_as(keys::DRAFT_STATES).unwrap_or_default(),
            is_public: self
                .store
                .get_as(keys::DRAFT_IS_PUBLIC)
                .unwrap_or_default(),
        }
    }

    /// Replace the whole draft.
    pub fn put(&self, draft: &Draft) -> Result<()> {
        if let Some(name) = draft.states.iter().find(|s| !states::is_state(s)) {
            return Err(Error::UnknownState(name.clone()));
        }
        self.store.set(keys::DRAFT_TITLE, &draft.title)?;
        self.store.set(keys::DRAFT_STATES, &draft.states)?;
        self.store.set(keys::DRAFT_IS_PUBLIC, &draft.is_public)?;
        Ok(())
    }

    /// Toggle membership of `state` in the selection and persist it.
    pub fn toggle(&self, state: &str) -> Result<Draft> {
        if !states::is_state(state) {
            return Err(Error::UnknownState(state.to_string()));
        }

        let mut draft = self.get();
        if !draft.states.remove(state) {
            draft.states.insert(state.to_string());
        }
        self.store.set(keys::DRAFT_STATES, &draft.states)?;
        Ok(draft)
    }

    /// Clear the selection. Title and visibility are kept.
    pub fn reset(&self) -> Result<Draft> {
        self.store
            .set(keys::DRAFT_STATES, &BTreeSet::<String>::new())?;
        Ok(self.get())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft_store() -> (tempfile::TempDir, DraftStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(KvStore::open(dir.path().join("store.json")).unwrap());
        (dir, DraftStore::new(store))
    }

    #[test]
    fn test_toggle_flips_membership() {
        let (_dir, draft) = draft_store();

        let after = draft.toggle("Texas").unwrap();
        assert!(after.states.contains("Texas"));

        let after = draft.toggle("Texas").unwrap();
        assert!(!after.states.contains("Texas"));
    }

    // Membership after any toggle sequence equals "odd number of toggles"
    // starting from the empty set.
    #[test]
    fn test_toggle_parity() {
        let (_dir, draft) = draft_store();
        let clicks = [
            "California",
            "Texas",
            "California",
            "Utah",
            "Texas",
            "Texas",
        ];
        for state in clicks {
            draft.toggle(state).unwrap();
        }

        let final_states = draft.get().states;
        for state in ["California", "Texas", "Utah"] {
            let toggles = clicks.iter().filter(|&&c| c == state).count();
            assert_eq!(
                final_states.contains(state),
                toggles % 2 == 1,
                "{state} toggled {toggles} times"
            );
        }
    }

    #[test]
    fn test_toggle_rejects_unknown_state() {
        let (_dir, draft) = draft_store();
        assert!(matches!(
            draft.toggle("Narnia").unwrap_err(),
            Error::UnknownState(_)
        ));
    }

    #[test]
    fn test_put_and_reset() {
        let (_dir, draft) = draft_store();
        let mut wanted = Draft {
            title: "Summer".to_string(),
            states: BTreeSet::new(),
            is_public: true,
        };
        wanted.states.insert("Maine".to_string());
        draft.put(&wanted).unwrap();
        assert_eq!(draft.get(), wanted);

        let after = draft.reset().unwrap();
        assert!(after.states.is_empty());
        // Reset clears only the selection
        assert_eq!(after.title, "Summer");
        assert!(after.is_public);
    }

    #[test]
    fn test_draft_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        let draft = DraftStore::new(Arc::new(KvStore::open(&path).unwrap()));
        draft.toggle("Ohio").unwrap();
        drop(draft);

        let reopened = DraftStore::new(Arc::new(KvStore::open(&path).unwrap()));
        assert!(reopened.get().states.contains("Ohio"));
    }
}
