//! Session tracking.
//!
//! A viewer is either Anonymous or Authenticated. Authenticated sessions
//! are created on login, registration, or magic-link redemption, keyed by
//! the SHA-256 of a random bearer token, and persisted through the store
//! so a restart does not log anyone out. Logout destroys the persisted
//! record.

use std::sync::Arc;

use chrono::Utc;
use rand::Rng;
use sha2::{Digest, Sha256};
use tracing::info;

use crate::error::{Error, Result};
use crate::model::{Session, User};
use crate::store::{keys, KvStore};

use super::MagicLinkIssuer;

/// Generate a random bearer token.
fn generate_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();
    hex::encode(bytes)
}

/// Hash a token for storage.
fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// The identity attached to a request.
#[derive(Debug, Clone)]
pub enum Viewer {
    Anonymous,
    Authenticated(Session),
}

impl Viewer {
    pub fn email(&self) -> Option<&str> {
        match self {
            Viewer::Anonymous => None,
            Viewer::Authenticated(session) => Some(&session.email),
        }
    }

    /// The session, or `NotAuthenticated`; the caller should prompt for
    /// login.
    pub fn session(&self) -> Result<&Session> {
        match self {
            Viewer::Anonymous => Err(Error::NotAuthenticated),
            Viewer::Authenticated(session) => Ok(session),
        }
    }
}

/// Outcome of the arrival transition.
#[derive(Debug)]
pub enum Arrival {
    /// A URL login token was redeemed; a fresh session and its bearer
    /// token were created.
    Redeemed { session: Session, token: String },
    /// A persisted session matched the stored token.
    Resumed(Session),
    Anonymous,
}

#[derive(Clone)]
pub struct Sessions {
    store: Arc<KvStore>,
}

impl Sessions {
    pub fn new(store: Arc<KvStore>) -> Self {
        Self { store }
    }

    /// Create and persist a session for `user`, returning it together
    /// with the raw bearer token (stored only as a hash).
    pub fn create(&self, user: &User) -> Result<(Session, String)> {
        let token = generate_token();
        let session = Session {
            token_hash: hash_token(&token),
            user_id: user.id.clone(),
            email: user.email.clone(),
            created_at: Utc::now().to_rfc3339(),
        };

        self.store.update(keys::SESSIONS, {
            let session = session.clone();
            move |sessions: &mut Vec<Session>| sessions.push(session)
        })?;

        info!(email = %session.email, "Session created");
        Ok((session, token))
    }

    /// Resolve a bearer token to its persisted session.
    pub fn resolve(&self, token: &str) -> Option<Session> {
        let hash = hash_token(token);
        self.store
            .get_as::<Vec<Session>>(keys::SESSIONS)
            .unwrap_or_default()
            .into_iter()
            .find(|s| s.token_hash == hash)
    }

    /// Destroy the session behind `token`. Unknown tokens are a no-op.
    pub fn destroy(&self, token: &str) -> Result<()> {
        let hash = hash_token(token);
        self.store.update(keys::SESSIONS, |sessions: &mut Vec<Session>| {
            sessions.retain(|s| s.token_hash != hash);
        })
    }

    /// The arrival transition: a URL login token wins and is consumed; a
    /// stored session token resumes; otherwise the viewer stays
    /// anonymous. An invalid URL token falls through rather than
    /// erroring; the address bar is stripped either way.
    pub fn arrive(
        &self,
        url_token: Option<&str>,
        stored_token: Option<&str>,
        magic: &MagicLinkIssuer,
    ) -> Result<Arrival> {
        if let Some(token) = url_token {
            if let Some(user) = magic.redeem(token)? {
                let (session, token) = self.create(&user)?;
                return Ok(Arrival::Redeemed { session, token });
            }
        }

        if let Some(token) = stored_token {
            if let Some(session) = self.resolve(token) {
                return Ok(Arrival::Resumed(session));
            }
        }

        Ok(Arrival::Anonymous)
    }
}
