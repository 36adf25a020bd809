//! Magic-link issuance and redemption.
//!
//! A magic link is a URL embedding a single-use login token. Issuing one
//! finds or creates the account and overwrites any prior unredeemed
//! token; redemption clears the token before returning the user, so a
//! link works exactly once.

use std::sync::Arc;

use chrono::Utc;
use subtle::ConstantTimeEq;
use tracing::info;
use uuid::Uuid;

use crate::error::Result;
use crate::model::User;
use crate::store::{keys, KvStore};

#[derive(Clone)]
pub struct MagicLinkIssuer {
    store: Arc<KvStore>,
    base_url: String,
}

impl MagicLinkIssuer {
    pub fn new(store: Arc<KvStore>, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { store, base_url }
    }

    /// Issue a fresh login link for `email`, creating the account if it
    /// does not exist yet. Any earlier unredeemed token for the account
    /// stops working.
    pub fn issue(&self, email: &str) -> Result<String> {
        let email = email.trim().to_string();
        let token = Uuid::new_v4().to_string();

        self.store.update(keys::USERS, {
            let token = token.clone();
            move |users: &mut Vec<User>| match users.iter_mut().find(|u| u.email == email) {
                Some(user) => {
                    user.login_token = Some(token);
                }
                None => {
                    info!(%email, "Creating account for first magic-link request");
                    users.push(User {
                        id: Uuid::new_v4().to_string(),
                        email,
                        password: None,
                        login_token: Some(token),
                        created_at: Utc::now().to_rfc3339(),
                    });
                }
            }
        })?;

        Ok(format!("{}/login?token={}", self.base_url, token))
    }

    /// Redeem a login token. The token is cleared and persisted before
    /// the user is returned; the read-modify-write runs under the store's
    /// write lock, so no second redemption can race it.
    pub fn redeem(&self, token: &str) -> Result<Option<User>> {
        self.store.update(keys::USERS, |users: &mut Vec<User>| {
            let user = users.iter_mut().find(|u| {
                u.login_token.as_ref().is_some_and(|t| {
                    t.len() == token.len() && bool::from(t.as_bytes().ct_eq(token.as_bytes()))
                })
            })?;
            user.login_token = None;
            Some(user.clone())
        })
    }
}
