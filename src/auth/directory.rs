//! The user directory.
//!
//! All user records live under one store key as a full list; every
//! mutation reads the list, changes it in memory, and writes it back.
//! Acceptable because the dataset is small and there is one writer.

use std::sync::Arc;

use chrono::Utc;
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::model::User;
use crate::store::{keys, KvStore};

#[derive(Clone)]
pub struct UserDirectory {
    store: Arc<KvStore>,
}

impl UserDirectory {
    pub fn new(store: Arc<KvStore>) -> Self {
        Self { store }
    }

    fn all(&self) -> Vec<User> {
        self.store.get_as(keys::USERS).unwrap_or_default()
    }

    /// Create an account. Emails are trimmed of surrounding whitespace;
    /// matching is exact and case-sensitive after that.
    pub fn register(&self, email: &str, password: &str) -> Result<User> {
        let email = email.trim().to_string();
        let password = password.to_string();

        self.store.update(keys::USERS, move |users: &mut Vec<User>| {
            if users.iter().any(|u| u.email == email) {
                return Err(Error::DuplicateEmail);
            }

            let user = User {
                id: Uuid::new_v4().to_string(),
                email,
                password: Some(password),
                login_token: None,
                created_at: Utc::now().to_rfc3339(),
            };
            users.push(user.clone());
            Ok(user)
        })?
    }

    pub fn find_by_email(&self, email: &str) -> Option<User> {
        let email = email.trim();
        self.all().into_iter().find(|u| u.email == email)
    }

    /// Look up a user by outstanding login token, comparing in constant
    /// time since the token is a bearer credential.
    pub fn find_by_token(&self, token: &str) -> Option<User> {
        self.all().into_iter().find(|u| {
            u.login_token.as_ref().is_some_and(|t| {
                t.len() == token.len() && bool::from(t.as_bytes().ct_eq(token.as_bytes()))
            })
        })
    }

    /// Check an email/password pair. Passwords are compared as-is; an
    /// account without a password (magic-link only) never matches.
    pub fn verify_credentials(&self, email: &str, password: &str) -> Result<User> {
        self.find_by_email(email)
            .filter(|u| u.password.as_deref() == Some(password))
            .ok_or(Error::InvalidCredentials)
    }
}
