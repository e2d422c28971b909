use std::sync::Arc;

use axum::extract::FromRef;
use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    auth::{
        password::{PasswordError, PasswordHasher},
        repo::UserRepo,
        repo_types::User,
    },
    error::StoreError,
    state::AppState,
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("email already registered")]
    DuplicateEmail,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Sole owner of password hashes: registration and login go through here.
#[derive(Clone)]
pub struct CredentialStore {
    users: Arc<dyn UserRepo>,
    hasher: PasswordHasher,
}

impl FromRef<AppState> for CredentialStore {
    fn from_ref(state: &AppState) -> Self {
        Self::new(state.users.clone(), state.hasher.clone())
    }
}

impl CredentialStore {
    pub fn new(users: Arc<dyn UserRepo>, hasher: PasswordHasher) -> Self {
        Self { users, hasher }
    }

    pub async fn register(&self, email: &str, name: &str, password: &str) -> Result<User, CredentialError> {
        let email = normalize_email(email);

        if self.users.find_by_email(&email).await?.is_some() {
            warn!(email = %email, "email already registered");
            return Err(CredentialError::DuplicateEmail);
        }

        let hash = self.hasher.hash(password)?;

        // The unique index settles races the pre-check above cannot see.
        let user = match self.users.create(&email, name.trim(), &hash).await {
            Ok(u) => u,
            Err(StoreError::UniqueViolation(constraint)) => {
                warn!(email = %email, %constraint, "email taken concurrently");
                return Err(CredentialError::DuplicateEmail);
            }
            Err(e) => return Err(e.into()),
        };

        info!(user_id = user.id, email = %user.email, "user registered");
        Ok(user)
    }

    /// Unknown email and wrong password are indistinguishable to the caller.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User, CredentialError> {
        let email = normalize_email(email);

        let Some(user) = self.users.find_by_email(&email).await? else {
            self.hasher.verify_decoy(password)?;
            warn!(email = %email, "login unknown email");
            return Err(CredentialError::InvalidCredentials);
        };

        if !self.hasher.verify(password, &user.password_hash)? {
            warn!(user_id = user.id, "login invalid password");
            return Err(CredentialError::InvalidCredentials);
        }

        info!(user_id = user.id, "user logged in");
        Ok(user)
    }

    pub async fn find_user(&self, id: i64) -> Result<Option<User>, CredentialError> {
        Ok(self.users.find_by_id(id).await?)
    }
}
