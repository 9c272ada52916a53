//! Chat accounts: registration rules, argon2 password hashes and the
//! storage seam behind them

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use argon2::password_hash::{
    rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::Argon2;
use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

pub const USERNAME_MIN_CHARS: usize = 3;
pub const USERNAME_MAX_CHARS: usize = 30;
pub const PASSWORD_MIN_CHARS: usize = 4;
pub const PASSWORD_MAX_CHARS: usize = 100;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("Invalid username: {0}")]
    InvalidUsername(String),

    #[error("Invalid password: {0}")]
    InvalidPassword(String),

    #[error("Username already taken: {0}")]
    AlreadyExists(String),

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("User storage error: {0}")]
    Storage(String),
}

/// Account storage; keeps password hashes only
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new account. Fails with `AlreadyExists` when taken.
    async fn insert(&self, username: &str, password_hash: String) -> Result<(), UserError>;

    /// Stored hash for `username`, if the account exists
    async fn password_hash(&self, username: &str) -> Result<Option<String>, UserError>;
}

/// Process-local accounts, lost on restart
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: Mutex<HashMap<String, String>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.users.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn insert(&self, username: &str, password_hash: String) -> Result<(), UserError> {
        let mut users = self.lock();
        if users.contains_key(username) {
            return Err(UserError::AlreadyExists(username.to_string()));
        }
        users.insert(username.to_string(), password_hash);
        Ok(())
    }

    async fn password_hash(&self, username: &str) -> Result<Option<String>, UserError> {
        Ok(self.lock().get(username).cloned())
    }
}

/// Usernames are 3-30 ASCII letters, digits or underscores; passwords 4-100 chars
pub fn validate_registration(username: &str, password: &str) -> Result<(), UserError> {
    let length = username.chars().count();
    if !(USERNAME_MIN_CHARS..=USERNAME_MAX_CHARS).contains(&length) {
        return Err(UserError::InvalidUsername(format!(
            "must be {}-{} characters",
            USERNAME_MIN_CHARS, USERNAME_MAX_CHARS
        )));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(UserError::InvalidUsername(
            "only letters, digits and underscores are allowed".into(),
        ));
    }

    let length = password.chars().count();
    if !(PASSWORD_MIN_CHARS..=PASSWORD_MAX_CHARS).contains(&length) {
        return Err(UserError::InvalidPassword(format!(
            "must be {}-{} characters",
            PASSWORD_MIN_CHARS, PASSWORD_MAX_CHARS
        )));
    }

    Ok(())
}

/// Argon2id PHC string with a random salt
pub fn hash_password(password: &str) -> Result<String, UserError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| UserError::Hashing(e.to_string()))
}

/// False for a wrong password and for an unparseable hash
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            warn!("Stored password hash is malformed: {}", e);
            false
        }
    }
}

/// Validate, hash and store a new account
pub async fn register(
    store: &dyn UserStore,
    username: &str,
    password: &str,
) -> Result<(), UserError> {
    validate_registration(username, password)?;

    if store.password_hash(username).await?.is_some() {
        return Err(UserError::AlreadyExists(username.to_string()));
    }

    let password = password.to_string();
    let hash = run_blocking(move || hash_password(&password)).await??;

    // insert re-checks, so a concurrent registration still gets AlreadyExists
    store.insert(username, hash).await?;
    debug!(username, "Registered user");
    Ok(())
}

/// Check credentials. Unknown users and wrong passwords are indistinguishable.
pub async fn authenticate(
    store: &dyn UserStore,
    username: &str,
    password: &str,
) -> Result<(), UserError> {
    let Some(hash) = store.password_hash(username).await? else {
        return Err(UserError::InvalidCredentials);
    };

    let password = password.to_string();
    if run_blocking(move || verify_password(&password, &hash)).await? {
        Ok(())
    } else {
        Err(UserError::InvalidCredentials)
    }
}

async fn run_blocking<T, F>(f: F) -> Result<T, UserError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| UserError::Hashing(e.to_string()))
}
