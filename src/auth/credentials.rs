use super::AuthError;
use bcrypt::{hash, verify};
use secrecy::{ExposeSecret, SecretString};
use std::{collections::HashMap, fmt};
use tracing::{debug, warn};

/// In-memory username to bcrypt hash table.
#[derive(Clone, Default)]
pub struct Credentials {
    users: HashMap<String, String>,
}

impl Credentials {
    /// Hash `password` with the given bcrypt `cost` and store it under `username`,
    /// replacing any previous entry.
    ///
    /// # Errors
    /// Returns `AuthError::Hash` if bcrypt rejects the cost or fails to hash.
    pub fn insert(
        &mut self,
        username: &str,
        password: &SecretString,
        cost: u32,
    ) -> Result<(), AuthError> {
        let hashed = hash(password.expose_secret(), cost)?;
        self.users.insert(username.to_string(), hashed);
        debug!("registered user {username}");
        Ok(())
    }

    /// Returns true only when `username` exists and `password` matches its hash.
    ///
    /// This is CPU-bound; async callers should run it on a blocking thread.
    #[must_use]
    pub fn verify(&self, username: &str, password: &str) -> bool {
        let Some(hashed) = self.users.get(username) else {
            return false;
        };

        verify(password, hashed).unwrap_or_else(|err| {
            warn!("Failed to verify password hash: {err}");
            false
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.users.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("users", &self.users.len())
            .finish()
    }
}
