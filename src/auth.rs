//! Authentication: password hashing, practice flags, and sessions.
//!
//! Password hashing is an unsalted SHA-256 hex digest — deliberately weak,
//! faithful to the app this museum teaches about. Do not copy it anywhere
//! that matters.
//!
//! Sessions are server-side: an opaque UUID token handed to the browser in
//! a `sid` cookie, mapped in memory to the user ID with a TTL. Restarting
//! the process logs everyone out, which is fine for a single-process demo.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use sha2::{Digest, Sha256};
use thiserror::Error;
use uuid::Uuid;

/// Errors from session operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The configured session TTL cannot be represented.
    #[error("invalid session TTL: {minutes} minutes")]
    InvalidTtl {
        /// The offending TTL value.
        minutes: i64,
    },
}

/// Compute the stored hash for a password.
pub fn hash_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// Check a submitted password against a stored hash.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    hash_password(password) == stored_hash
}

/// Generate a unique practice flag for a new user.
///
/// Format: `FLAG{<username>_<32 hex chars>}`. The random part makes flags
/// unique per account so nobody can claim another visitor's flag.
pub fn generate_flag(username: &str) -> String {
    let random_part: [u8; 16] = rand::thread_rng().gen();
    format!("FLAG{{{username}_{}}}", hex::encode(random_part))
}

/// A live session entry.
#[derive(Debug, Clone)]
struct Session {
    user_id: i64,
    expires_at: DateTime<Utc>,
}

/// In-memory session table mapping opaque tokens to user IDs.
pub struct SessionStore {
    ttl: Duration,
    sessions: Mutex<HashMap<String, Session>>,
}

impl SessionStore {
    /// Create a session store with the given idle TTL in minutes.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidTtl`] if the TTL is zero or negative.
    pub fn new(ttl_minutes: i64) -> Result<Self, AuthError> {
        if ttl_minutes <= 0 {
            return Err(AuthError::InvalidTtl {
                minutes: ttl_minutes,
            });
        }
        Ok(Self {
            ttl: Duration::minutes(ttl_minutes),
            sessions: Mutex::new(HashMap::new()),
        })
    }

    /// Create a session for a user and return the opaque token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidTtl`] if the expiry timestamp overflows.
    pub fn create(&self, user_id: i64) -> Result<String, AuthError> {
        let expires_at = Utc::now()
            .checked_add_signed(self.ttl)
            .ok_or(AuthError::InvalidTtl {
                minutes: self.ttl.num_minutes(),
            })?;
        let token = Uuid::new_v4().to_string();
        let mut sessions = self.lock();
        sessions.insert(
            token.clone(),
            Session {
                user_id,
                expires_at,
            },
        );
        tracing::debug!(user_id, "session created");
        Ok(token)
    }

    /// Resolve a token to a user ID.
    ///
    /// Expired sessions are dropped on lookup and resolve to `None`.
    pub fn resolve(&self, token: &str) -> Option<i64> {
        let mut sessions = self.lock();
        match sessions.get(token) {
            Some(session) if session.expires_at > Utc::now() => Some(session.user_id),
            Some(_) => {
                sessions.remove(token);
                None
            }
            None => None,
        }
    }

    /// Revoke a session token. Revoking an unknown token is a no-op.
    pub fn revoke(&self, token: &str) {
        let mut sessions = self.lock();
        if sessions.remove(token).is_some() {
            tracing::debug!("session revoked");
        }
    }

    /// Number of live (non-expired) sessions.
    pub fn live_count(&self) -> usize {
        let now = Utc::now();
        let sessions = self.lock();
        sessions.values().filter(|s| s.expires_at > now).count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Session>> {
        // A poisoned lock only means another thread panicked mid-insert;
        // the map itself is still usable.
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
