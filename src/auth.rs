//! Admin session management.
//!
//! A single admin password is stored as a SHA-256 hex digest in the
//! settings table. Logging in with the right password mints an opaque
//! session token, valid for 24 hours. The guard keeps tokens in memory,
//! so restarting the server logs everyone out.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::db::Database;

/// Settings key holding the admin password digest.
pub const PASSWORD_HASH_KEY: &str = "admin_password_hash";

const SESSION_TTL_HOURS: i64 = 24;

/// Time source, swappable so expiry is testable.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid password")]
    InvalidPassword,
    #[error("No admin password configured")]
    NotConfigured,
    #[error(transparent)]
    Database(#[from] anyhow::Error),
}

/// Hex-encoded SHA-256 of a password.
pub fn hash_password(password: &str) -> String {
    let digest = Sha256::digest(password.as_bytes());
    format!("{:x}", digest)
}

/// In-memory session store backed by the settings table for the
/// password digest.
#[derive(Clone)]
pub struct SessionGuard {
    db: Database,
    clock: Arc<dyn Clock>,
    sessions: Arc<Mutex<HashMap<String, DateTime<Utc>>>>,
}

impl SessionGuard {
    pub fn new(db: Database) -> Self {
        Self::with_clock(db, Arc::new(SystemClock))
    }

    pub fn with_clock(db: Database, clock: Arc<dyn Clock>) -> Self {
        Self {
            db,
            clock,
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Store (or replace) the admin password digest.
    pub fn set_password(&self, password: &str) -> Result<(), AuthError> {
        self.db.set_setting(PASSWORD_HASH_KEY, &hash_password(password))?;
        Ok(())
    }

    /// Verify the password and mint a session token.
    pub fn login(&self, password: &str) -> Result<String, AuthError> {
        let stored = self
            .db
            .get_setting(PASSWORD_HASH_KEY)?
            .ok_or(AuthError::NotConfigured)?;

        if hash_password(password) != stored {
            tracing::warn!("rejected login attempt");
            return Err(AuthError::InvalidPassword);
        }

        let token = Uuid::new_v4().to_string();
        let expires_at = self.clock.now() + Duration::hours(SESSION_TTL_HOURS);
        self.sessions
            .lock()
            .unwrap()
            .insert(token.clone(), expires_at);
        Ok(token)
    }

    /// Check a token, dropping it if expired.
    pub fn authenticated(&self, token: &str) -> bool {
        let mut sessions = self.sessions.lock().unwrap();
        match sessions.get(token) {
            Some(expires_at) if *expires_at > self.clock.now() => true,
            Some(_) => {
                sessions.remove(token);
                false
            }
            None => false,
        }
    }

    /// Invalidate a token. Unknown tokens are a no-op.
    pub fn logout(&self, token: &str) {
        self.sessions.lock().unwrap().remove(token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedClock(Mutex<DateTime<Utc>>);

    impl FixedClock {
        fn new() -> Arc<Self> {
            Arc::new(Self(Mutex::new(Utc::now())))
        }

        fn advance(&self, hours: i64) {
            let mut now = self.0.lock().unwrap();
            *now += Duration::hours(hours);
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            *self.0.lock().unwrap()
        }
    }

    fn guard_with_clock() -> (SessionGuard, Arc<FixedClock>) {
        let db = Database::open_memory().unwrap();
        db.migrate().unwrap();
        let clock = FixedClock::new();
        let guard = SessionGuard::with_clock(db, clock.clone());
        guard.set_password("hunter2").unwrap();
        (guard, clock)
    }

    #[test]
    fn login_with_correct_password_yields_valid_token() {
        let (guard, _) = guard_with_clock();
        let token = guard.login("hunter2").unwrap();
        assert!(guard.authenticated(&token));
    }

    #[test]
    fn login_with_wrong_password_fails() {
        let (guard, _) = guard_with_clock();
        assert!(matches!(
            guard.login("wrong"),
            Err(AuthError::InvalidPassword)
        ));
    }

    #[test]
    fn login_without_configured_password_fails() {
        let db = Database::open_memory().unwrap();
        db.migrate().unwrap();
        let guard = SessionGuard::new(db);
        assert!(matches!(guard.login("any"), Err(AuthError::NotConfigured)));
    }

    #[test]
    fn tokens_expire_after_24_hours() {
        let (guard, clock) = guard_with_clock();
        let token = guard.login("hunter2").unwrap();
        assert!(guard.authenticated(&token));

        clock.advance(23);
        assert!(guard.authenticated(&token));

        clock.advance(2);
        assert!(!guard.authenticated(&token));
    }

    #[test]
    fn logout_invalidates_token() {
        let (guard, _) = guard_with_clock();
        let token = guard.login("hunter2").unwrap();
        guard.logout(&token);
        assert!(!guard.authenticated(&token));
    }

    #[test]
    fn unknown_token_is_rejected() {
        let (guard, _) = guard_with_clock();
        assert!(!guard.authenticated("not-a-token"));
    }

    #[test]
    fn hash_is_stable_hex_sha256() {
        assert_eq!(
            hash_password("hunter2"),
            "f52fbd32b2b3b86ff88ef6c490628285f482af15ddcb29541f94bcf526a3f6c7"
        );
    }
}
