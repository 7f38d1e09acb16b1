//! Session tokens
//!
//! Opaque uuid tokens mapped to a [`Caller`] with an expiry. Sessions live in
//! memory; restarting the server logs everyone out.

use crate::auth::error::{AuthError, AuthResult};
use crate::auth::guard::Caller;
use crate::store::Clock;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// What a client gets back from login, registration or guest access
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub token: String,
    pub caller: Caller,
    /// Epoch milliseconds
    pub expires_at: i64,
}

#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    clock: Arc<dyn Clock>,
    ttl_millis: i64,
}

impl SessionStore {
    pub fn new(clock: Arc<dyn Clock>, ttl_millis: i64) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            clock,
            ttl_millis,
        }
    }

    /// Start a session, dropping any that have expired
    pub async fn issue(&self, caller: Caller) -> Session {
        let purged = self.purge_expired().await;
        if purged > 0 {
            tracing::debug!(purged, "Dropped expired sessions");
        }

        let session = Session {
            token: uuid::Uuid::new_v4().to_string(),
            caller,
            expires_at: self.clock.now_millis() + self.ttl_millis,
        };

        let mut sessions = self.sessions.write().await;
        sessions.insert(session.token.clone(), session.clone());
        session
    }

    /// Resolve a token to its caller. Expired sessions are dropped on sight.
    pub async fn resolve(&self, token: &str) -> AuthResult<Caller> {
        let now = self.clock.now_millis();
        {
            let sessions = self.sessions.read().await;
            match sessions.get(token) {
                Some(s) if s.expires_at > now => return Ok(s.caller.clone()),
                Some(_) => {}
                None => return Err(AuthError::Unauthenticated),
            }
        }

        self.sessions.write().await.remove(token);
        Err(AuthError::Unauthenticated)
    }

    pub async fn revoke(&self, token: &str) -> bool {
        self.sessions.write().await.remove(token).is_some()
    }

    /// Drop every expired session, returning how many were removed
    pub async fn purge_expired(&self) -> usize {
        let now = self.clock.now_millis();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| s.expires_at > now);
        before - sessions.len()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::UserId;
    use crate::store::FixedClock;

    #[tokio::test]
    async fn test_issue_and_resolve() {
        let clock = Arc::new(FixedClock::new(0));
        let store = SessionStore::new(clock, 1_000);

        let session = store.issue(Caller::user(UserId(1), "admin")).await;
        assert_eq!(session.expires_at, 1_000);

        let caller = store.resolve(&session.token).await.unwrap();
        assert_eq!(caller.name, "admin");
        assert!(!caller.is_guest);

        assert!(matches!(
            store.resolve("nope").await,
            Err(AuthError::Unauthenticated)
        ));
    }

    #[tokio::test]
    async fn test_expiry() {
        let clock = Arc::new(FixedClock::new(0));
        let store = SessionStore::new(clock.clone(), 1_000);

        let a = store.issue(Caller::guest("guest")).await;
        clock.set(500);
        let b = store.issue(Caller::guest("guest")).await;

        clock.set(1_000);
        assert!(store.resolve(&a.token).await.is_err());
        assert!(store.resolve(&b.token).await.is_ok());

        clock.set(2_000);
        assert_eq!(store.purge_expired().await, 1);
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_issue_drops_expired() {
        let clock = Arc::new(FixedClock::new(0));
        let store = SessionStore::new(clock.clone(), 1_000);

        store.issue(Caller::guest("guest")).await;
        store.issue(Caller::guest("guest")).await;
        clock.set(5_000);
        store.issue(Caller::guest("guest")).await;
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_revoke() {
        let store = SessionStore::new(Arc::new(FixedClock::new(0)), 1_000);
        let session = store.issue(Caller::guest("guest")).await;
        assert!(store.revoke(&session.token).await);
        assert!(!store.revoke(&session.token).await);
    }
}
