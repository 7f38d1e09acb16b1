//! User accounts: registration, login, guest access, password changes

use crate::auth::error::{AuthError, AuthResult};
use crate::auth::guard::Caller;
use crate::auth::password::{check_change, check_length, PasswordHash};
use crate::auth::sessions::{Session, SessionStore};
use crate::storage::{run_blocking, NewUser, Repository};
use crate::store::Clock;
use std::sync::Arc;

/// Account policy knobs
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub allow_guest: bool,
    pub allow_registration: bool,
    pub session_ttl_millis: i64,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            allow_guest: true,
            allow_registration: true,
            session_ttl_millis: 30 * 24 * 3_600_000,
        }
    }
}

#[derive(Clone)]
pub struct Accounts {
    repo: Arc<dyn Repository>,
    sessions: SessionStore,
    settings: AuthSettings,
}

impl Accounts {
    pub fn new(repo: Arc<dyn Repository>, clock: Arc<dyn Clock>, settings: AuthSettings) -> Self {
        let sessions = SessionStore::new(clock, settings.session_ttl_millis);
        Self {
            repo,
            sessions,
            settings,
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Create an account and log it in
    pub async fn register(&self, username: &str, password: &str) -> AuthResult<Session> {
        if !self.settings.allow_registration {
            return Err(AuthError::RegistrationDisabled);
        }

        let username = username.trim();
        if username.is_empty() {
            return Err(AuthError::EmptyUsername);
        }
        check_length(password)?;

        let username = username.to_string();
        let password = password.to_string();
        let user = run_blocking(&self.repo, move |repo| {
            if repo.find_user(&username)?.is_some() {
                return Err(AuthError::UsernameTaken(username));
            }

            let credential = PasswordHash::new(&password)?;
            repo.insert_user(&NewUser {
                username: username.clone(),
                password_hash: credential.into_string(),
            })
            .map_err(|e| {
                if e.is_constraint() {
                    AuthError::UsernameTaken(username)
                } else {
                    AuthError::Storage(e)
                }
            })
        })
        .await?;

        tracing::info!(user_id = %user.id, username = %user.username, "Registered user");
        Ok(self.sessions.issue(Caller::user(user.id, user.username)).await)
    }

    pub async fn login(&self, username: &str, password: &str) -> AuthResult<Session> {
        let username = username.trim().to_string();
        let password = password.to_string();
        let user = run_blocking(&self.repo, move |repo| {
            let user = repo
                .find_user(&username)?
                .ok_or(AuthError::InvalidCredentials)?;

            if !PasswordHash::from_stored(user.password_hash.as_str()).verify(&password) {
                tracing::debug!(username = %user.username, "Rejected login");
                return Err(AuthError::InvalidCredentials);
            }
            Ok(user)
        })
        .await?;

        tracing::info!(user_id = %user.id, "User logged in");
        Ok(self.sessions.issue(Caller::user(user.id, user.username)).await)
    }

    /// A read-only session with no account behind it
    pub async fn guest(&self) -> AuthResult<Session> {
        if !self.settings.allow_guest {
            return Err(AuthError::GuestDisabled);
        }
        let session = self.sessions.issue(Caller::guest("guest")).await;
        tracing::info!("Issued guest session");
        Ok(session)
    }

    pub async fn resolve(&self, token: &str) -> AuthResult<Caller> {
        self.sessions.resolve(token).await
    }

    /// Change the caller's own password
    pub async fn change_password(&self, caller: &Caller, old: &str, new: &str) -> AuthResult<()> {
        let user_id = match (caller.is_guest, caller.user_id) {
            (false, Some(id)) => id,
            _ => return Err(AuthError::Unauthorized),
        };

        let old = old.to_string();
        let new = new.to_string();
        run_blocking(&self.repo, move |repo| {
            let user = repo
                .get_user(user_id)?
                .ok_or(AuthError::Unauthenticated)?;

            check_change(&PasswordHash::from_stored(user.password_hash), &old, &new)?;

            let next = PasswordHash::new(&new)?;
            if !repo.update_password(user_id, next.as_str())? {
                return Err(AuthError::Unauthenticated);
            }
            Ok(())
        })
        .await?;

        tracing::info!(user_id = %user_id, "Password changed");
        Ok(())
    }

    /// Create the bootstrap account if no user by that name exists.
    ///
    /// Returns whether an account was created. Runs before the server
    /// accepts requests, so it blocks the caller.
    pub fn ensure_user(&self, username: &str, password: &str) -> AuthResult<bool> {
        if self.repo.find_user(username)?.is_some() {
            return Ok(false);
        }
        let credential = PasswordHash::new(password)?;
        let user = self.repo.insert_user(&NewUser {
            username: username.to_string(),
            password_hash: credential.into_string(),
        })?;
        tracing::info!(user_id = %user.id, username = %user.username, "Created bootstrap user");
        Ok(true)
    }
}
