//! Password hashing and change rules

use crate::auth::error::{AuthError, AuthResult};

pub const MIN_PASSWORD_LEN: usize = 6;

/// bcrypt work factor for stored credentials
#[cfg(not(test))]
pub const HASH_COST: u32 = 10;
/// Cheapest cost bcrypt accepts, keeps the test suite fast
#[cfg(test)]
pub const HASH_COST: u32 = 4;

/// A stored credential: a bcrypt string carrying its own salt and cost
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Hash with a fresh random salt
    pub fn new(password: &str) -> AuthResult<Self> {
        Ok(Self(bcrypt::hash(password, HASH_COST)?))
    }

    /// Wrap a hash read back from storage
    pub fn from_stored(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    /// Constant-time check of `password` against this hash. A hash that
    /// cannot be parsed never verifies.
    pub fn verify(&self, password: &str) -> bool {
        match bcrypt::verify(password, &self.0) {
            Ok(matched) => matched,
            Err(e) => {
                tracing::warn!(error = %e, "Stored password hash is unreadable");
                false
            }
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

pub fn check_length(password: &str) -> AuthResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::PasswordTooShort {
            min: MIN_PASSWORD_LEN,
        });
    }
    Ok(())
}

/// Run the password-change checks in order: current password, then
/// distinctness, then length. The first failure wins.
pub fn check_change(current: &PasswordHash, old: &str, new: &str) -> AuthResult<()> {
    if !current.verify(old) {
        return Err(AuthError::PasswordMismatch);
    }
    if old == new {
        return Err(AuthError::PasswordUnchanged);
    }
    check_length(new)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let stored = PasswordHash::new("hunter22").unwrap();
        assert!(stored.as_str().starts_with("$2b$"));
        assert!(!stored.as_str().contains("hunter22"));
        assert!(stored.verify("hunter22"));
        assert!(!stored.verify("hunter23"));

        // Salted: same password, different hash
        let again = PasswordHash::new("hunter22").unwrap();
        assert_ne!(stored, again);
        assert!(again.verify("hunter22"));
    }

    #[test]
    fn test_stored_hash_round_trip() {
        let stored = PasswordHash::new("hunter22").unwrap().into_string();
        assert!(PasswordHash::from_stored(stored).verify("hunter22"));
    }

    #[test]
    fn test_hash_carries_work_factor() {
        let stored = PasswordHash::new("hunter22").unwrap();
        let cost = format!("${:02}$", HASH_COST);
        assert_eq!(&stored.as_str()[3..7], cost);
    }

    #[test]
    fn test_unreadable_hash_never_verifies() {
        // A bare hex digest is not a bcrypt string
        let legacy = PasswordHash::from_stored(
            "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08",
        );
        assert!(!legacy.verify("test"));
        assert!(!PasswordHash::from_stored("").verify(""));
    }

    #[test]
    fn test_change_checks_are_ordered() {
        let stored = PasswordHash::new("secret1").unwrap();

        // Wrong old password wins even when the new one is also bad
        assert!(matches!(
            check_change(&stored, "wrong", "wrong"),
            Err(AuthError::PasswordMismatch)
        ));
        assert!(matches!(
            check_change(&stored, "wrong", "abc"),
            Err(AuthError::PasswordMismatch)
        ));

        // Distinctness before length
        assert!(matches!(
            check_change(&stored, "secret1", "secret1"),
            Err(AuthError::PasswordUnchanged)
        ));

        assert!(matches!(
            check_change(&stored, "secret1", "abc"),
            Err(AuthError::PasswordTooShort { min: 6 })
        ));

        assert!(check_change(&stored, "secret1", "secret2").is_ok());
    }

    #[test]
    fn test_length_boundary() {
        assert!(check_length("12345").is_err());
        assert!(check_length("123456").is_ok());
    }
}
