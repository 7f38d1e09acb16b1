//! Authentication and authorization errors

use crate::storage::StorageError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    /// No token, or a token that is unknown or expired
    #[error("Authentication required")]
    Unauthenticated,

    /// Guests may read but never mutate
    #[error("Guests are not allowed to perform this operation")]
    Unauthorized,

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Current password is incorrect")]
    PasswordMismatch,

    #[error("New password must be at least {min} characters")]
    PasswordTooShort { min: usize },

    #[error("New password must be different from the current password")]
    PasswordUnchanged,

    #[error("Username '{0}' is already taken")]
    UsernameTaken(String),

    #[error("Username must not be empty")]
    EmptyUsername,

    #[error("Guest access is disabled")]
    GuestDisabled,

    #[error("Registration is disabled")]
    RegistrationDisabled,

    #[error("Password hashing failed: {0}")]
    Hashing(#[from] bcrypt::BcryptError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub type AuthResult<T> = Result<T, AuthError>;
