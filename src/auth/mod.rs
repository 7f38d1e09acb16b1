//! Gaugeboard Auth
//!
//! Identity and capability checks that sit in front of the stores:
//!
//! - **accounts**: registration, login, guest sessions, password changes
//! - **password**: bcrypt credentials and the password-change rules
//! - **sessions**: opaque bearer tokens with expiry
//! - **guard**: `authorize(caller, operation)`, the single mutation gate

pub mod accounts;
pub mod error;
pub mod guard;
pub mod password;
pub mod sessions;

pub use accounts::{Accounts, AuthSettings};
pub use error::{AuthError, AuthResult};
pub use guard::{authorize, Caller, Operation};
pub use password::MIN_PASSWORD_LEN;
pub use sessions::{Session, SessionStore};
