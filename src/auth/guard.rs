//! Capability guard
//!
//! The one place that decides whether a caller may run an operation. It is
//! evaluated once, before dispatch, so the stores never see auth context.

use crate::auth::error::{AuthError, AuthResult};
use crate::storage::UserId;
use serde::{Deserialize, Serialize};

/// A resolved identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    /// `None` for guests, who have no account
    pub user_id: Option<UserId>,
    pub name: String,
    pub is_guest: bool,
}

impl Caller {
    pub fn user(id: UserId, name: impl Into<String>) -> Self {
        Self {
            user_id: Some(id),
            name: name.into(),
            is_guest: false,
        }
    }

    pub fn guest(name: impl Into<String>) -> Self {
        Self {
            user_id: None,
            name: name.into(),
            is_guest: true,
        }
    }
}

/// Every operation the service can dispatch, by capability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ListSeries,
    CreateSeries,
    UpdateSeries,
    DeleteSeries,
    ListMeasurements,
    CreateMeasurement,
    UpdateMeasurement,
    DeleteMeasurement,
    ChartView,
    TableView,
    ChangePassword,
}

impl Operation {
    pub fn is_mutation(&self) -> bool {
        !matches!(
            self,
            Operation::ListSeries
                | Operation::ListMeasurements
                | Operation::ChartView
                | Operation::TableView
        )
    }
}

/// Reads are open to everyone. Mutations need an identity that is not a guest.
pub fn authorize(caller: Option<&Caller>, op: Operation) -> AuthResult<()> {
    if !op.is_mutation() {
        return Ok(());
    }
    match caller {
        None => Err(AuthError::Unauthenticated),
        Some(c) if c.is_guest => {
            tracing::debug!(caller = %c.name, operation = ?op, "Rejected guest mutation");
            Err(AuthError::Unauthorized)
        }
        Some(_) => Ok(()),
    }
}
