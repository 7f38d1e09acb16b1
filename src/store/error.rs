//! Store error types
//!
//! The error taxonomy returned by the series and measurement stores. Every
//! variant is recoverable; callers decide how to surface it.

use crate::storage::{SeriesId, StorageError};
use crate::store::validate::RangeError;
use std::fmt;
use thiserror::Error;

/// Kind of entity an id referred to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Series,
    Measurement,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entity::Series => write!(f, "Series"),
            Entity::Measurement => write!(f, "Measurement"),
        }
    }
}

/// Errors returned by store operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Entity id absent
    #[error("{entity} {id} not found")]
    NotFound { entity: Entity, id: i64 },

    /// A new measurement referenced a series that does not exist
    #[error("Series {0} not found")]
    SeriesNotFound(SeriesId),

    #[error("A series named '{0}' already exists")]
    DuplicateName(String),

    #[error("Series name cannot be empty")]
    EmptyName,

    #[error("Invalid range: min ({min}) must be less than max ({max})")]
    InvalidRange { min: f64, max: f64 },

    #[error("Value {value} is outside the allowed range ({min} - {max}) for this series.")]
    OutOfRange { value: f64, min: f64, max: f64 },

    #[error("{field} is not a number: {input}")]
    NotANumber { field: &'static str, input: String },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl StoreError {
    pub fn not_found(entity: Entity, id: impl Into<i64>) -> Self {
        StoreError::NotFound {
            entity,
            id: id.into(),
        }
    }
}

impl From<RangeError> for StoreError {
    fn from(err: RangeError) -> Self {
        match err {
            RangeError::NotANumber { field, input } => StoreError::NotANumber { field, input },
            RangeError::InvalidRange { min, max } => StoreError::InvalidRange { min, max },
            RangeError::OutOfRange { value, min, max } => {
                StoreError::OutOfRange { value, min, max }
            }
        }
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
