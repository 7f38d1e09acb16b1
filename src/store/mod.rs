//! Gaugeboard Stores
//!
//! Domain rules on top of the [`Repository`](crate::storage::Repository):
//!
//! - **validate**: Range Validator shared by series bounds and measurement values
//! - **series**: Series Store (unique names, `min < max`, cascade delete)
//! - **measurements**: Measurement Store (value within owning series' bounds)
//! - **clock**: Time source for default timestamps
//! - **error**: The store error taxonomy
//!
//! # Write discipline
//!
//! ```text
//! lock gate → resolve series → merge candidate → validate → persist → unlock
//! ```
//!
//! Both stores share one write gate, so a resolve/validate/persist sequence
//! never interleaves with another mutation (a cascade delete in particular).
//! Reads bypass the gate; they only ever see committed, validated rows.

pub mod clock;
pub mod error;
pub mod measurements;
pub mod series;
pub mod validate;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{Entity, StoreError, StoreResult};
pub use measurements::MeasurementStore;
pub use series::{SeriesDraft, SeriesStore};
pub use validate::RangeError;

use crate::storage::Repository;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Serializes every mutating store operation
pub(crate) type WriteGate = Arc<Mutex<()>>;

/// The series and measurement stores over one repository
#[derive(Clone)]
pub struct Stores {
    pub series: SeriesStore,
    pub measurements: MeasurementStore,
}

impl Stores {
    pub fn new(repo: Arc<dyn Repository>, clock: Arc<dyn Clock>) -> Self {
        let gate: WriteGate = Arc::new(Mutex::new(()));
        Self {
            series: SeriesStore::new(Arc::clone(&repo), Arc::clone(&gate)),
            measurements: MeasurementStore::new(repo, clock, gate),
        }
    }
}
