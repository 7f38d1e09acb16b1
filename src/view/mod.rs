//! Gaugeboard Views
//!
//! Pure shaping of stored measurements for presentation. Nothing here touches
//! storage or holds ambient state: filter selections and the highlighted
//! point are values passed in by the caller.
//!
//! ```text
//! records ──filter::apply(chart state)──▶ chart::build_chart_frame ──▶ ChartFrame
//!         └─filter::apply(table state)──▶ table::build_table ───────▶ TableView
//!                                                   │
//!                                     Highlight ◀───┘ (looked up by ChartFrame)
//! ```

pub mod chart;
pub mod filter;
pub mod table;

pub use chart::{build_chart_frame, ChartColumn, ChartFrame, ChartRow, TickGranularity};
pub use filter::{apply, DashboardFilters, FilterState, FilterWarning, Observation, ViewKind};
pub use table::{build_table, EditDraft, EditError, Highlight, TableRow, TableView};
