#![warn(missing_docs)]
//! Gridbench Report
//!
//! Per-cell outcome records and the terminal table renderer. The renderer is
//! deliberately dumb: it consumes cell states and diagnostic strings, never
//! structured errors.

mod cell;
mod format;
mod table;

pub use cell::{CellState, MatrixSummary};
pub use format::format_duration;
pub use table::render_matrix;
