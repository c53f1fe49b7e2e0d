//! Cell Outcomes
//!
//! The execution state of one (benchmark, mode) pairing, plus the aggregate
//! view the exit status is computed from.

use serde::{Deserialize, Serialize};

/// Execution state of one matrix cell.
///
/// Transitions run `Pending → Running → {Done | Error | Timeout}`, each
/// entered exactly once. `NotApplicable` is terminal from construction and
/// never transitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "state", content = "detail")]
pub enum CellState {
    /// Not yet started.
    Pending,
    /// Currently sampling.
    Running,
    /// Completed with a mean trial duration in seconds.
    Done(f64),
    /// Failed with a diagnostic message.
    Error(String),
    /// Deadline expired; carries the diagnostic message.
    Timeout(String),
    /// The mode's required input file is absent from this row.
    NotApplicable,
}

impl CellState {
    /// Whether this cell counts as a failure in the aggregate.
    /// `NotApplicable` never does.
    pub fn is_failure(&self) -> bool {
        matches!(self, CellState::Error(_) | CellState::Timeout(_))
    }

    /// Whether this cell is terminal.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, CellState::Pending | CellState::Running)
    }
}

/// Aggregate over all cells of a completed (or in-progress) matrix.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MatrixSummary {
    /// Cells that completed with a mean.
    pub done: usize,
    /// Cells that ended in error.
    pub errors: usize,
    /// Cells that timed out.
    pub timeouts: usize,
    /// Cells skipped as not applicable.
    pub not_applicable: usize,
}

impl MatrixSummary {
    /// Tally the cells of a matrix.
    pub fn from_cells<'a, I>(cells: I) -> Self
    where
        I: IntoIterator<Item = &'a CellState>,
    {
        let mut summary = Self::default();
        for cell in cells {
            match cell {
                CellState::Done(_) => summary.done += 1,
                CellState::Error(_) => summary.errors += 1,
                CellState::Timeout(_) => summary.timeouts += 1,
                CellState::NotApplicable => summary.not_applicable += 1,
                CellState::Pending | CellState::Running => {}
            }
        }
        summary
    }

    /// The run as a whole failed if any cell ended in error or timeout.
    pub fn is_failure(&self) -> bool {
        self.errors > 0 || self.timeouts > 0
    }

    /// Process exit code: 0 iff no applicable cell failed.
    pub fn exit_code(&self) -> i32 {
        if self.is_failure() {
            1
        } else {
            0
        }
    }
}
