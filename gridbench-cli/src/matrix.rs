//! Execution Matrix
//!
//! The (benchmark × mode) grid and its state machine. Cells start `Pending`,
//! or `NotApplicable` when the mode's required input is absent from the row.
//! Execution is strictly sequential in row-major order; after every cell
//! transition an observer hook fires so the caller can re-render.
//!
//! Timeout-vs-error classification is by matching the error variant, never by
//! parsing message strings.

use crate::discovery::BenchmarkRow;
use crate::modes::Mode;
use gridbench_core::BenchError;
use gridbench_report::{CellState, MatrixSummary};
use std::future::Future;

/// The full grid, owning the cell states for the lifetime of a run.
pub struct ExecutionMatrix {
    rows: Vec<BenchmarkRow>,
    modes: Vec<Mode>,
    cells: Vec<Vec<CellState>>,
}

impl ExecutionMatrix {
    /// Build the grid. Cells whose mode input is missing from the row are
    /// terminal `NotApplicable` from construction.
    pub fn new(rows: Vec<BenchmarkRow>, modes: Vec<Mode>) -> Self {
        let cells = rows
            .iter()
            .map(|row| {
                modes
                    .iter()
                    .map(|mode| {
                        if mode.input_for(row).is_some() {
                            CellState::Pending
                        } else {
                            CellState::NotApplicable
                        }
                    })
                    .collect()
            })
            .collect();
        Self { rows, modes, cells }
    }

    /// Row labels, in grid order.
    pub fn row_names(&self) -> Vec<String> {
        self.rows.iter().map(|r| r.name.clone()).collect()
    }

    /// Column labels, in grid order.
    pub fn mode_labels(&self) -> Vec<String> {
        self.modes.iter().map(|m| m.label.clone()).collect()
    }

    /// Current cell states, row-major.
    pub fn cells(&self) -> &[Vec<CellState>] {
        &self.cells
    }

    /// Number of cells that will actually execute.
    pub fn applicable_cells(&self) -> usize {
        self.cells
            .iter()
            .flatten()
            .filter(|c| !matches!(c, CellState::NotApplicable))
            .count()
    }

    /// Execute every applicable cell in row-major order.
    ///
    /// `runner` performs the full sampling session for one cell and yields
    /// the mean trial duration. `on_update` fires after every transition
    /// (`Running`, then the terminal state) with the whole matrix.
    pub async fn run<R, Fut, O>(&mut self, mut runner: R, mut on_update: O) -> MatrixSummary
    where
        R: FnMut(BenchmarkRow, Mode) -> Fut,
        Fut: Future<Output = Result<f64, BenchError>>,
        O: FnMut(&Self),
    {
        for i in 0..self.rows.len() {
            for j in 0..self.modes.len() {
                if self.cells[i][j] == CellState::NotApplicable {
                    continue;
                }

                self.cells[i][j] = CellState::Running;
                on_update(self);

                let outcome = runner(self.rows[i].clone(), self.modes[j].clone()).await;
                self.cells[i][j] = match outcome {
                    Ok(mean) => CellState::Done(mean),
                    Err(err) if err.is_timeout() => CellState::Timeout(err.to_string()),
                    Err(err) => CellState::Error(err.to_string()),
                };
                on_update(self);
            }
        }

        MatrixSummary::from_cells(self.cells.iter().flatten())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modes::InputKind;
    use std::path::PathBuf;
    use std::time::Duration;

    fn row(name: &str, native: bool, runtime: bool) -> BenchmarkRow {
        let dir = PathBuf::from(format!("/bench/{name}"));
        BenchmarkRow {
            name: name.to_string(),
            native_source: native.then(|| dir.join("native.c")),
            runtime_source: runtime.then(|| dir.join("runtime.py")),
            dir,
        }
    }

    #[tokio::test]
    async fn runs_row_major_and_skips_not_applicable() {
        let rows = vec![row("fib", true, false), row("nbody", true, true)];
        let modes = Mode::catalog(2);
        let mut matrix = ExecutionMatrix::new(rows, modes);

        assert_eq!(matrix.applicable_cells(), 5);
        assert_eq!(matrix.cells()[0][2], CellState::NotApplicable);

        let mut visited = Vec::new();
        let summary = matrix
            .run(
                |row, mode| {
                    visited.push(format!("{}/{}", row.name, mode.label));
                    async { Ok(0.01) }
                },
                |_| {},
            )
            .await;

        // NotApplicable cells never reach the runner.
        assert_eq!(
            visited,
            vec![
                "fib/native",
                "fib/native-mt",
                "nbody/native",
                "nbody/native-mt",
                "nbody/runtime",
            ]
        );
        assert_eq!(summary.done, 5);
        assert_eq!(summary.not_applicable, 1);
        assert!(!summary.is_failure());
    }

    #[tokio::test]
    async fn classifies_by_error_variant_not_message() {
        let rows = vec![row("fib", true, false)];
        let modes = Mode::catalog(1);
        let mut matrix = ExecutionMatrix::new(rows, modes);

        let mut call = 0;
        let summary = matrix
            .run(
                |_, _| {
                    call += 1;
                    let outcome = if call == 1 {
                        // A message that mentions "timeout" must still be an
                        // error cell.
                        Err(BenchError::ProcessFailed {
                            code: Some(1),
                            message: "connection timeout in benchmark".to_string(),
                        })
                    } else {
                        Err(BenchError::Timeout {
                            timeout: Duration::from_secs(60),
                        })
                    };
                    async move { outcome }
                },
                |_| {},
            )
            .await;

        assert!(matches!(matrix.cells()[0][0], CellState::Error(_)));
        assert!(matches!(matrix.cells()[0][1], CellState::Timeout(_)));
        assert_eq!(summary.errors, 1);
        assert_eq!(summary.timeouts, 1);
        assert_eq!(summary.exit_code(), 1);
    }

    #[tokio::test]
    async fn timeout_inside_cache_build_is_still_a_timeout_cell() {
        let rows = vec![row("fib", true, false)];
        let modes = vec![Mode::catalog(1).remove(0)];
        let mut matrix = ExecutionMatrix::new(rows, modes);

        matrix
            .run(
                |_, _| async {
                    Err(BenchError::CacheBuild {
                        key: "cc -O2 native.c".to_string(),
                        source: Box::new(BenchError::Timeout {
                            timeout: Duration::from_secs(60),
                        }),
                    })
                },
                |_| {},
            )
            .await;

        assert!(matches!(matrix.cells()[0][0], CellState::Timeout(_)));
    }

    #[tokio::test]
    async fn update_hook_sees_running_then_terminal() {
        let rows = vec![row("fib", false, true)];
        let modes = vec![Mode::catalog(1).remove(2)];
        let mut matrix = ExecutionMatrix::new(rows, modes);

        let mut observed = Vec::new();
        matrix
            .run(
                |_, _| async { Ok(0.5) },
                |m| observed.push(m.cells()[0][0].clone()),
            )
            .await;

        assert_eq!(observed, vec![CellState::Running, CellState::Done(0.5)]);
    }

    #[tokio::test]
    async fn failure_in_one_cell_does_not_stop_later_cells() {
        let rows = vec![row("a", true, false), row("b", true, false)];
        let modes = vec![Mode::catalog(1).remove(0)];
        let mut matrix = ExecutionMatrix::new(rows, modes);

        let mut call = 0;
        let summary = matrix
            .run(
                |_, _| {
                    call += 1;
                    let outcome = if call == 1 {
                        Err(BenchError::ProcessFailed {
                            code: Some(1),
                            message: "boom".to_string(),
                        })
                    } else {
                        Ok(0.2)
                    };
                    async move { outcome }
                },
                |_| {},
            )
            .await;

        assert_eq!(summary.errors, 1);
        assert_eq!(summary.done, 1);
    }
}
