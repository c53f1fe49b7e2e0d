//! Matrix Table Rendering
//!
//! Renders the full (benchmark × mode) grid after every cell transition.
//! Status glyphs follow the house style: ✓ done, ✗ error, ⏱ timeout,
//! – not applicable.

use crate::cell::{CellState, MatrixSummary};
use crate::format::format_duration;

fn cell_text(cell: &CellState) -> String {
    match cell {
        CellState::Pending => "·".to_string(),
        CellState::Running => "…".to_string(),
        CellState::Done(mean) => format!("✓ {}", format_duration(*mean)),
        CellState::Error(_) => "✗ error".to_string(),
        CellState::Timeout(_) => "⏱ timeout".to_string(),
        CellState::NotApplicable => "–".to_string(),
    }
}

/// Render the full matrix as a fixed-width table, one row per benchmark,
/// one column per mode, followed by diagnostics for failed cells and a
/// summary line.
///
/// `cells` is row-major and must be `rows.len() × modes.len()`.
pub fn render_matrix(rows: &[String], modes: &[String], cells: &[Vec<CellState>]) -> String {
    let name_width = rows
        .iter()
        .map(|r| r.chars().count())
        .chain(std::iter::once("benchmark".len()))
        .max()
        .unwrap_or(0);
    let col_widths: Vec<usize> = modes
        .iter()
        .enumerate()
        .map(|(j, mode)| {
            cells
                .iter()
                .filter_map(|row| row.get(j))
                .map(|c| cell_text(c).chars().count())
                .chain(std::iter::once(mode.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();

    out.push_str(&format!("{:<name_width$}", "benchmark"));
    for (mode, width) in modes.iter().zip(&col_widths) {
        out.push_str(&format!("  {:<width$}", mode));
    }
    out.push('\n');

    let total_width = name_width + col_widths.iter().map(|w| w + 2).sum::<usize>();
    out.push_str(&"-".repeat(total_width));
    out.push('\n');

    for (row_name, row_cells) in rows.iter().zip(cells) {
        out.push_str(&format!("{:<name_width$}", row_name));
        for (cell, width) in row_cells.iter().zip(&col_widths) {
            let text = cell_text(cell);
            let pad = width.saturating_sub(text.chars().count());
            out.push_str("  ");
            out.push_str(&text);
            out.push_str(&" ".repeat(pad));
        }
        out.push('\n');
    }

    // Diagnostics for failed cells, after the grid.
    for (row_name, row_cells) in rows.iter().zip(cells) {
        for (mode, cell) in modes.iter().zip(row_cells) {
            match cell {
                CellState::Error(msg) | CellState::Timeout(msg) => {
                    out.push_str(&format!("  {row_name}/{mode}: {msg}\n"));
                }
                _ => {}
            }
        }
    }

    let summary = MatrixSummary::from_cells(cells.iter().flatten());
    out.push_str(&format!(
        "{} done, {} error(s), {} timeout(s), {} not applicable\n",
        summary.done, summary.errors, summary.timeouts, summary.not_applicable
    ));

    out
}
