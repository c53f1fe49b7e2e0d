//! Benchmark Discovery
//!
//! Scans the immediate subdirectories of a benchmark root. Each subdirectory
//! is one row of the matrix; `native.c` and `runtime.py` inside it are the
//! recognized inputs. Rows with neither input are skipped with a warning.
//! Order is deterministic (sorted by name).

use regex::Regex;
use std::path::{Path, PathBuf};

/// One discovered benchmark directory.
#[derive(Debug, Clone)]
pub struct BenchmarkRow {
    /// Directory name, used as the row label.
    pub name: String,
    /// Benchmark directory.
    pub dir: PathBuf,
    /// `native.c`, if present.
    pub native_source: Option<PathBuf>,
    /// `runtime.py`, if present.
    pub runtime_source: Option<PathBuf>,
}

/// Scan `root` for benchmark rows, optionally filtered by a name regex.
pub fn discover_rows(root: &Path, filter: Option<&Regex>) -> anyhow::Result<Vec<BenchmarkRow>> {
    let mut rows = Vec::new();

    for entry in std::fs::read_dir(root)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }

        let dir = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        if let Some(filter) = filter {
            if !filter.is_match(&name) {
                continue;
            }
        }

        let native_source = existing(dir.join("native.c"));
        let runtime_source = existing(dir.join("runtime.py"));
        if native_source.is_none() && runtime_source.is_none() {
            tracing::warn!(benchmark = %name, "no recognized input files, skipping");
            continue;
        }

        rows.push(BenchmarkRow {
            name,
            dir,
            native_source,
            runtime_source,
        });
    }

    rows.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(rows)
}

fn existing(path: PathBuf) -> Option<PathBuf> {
    path.is_file().then_some(path)
}
