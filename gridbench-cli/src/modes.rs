//! Mode Catalog
//!
//! The built-in execution modes, one column each in the matrix:
//!
//! - `native`: compile `native.c` with the configured C compiler (memoized in
//!   the artifact cache), then time the produced binary.
//! - `native-mt`: same compiler with thread flags; the thread count is passed
//!   to the benchmarked binary as its argument.
//! - `runtime`: time the configured interpreter directly on `runtime.py`.

use crate::discovery::BenchmarkRow;
use gridbench_core::BenchError;
use gridbench_exec::{ArtifactCache, CommandInvocation, Supervisor};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Which input file a mode consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// `native.c`
    Native,
    /// `runtime.py`
    Runtime,
}

#[derive(Debug, Clone, Copy)]
enum ModeKind {
    Native,
    NativeMt { threads: u32 },
    Runtime,
}

/// One column of the matrix.
#[derive(Debug, Clone)]
pub struct Mode {
    /// Column label.
    pub label: String,
    /// Input file this mode requires; rows without it are not applicable.
    pub required_input: InputKind,
    kind: ModeKind,
}

/// Shared machinery every mode runs against.
pub struct RunContext<'a> {
    /// Process supervisor for all external commands.
    pub supervisor: &'a Supervisor,
    /// Compilation memoization, shared across cells.
    pub cache: &'a ArtifactCache,
    /// Directory for compiled artifacts; removed on exit.
    pub scratch_dir: &'a Path,
    /// Per-command timeout.
    pub timeout: Duration,
    /// C compiler executable.
    pub cc: &'a str,
    /// Interpreter executable.
    pub runtime: &'a str,
}

impl Mode {
    /// The built-in mode catalog, in column order.
    pub fn catalog(threads: u32) -> Vec<Mode> {
        vec![
            Mode {
                label: "native".to_string(),
                required_input: InputKind::Native,
                kind: ModeKind::Native,
            },
            Mode {
                label: "native-mt".to_string(),
                required_input: InputKind::Native,
                kind: ModeKind::NativeMt { threads },
            },
            Mode {
                label: "runtime".to_string(),
                required_input: InputKind::Runtime,
                kind: ModeKind::Runtime,
            },
        ]
    }

    /// The input file this mode would consume from `row`, if present.
    pub fn input_for<'a>(&self, row: &'a BenchmarkRow) -> Option<&'a Path> {
        match self.required_input {
            InputKind::Native => row.native_source.as_deref(),
            InputKind::Runtime => row.runtime_source.as_deref(),
        }
    }

    /// Execute this mode once against `row`: compile if needed (memoized),
    /// then run the benchmark program to completion under supervision.
    pub async fn run_once(
        &self,
        row: &BenchmarkRow,
        cx: &RunContext<'_>,
    ) -> Result<(), BenchError> {
        match self.kind {
            ModeKind::Native => {
                let binary = self.compiled_binary(row, cx, &[]).await?;
                self.time_command(cx, binary.display().to_string(), &[], row)
                    .await
            }
            ModeKind::NativeMt { threads } => {
                let binary = self.compiled_binary(row, cx, &["-pthread"]).await?;
                self.time_command(
                    cx,
                    binary.display().to_string(),
                    &[threads.to_string()],
                    row,
                )
                .await
            }
            ModeKind::Runtime => {
                let source = self
                    .input_for(row)
                    .ok_or_else(|| missing_input(row, self))?;
                self.time_command(
                    cx,
                    cx.runtime.to_string(),
                    &[source.display().to_string()],
                    row,
                )
                .await
            }
        }
    }

    /// Compile `native.c` through the artifact cache. The cache key covers
    /// compiler, flags and source path, so the same source compiled with
    /// different flags yields distinct artifacts.
    async fn compiled_binary(
        &self,
        row: &BenchmarkRow,
        cx: &RunContext<'_>,
        extra_flags: &[&str],
    ) -> Result<PathBuf, BenchError> {
        let source = self
            .input_for(row)
            .ok_or_else(|| missing_input(row, self))?;
        let key = format!(
            "{} -O2 {} {}",
            cx.cc,
            extra_flags.join(" "),
            source.display()
        );
        let output = cx.scratch_dir.join(format!("{}-{}", row.name, self.label));

        cx.cache
            .get_or_build(&key, || async move {
                let mut args = vec!["-O2".to_string()];
                args.extend(extra_flags.iter().map(|f| f.to_string()));
                args.push("-o".to_string());
                args.push(output.display().to_string());
                args.push(source.display().to_string());

                let invocation = CommandInvocation::new(cx.cc, &row.dir, cx.timeout).args(args);
                tracing::debug!(benchmark = %row.name, mode = %self.label, "compiling");
                cx.supervisor.run(invocation).await?;
                Ok(output.clone())
            })
            .await
    }

    async fn time_command(
        &self,
        cx: &RunContext<'_>,
        program: String,
        args: &[String],
        row: &BenchmarkRow,
    ) -> Result<(), BenchError> {
        let invocation =
            CommandInvocation::new(program, &row.dir, cx.timeout).args(args.iter().cloned());
        cx.supervisor.run(invocation).await?;
        Ok(())
    }
}

fn missing_input(row: &BenchmarkRow, mode: &Mode) -> BenchError {
    BenchError::Config(format!(
        "benchmark {} has no input for mode {}",
        row.name, mode.label
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridbench_exec::ProcessRegistry;
    use std::sync::Arc;

    #[test]
    fn catalog_is_three_modes_in_column_order() {
        let modes = Mode::catalog(4);
        let labels: Vec<_> = modes.iter().map(|m| m.label.as_str()).collect();
        assert_eq!(labels, vec!["native", "native-mt", "runtime"]);
        assert_eq!(modes[0].required_input, InputKind::Native);
        assert_eq!(modes[1].required_input, InputKind::Native);
        assert_eq!(modes[2].required_input, InputKind::Runtime);
    }

    fn row_with(dir: &Path, files: &[&str]) -> BenchmarkRow {
        for file in files {
            std::fs::write(dir.join(file), "exit 0\n").unwrap();
        }
        BenchmarkRow {
            name: "fib".to_string(),
            dir: dir.to_path_buf(),
            native_source: files
                .contains(&"native.c")
                .then(|| dir.join("native.c")),
            runtime_source: files
                .contains(&"runtime.py")
                .then(|| dir.join("runtime.py")),
        }
    }

    #[test]
    fn input_for_reflects_row_contents() {
        let tmp = tempfile::tempdir().unwrap();
        let row = row_with(tmp.path(), &["runtime.py"]);
        let modes = Mode::catalog(1);
        assert!(modes[0].input_for(&row).is_none());
        assert!(modes[2].input_for(&row).is_some());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn runtime_mode_times_the_interpreter() {
        let tmp = tempfile::tempdir().unwrap();
        let row = row_with(tmp.path(), &["runtime.py"]);

        let registry = Arc::new(ProcessRegistry::new());
        let supervisor = Supervisor::new(registry);
        let cache = ArtifactCache::new();
        let cx = RunContext {
            supervisor: &supervisor,
            cache: &cache,
            scratch_dir: tmp.path(),
            timeout: Duration::from_secs(5),
            cc: "cc",
            // The script is plain shell, so "sh" stands in for the
            // interpreter here.
            runtime: "sh",
        };

        let mode = &Mode::catalog(1)[2];
        mode.run_once(&row, &cx).await.unwrap();
        assert!(cache.is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn native_mode_compiles_once_across_repeats() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::tempdir().unwrap();
        let row = row_with(tmp.path(), &["native.c"]);

        // Stand-in compiler: copies the source to the output and marks it
        // executable. Arguments arrive as: -O2 [flags] -o OUT SRC.
        let fake_cc = tmp.path().join("fakecc");
        std::fs::write(
            &fake_cc,
            "#!/bin/sh\nwhile [ \"$1\" != \"-o\" ]; do shift; done\ncp \"$3\" \"$2\"\nchmod +x \"$2\"\n",
        )
        .unwrap();
        std::fs::set_permissions(&fake_cc, std::fs::Permissions::from_mode(0o755)).unwrap();
        std::fs::write(tmp.path().join("native.c"), "#!/bin/sh\nexit 0\n").unwrap();

        let registry = Arc::new(ProcessRegistry::new());
        let supervisor = Supervisor::new(registry);
        let cache = ArtifactCache::new();
        let cc = fake_cc.display().to_string();
        let cx = RunContext {
            supervisor: &supervisor,
            cache: &cache,
            scratch_dir: tmp.path(),
            timeout: Duration::from_secs(5),
            cc: &cc,
            runtime: "python3",
        };

        let mode = &Mode::catalog(1)[0];
        mode.run_once(&row, &cx).await.unwrap();
        mode.run_once(&row, &cx).await.unwrap();
        assert_eq!(cache.len(), 1);
    }
}
