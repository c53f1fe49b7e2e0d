//! Configuration loading from gridbench.toml
//!
//! Configuration can be specified in a `gridbench.toml` discovered by walking
//! up from the current directory, then overridden by environment variables
//! (`GRIDBENCH_CC`, `GRIDBENCH_RUNTIME`, `GRIDBENCH_TIMEOUT`), then by CLI
//! flags. Validation is eager: an invalid configuration is fatal before any
//! process is spawned.

use gridbench_core::{BenchError, SamplingConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Raw gridbench configuration as written in gridbench.toml.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GridConfig {
    /// Adaptive sampling parameters.
    #[serde(default)]
    pub sampling: SamplingTable,
    /// Process supervision limits.
    #[serde(default)]
    pub supervisor: SupervisorTable,
    /// External tool executables.
    #[serde(default)]
    pub tools: ToolsTable,
}

/// `[sampling]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingTable {
    /// Untimed warmup invocations per cell.
    #[serde(default = "default_warmup")]
    pub warmup: u32,
    /// Minimum timed trials per cell.
    #[serde(default = "default_min_runs")]
    pub min_runs: u32,
    /// Hard ceiling on timed trials per cell.
    #[serde(default = "default_max_runs")]
    pub max_runs: u32,
    /// Minimum cumulative measured seconds per cell.
    #[serde(default = "default_min_total_seconds")]
    pub min_total_seconds: f64,
}

impl Default for SamplingTable {
    fn default() -> Self {
        Self {
            warmup: default_warmup(),
            min_runs: default_min_runs(),
            max_runs: default_max_runs(),
            min_total_seconds: default_min_total_seconds(),
        }
    }
}

fn default_warmup() -> u32 {
    1
}
fn default_min_runs() -> u32 {
    3
}
fn default_max_runs() -> u32 {
    10
}
fn default_min_total_seconds() -> f64 {
    0.5
}

/// `[supervisor]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupervisorTable {
    /// Per-command wall-clock timeout (e.g. "60s", "5m").
    #[serde(default = "default_timeout")]
    pub timeout: String,
    /// Captured-output ceiling in bytes, stdout and stderr combined.
    #[serde(default = "default_max_output_bytes")]
    pub max_output_bytes: usize,
}

impl Default for SupervisorTable {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            max_output_bytes: default_max_output_bytes(),
        }
    }
}

fn default_timeout() -> String {
    "60s".to_string()
}
fn default_max_output_bytes() -> usize {
    gridbench_exec::DEFAULT_OUTPUT_LIMIT
}

/// `[tools]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsTable {
    /// C compiler used by the native modes.
    #[serde(default = "default_cc")]
    pub cc: String,
    /// Interpreter used by the runtime mode.
    #[serde(default = "default_runtime")]
    pub runtime: String,
}

impl Default for ToolsTable {
    fn default() -> Self {
        Self {
            cc: default_cc(),
            runtime: default_runtime(),
        }
    }
}

fn default_cc() -> String {
    "cc".to_string()
}
fn default_runtime() -> String {
    "python3".to_string()
}

/// Fully validated configuration the harness actually runs with.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Validated sampling parameters.
    pub sampling: SamplingConfig,
    /// Per-command timeout.
    pub timeout: Duration,
    /// Captured-output ceiling in bytes.
    pub max_output_bytes: usize,
    /// C compiler executable.
    pub cc: String,
    /// Interpreter executable.
    pub runtime: String,
}

impl GridConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Discover and load configuration by walking up from the current
    /// directory.
    pub fn discover() -> Option<Self> {
        let mut dir = std::env::current_dir().ok()?;
        loop {
            let config_path = dir.join("gridbench.toml");
            if config_path.exists() {
                return Self::load(&config_path).ok();
            }
            if !dir.pop() {
                break;
            }
        }
        None
    }

    /// Apply environment-variable overrides.
    pub fn apply_env(&mut self) {
        if let Ok(cc) = std::env::var("GRIDBENCH_CC") {
            if !cc.is_empty() {
                self.tools.cc = cc;
            }
        }
        if let Ok(runtime) = std::env::var("GRIDBENCH_RUNTIME") {
            if !runtime.is_empty() {
                self.tools.runtime = runtime;
            }
        }
        if let Ok(timeout) = std::env::var("GRIDBENCH_TIMEOUT") {
            if !timeout.is_empty() {
                self.supervisor.timeout = timeout;
            }
        }
    }

    /// Validate everything eagerly, producing the resolved configuration or
    /// a fatal `BenchError::Config`.
    pub fn validate(&self) -> Result<ResolvedConfig, BenchError> {
        let sampling = SamplingConfig::new(
            self.sampling.warmup,
            self.sampling.min_runs,
            self.sampling.max_runs,
            self.sampling.min_total_seconds,
        )?;

        let timeout = parse_duration(&self.supervisor.timeout)?;
        if timeout.is_zero() {
            return Err(BenchError::Config(
                "supervisor timeout must be positive".to_string(),
            ));
        }
        if self.supervisor.max_output_bytes == 0 {
            return Err(BenchError::Config(
                "max_output_bytes must be positive".to_string(),
            ));
        }
        if self.tools.cc.is_empty() || self.tools.runtime.is_empty() {
            return Err(BenchError::Config(
                "tool executables must not be empty".to_string(),
            ));
        }

        Ok(ResolvedConfig {
            sampling,
            timeout,
            max_output_bytes: self.supervisor.max_output_bytes,
            cc: self.tools.cc.clone(),
            runtime: self.tools.runtime.clone(),
        })
    }
}

/// Parse a duration string (e.g. "60s", "500ms", "2m"). A bare number means
/// seconds.
pub fn parse_duration(s: &str) -> Result<Duration, BenchError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(BenchError::Config("empty duration string".to_string()));
    }

    let (num_part, unit_part) = s
        .char_indices()
        .find(|(_, c)| c.is_alphabetic())
        .map(|(i, _)| s.split_at(i))
        .unwrap_or((s, "s"));

    let value: f64 = num_part
        .parse()
        .map_err(|_| BenchError::Config(format!("invalid duration number: {num_part}")))?;
    if !(value >= 0.0) {
        return Err(BenchError::Config(format!("negative duration: {s}")));
    }

    let seconds = match unit_part.to_lowercase().as_str() {
        "ms" => value / 1_000.0,
        "s" | "" => value,
        "m" | "min" => value * 60.0,
        other => {
            return Err(BenchError::Config(format!(
                "unknown duration unit: {other}"
            )))
        }
    };

    Ok(Duration::from_secs_f64(seconds))
}
