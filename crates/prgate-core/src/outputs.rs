//! Machine-readable step outputs for downstream CI steps.
//!
//! Key/value pairs are appended to the file named by `GITHUB_OUTPUT` when
//! that variable is set, and always logged, so runs without a configured
//! output mechanism still surface the values in structured logs.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use tracing::info;

use crate::error::GateError;

/// Append-only sink for `key=value` gate outputs. Single writer per run.
pub struct OutputSink {
    path: Option<PathBuf>,
}

impl OutputSink {
    /// Sink writing to the file named by `GITHUB_OUTPUT`, if set.
    pub fn from_env() -> Self {
        Self {
            path: std::env::var_os("GITHUB_OUTPUT").map(PathBuf::from),
        }
    }

    /// Sink bound to an explicit file (tests).
    pub fn to_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// Sink that only logs (offline subcommands).
    pub fn logging_only() -> Self {
        Self { path: None }
    }

    /// Emit one output pair.
    pub fn set(&self, key: &str, value: impl std::fmt::Display) -> Result<(), GateError> {
        let value = value.to_string();
        info!(key, value = %value, "gate output");
        if let Some(path) = &self.path {
            let mut file = OpenOptions::new().create(true).append(true).open(path)?;
            writeln!(file, "{}={}", key, value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outputs_appended_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("outputs.txt");
        let sink = OutputSink::to_path(&path);

        sink.set("risk_tier", "critical").unwrap();
        sink.set("gate_passed", true).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "risk_tier=critical\ngate_passed=true\n");
    }

    #[test]
    fn test_logging_only_sink_never_writes() {
        let sink = OutputSink::logging_only();
        sink.set("risk_tier", "low").unwrap();
    }
}
