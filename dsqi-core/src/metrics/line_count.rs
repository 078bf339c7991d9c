//! Lines-of-code counting through an external `cloc`-compatible tool.
//!
//! The tool is run as `<candidate...> <dir> --json --quiet`. Candidates are
//! tried in configuration order and the first one producing a JSON object
//! wins. When all of them fail the report is empty and collection goes on
//! with zero lines.

use crate::config::LineCountConfig;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

/// Per-language figures of a line-count report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageLines {
    #[serde(rename = "nFiles", default)]
    pub files: u64,
    #[serde(default)]
    pub blank: u64,
    #[serde(default)]
    pub comment: u64,
    #[serde(default)]
    pub code: u64,
}

/// Raw line-count tool output.
///
/// Kept as the tool's own JSON object so it can be persisted untouched;
/// typed views are read out of it on demand.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineCountReport(serde_json::Map<String, serde_json::Value>);

impl LineCountReport {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse tool output. Anything but a JSON object is rejected.
    pub fn from_json(text: &str) -> Result<Self> {
        match serde_json::from_str::<serde_json::Value>(text)? {
            serde_json::Value::Object(map) => Ok(Self(map)),
            other => Err(Error::LineCount(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The `SUM` row, when present.
    pub fn total(&self) -> Option<LanguageLines> {
        self.0
            .get("SUM")
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Per-language rows, excluding `header` and `SUM`.
    pub fn languages(&self) -> Vec<(String, LanguageLines)> {
        self.0
            .iter()
            .filter(|(name, _)| name.as_str() != "header" && name.as_str() != "SUM")
            .filter_map(|(name, value)| {
                value.get("code")?;
                let lines = serde_json::from_value(value.clone()).ok()?;
                Some((name.clone(), lines))
            })
            .collect()
    }

    /// Total code lines: the `SUM` row, or the per-language sum without one.
    pub fn code_lines(&self) -> u64 {
        match self.total() {
            Some(sum) => sum.code,
            None => self.languages().iter().map(|(_, l)| l.code).sum(),
        }
    }

    pub fn as_json(&self) -> &serde_json::Map<String, serde_json::Value> {
        &self.0
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

/// Anything able to count the lines of a directory.
pub trait LineCountSource: Send + Sync {
    /// Tool identifier recorded in provenance.
    fn name(&self) -> &str;

    /// Count lines under `dir`. Failures yield the empty report.
    fn count(&self, dir: &Path) -> LineCountReport;
}

/// Runs the configured command candidates on a private runtime.
pub struct LineCounter {
    candidates: Vec<Vec<String>>,
    timeout: Duration,
    runtime: tokio::runtime::Runtime,
}

impl LineCounter {
    pub fn new(config: &LineCountConfig) -> Result<Self> {
        config.validate()?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| Error::LineCount(format!("failed to create runtime: {}", e)))?;

        Ok(Self {
            candidates: config.candidates.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            runtime,
        })
    }

    async fn run_candidate(&self, command: &[String], dir: &Path) -> Result<LineCountReport> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| Error::LineCount("empty command".to_string()))?;

        let child = tokio::process::Command::new(program)
            .args(args)
            .arg(dir)
            .args(["--json", "--quiet"])
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(self.timeout, child)
            .await
            .map_err(|_| Error::LineCount(format!("timed out after {}s", self.timeout.as_secs())))?
            .map_err(|e| Error::LineCount(format!("failed to run: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::LineCount(format!(
                "exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        if stdout.trim().is_empty() {
            return Err(Error::LineCount("no output".to_string()));
        }
        LineCountReport::from_json(&stdout)
    }
}

impl LineCountSource for LineCounter {
    fn name(&self) -> &str {
        "cloc"
    }

    fn count(&self, dir: &Path) -> LineCountReport {
        for command in &self.candidates {
            let label = command.join(" ");
            match self.runtime.block_on(self.run_candidate(command, dir)) {
                Ok(report) => {
                    tracing::debug!(command = %label, code = report.code_lines(), "Counted lines");
                    return report;
                }
                Err(e) => {
                    tracing::debug!(command = %label, error = %e, "Line count candidate failed");
                }
            }
        }

        tracing::warn!(
            dir = %dir.display(),
            "No line-count tool succeeded (install cloc, e.g. `npm install -g cloc`); lines of code = 0"
        );
        LineCountReport::empty()
    }
}
