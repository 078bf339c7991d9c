//! Cyclomatic complexity estimation.
//!
//! Complexity is estimated per function through the [`ComplexityEstimator`]
//! trait. The built-in [`LexicalEstimator`] works on raw source text with
//! regular expressions only, so it needs no per-language parser installed.
//! It is an approximation: nested functions, overlapping boundaries and
//! computed dispatch are miscounted.
//!
//! ## Lexical algorithm
//!
//! 1. Strip line comments, block comments, then the bodies of `"..."`,
//!    `'...'` and `` `...` `` literals (comments first, so a quote inside a
//!    comment cannot open a literal).
//! 2. Find function boundaries: `function name(`, `name = function(`,
//!    `name: function(`, `name = (...) =>`, `name = x =>`. Without any
//!    boundary the whole text is one unit.
//! 3. Each unit spans from its boundary to the next one. Its complexity is
//!    one plus the number of decision points: `if`, `else if`, `for`,
//!    `while`, `do`, `switch`, `case`, `catch`, `&&`, `||` and `?`.
//!
//! ## Example
//!
//! ```
//! use dsqi_core::metrics::complexity::{ComplexityEstimator, LexicalEstimator};
//!
//! let units = LexicalEstimator.estimate("function f(x) { if (x) { return 1; } return 0; }");
//! assert_eq!(units.len(), 1);
//! assert_eq!(units[0].complexity, 2);
//! ```

use crate::error::Result;
use crate::metrics::normalize::round_to;
use crate::metrics::source::{file_name, list_all_files, read_lossy};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Extensions scored for complexity.
pub const COMPLEXITY_EXTENSIONS: &[&str] = &["js", "ts", "jsx", "tsx"];

static LINE_COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)//.*$").unwrap());
static BLOCK_COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"/\*[\s\S]*?\*/").unwrap());
static DOUBLE_QUOTED: Lazy<Regex> = Lazy::new(|| Regex::new(r#""(?:[^"\\]|\\.)*""#).unwrap());
static SINGLE_QUOTED: Lazy<Regex> = Lazy::new(|| Regex::new(r"'(?:[^'\\]|\\.)*'").unwrap());
static TEMPLATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`(?:[^`\\]|\\.)*`").unwrap());

static FUNCTION_BOUNDARY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?:function\s+(\w+)\s*\()|",
        r"(?:(\w+)\s*[:=]\s*function\s*\()|",
        r"(?:(\w+)\s*[:=]\s*\([^)]*\)\s*=>)|",
        r"(?:(\w+)\s*[:=]\s*\w+\s*=>)",
    ))
    .unwrap()
});

static DECISION_POINT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:if|else\s+if|for|while|do|switch|case|catch)\b|&&|\|\||\?").unwrap()
});

/// Complexity of one detected unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionComplexity {
    /// Function name, `None` for the whole-file fallback unit
    pub name: Option<String>,
    /// Decision points + 1, always at least 1
    pub complexity: u32,
}

/// Turns source text into per-unit complexity records.
///
/// Implementations must return at least one unit, each with complexity ≥ 1.
pub trait ComplexityEstimator: Send + Sync {
    /// Identifier recorded as the tool in reports.
    fn name(&self) -> &str;

    /// Estimate per-unit complexity of `source`.
    fn estimate(&self, source: &str) -> Vec<FunctionComplexity>;
}

/// Regex-based estimator for JavaScript-like sources.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexicalEstimator;

impl LexicalEstimator {
    /// Remove comments and literal bodies so their text is not scored.
    pub fn strip_non_code(source: &str) -> String {
        let code = LINE_COMMENT.replace_all(source, "");
        let code = BLOCK_COMMENT.replace_all(&code, "");
        let code = DOUBLE_QUOTED.replace_all(&code, "\"\"");
        let code = SINGLE_QUOTED.replace_all(&code, "''");
        let code = TEMPLATE.replace_all(&code, "``");
        code.into_owned()
    }

    fn decision_points(chunk: &str) -> u32 {
        DECISION_POINT.find_iter(chunk).count() as u32
    }
}

impl ComplexityEstimator for LexicalEstimator {
    fn name(&self) -> &str {
        "regex-based cyclomatic complexity (dsqi-core lexical estimator)"
    }

    fn estimate(&self, source: &str) -> Vec<FunctionComplexity> {
        let code = Self::strip_non_code(source);

        let boundaries: Vec<(usize, Option<String>)> = FUNCTION_BOUNDARY
            .captures_iter(&code)
            .filter_map(|caps| {
                let start = caps.get(0)?.start();
                let name = (1..=4)
                    .find_map(|i| caps.get(i))
                    .map(|m| m.as_str().to_string());
                Some((start, name))
            })
            .collect();

        if boundaries.is_empty() {
            return vec![FunctionComplexity {
                name: None,
                complexity: Self::decision_points(&code) + 1,
            }];
        }

        boundaries
            .iter()
            .enumerate()
            .map(|(i, (start, name))| {
                let end = boundaries
                    .get(i + 1)
                    .map(|(next, _)| *next)
                    .unwrap_or(code.len());
                FunctionComplexity {
                    name: name.clone(),
                    complexity: Self::decision_points(&code[*start..end]) + 1,
                }
            })
            .collect()
    }
}

/// File-level complexity aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileComplexity {
    pub file: String,
    /// Number of units, always at least 1
    pub functions: usize,
    /// Mean unit complexity, rounded to 2 decimals
    pub average_complexity: f64,
    pub max_complexity: u32,
    pub total_complexity: u32,
}

impl FileComplexity {
    /// Aggregate unit records for one file.
    ///
    /// An empty record list counts as a single unit of complexity 1.
    pub fn from_units(file: impl Into<String>, units: &[FunctionComplexity]) -> Self {
        let complexities: Vec<u32> = if units.is_empty() {
            vec![1]
        } else {
            units.iter().map(|u| u.complexity.max(1)).collect()
        };

        let total: u32 = complexities.iter().sum();
        let max = complexities.iter().copied().max().unwrap_or(1);
        Self {
            file: file.into(),
            functions: complexities.len(),
            average_complexity: round_to(total as f64 / complexities.len() as f64, 2),
            max_complexity: max,
            total_complexity: total,
        }
    }
}

/// Project-level complexity report (`static-analysis/<slug>/complexity.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplexityReport {
    /// Estimator that produced the figures
    pub tool: String,
    pub files: Vec<FileComplexity>,
    /// Function-count-weighted mean of the file means, rounded to 2 decimals
    pub overall_average: f64,
    pub overall_max: u32,
}

impl ComplexityReport {
    /// Combine file aggregates. No files yields mean 1.0 and max 1.
    pub fn aggregate(tool: impl Into<String>, files: Vec<FileComplexity>) -> Self {
        let total_functions: usize = files.iter().map(|f| f.functions).sum();
        let (overall_average, overall_max) = if total_functions == 0 {
            (1.0, 1)
        } else {
            let weighted: f64 = files
                .iter()
                .map(|f| f.average_complexity * f.functions as f64)
                .sum();
            let max = files.iter().map(|f| f.max_complexity).max().unwrap_or(1);
            (round_to(weighted / total_functions as f64, 2), max)
        };

        Self {
            tool: tool.into(),
            files,
            overall_average,
            overall_max,
        }
    }
}

fn is_scored(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| COMPLEXITY_EXTENSIONS.contains(&ext))
        .unwrap_or(false)
}

/// Score every eligible file directly inside `dir`.
pub fn analyze_directory(estimator: &dyn ComplexityEstimator, dir: &Path) -> Result<ComplexityReport> {
    let mut files = Vec::new();

    for path in list_all_files(dir)?.into_iter().filter(|p| is_scored(p)) {
        let source = match read_lossy(&path) {
            Ok(source) => source,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable file");
                continue;
            }
        };
        let units = estimator.estimate(&source);
        let file = FileComplexity::from_units(file_name(&path), &units);
        tracing::debug!(
            file = %file.file,
            functions = file.functions,
            average = file.average_complexity,
            max = file.max_complexity,
            "Scored file complexity"
        );
        files.push(file);
    }

    Ok(ComplexityReport::aggregate(estimator.name(), files))
}
