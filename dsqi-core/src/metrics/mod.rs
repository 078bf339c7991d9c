//! DSQI metric collection.
//!
//! Collectors, leaves first:
//!
//! - [`complexity`]: lexical cyclomatic-complexity estimate (M2)
//! - [`dependencies`]: declared runtime dependencies (M1)
//! - [`deployment`]: deployment method and step count (M3)
//! - [`line_count`]: lines of code via an external tool (C1)
//! - [`dev_time`]: session time and AI attribution totals (C2, C3)
//!
//! [`normalize`] maps raw values onto `[0, 1]`, [`compose`] folds them into
//! the M and C composites, and [`collect`] runs the whole pipeline for one
//! artifact.

pub mod collect;
pub mod complexity;
pub mod compose;
pub mod dependencies;
pub mod deployment;
pub mod dev_time;
pub mod line_count;
pub mod normalize;
pub mod source;

pub use collect::{CollectOptions, CollectionSummary, MetricCollector};
pub use complexity::{ComplexityEstimator, ComplexityReport, LexicalEstimator};
pub use compose::{DsqiResult, RawMetricSet, Weights};
pub use dependencies::{count_dependencies, DependencyReport};
pub use deployment::{estimate_deployment, DeploymentOverride, DeploymentPlan};
pub use dev_time::{aggregate_sessions, DevTimeTotals};
pub use line_count::{LineCountReport, LineCountSource, LineCounter};
pub use normalize::{normalize, THRESHOLDS};
