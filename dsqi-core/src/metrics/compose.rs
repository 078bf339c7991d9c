//! Composition of normalized metrics into the DSQI result.
//!
//! ```text
//! M = mean(n_deps, n_cc, n_steps)
//! C = mean(n_loc, n_minutes, 1 - ai_ratio)
//! DSQI = w1·(1 - M) + w2·(1 - C) + w3·P + w4·E
//! ```
//!
//! M and C come from collected metrics. P and E are entered by human
//! reviewers, so a freshly assembled result carries neither and has no
//! index. [`DsqiResult::record_human_scores`] is the only way to set it.

use crate::error::{Error, Result};
use crate::metrics::complexity::ComplexityReport;
use crate::metrics::dependencies::DependencyReport;
use crate::metrics::deployment::DeploymentPlan;
use crate::metrics::dev_time::DevTimeTotals;
use crate::metrics::line_count::LineCountReport;
use crate::metrics::normalize::{normalize, round_to, Thresholds, THRESHOLDS};
use crate::types::{Artifact, ExtraFields};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const COLLECTOR_VERSION: &str = "1.0.0";
pub const EVALUATOR: &str = "self (automated collection + manual scoring)";
pub const COLLECTION_NOTES: &str = "M and C metrics collected automatically by dsqi-collect. \
P and E metrics require human evaluators; fill in after reviews are complete.";

/// Maintenance cost block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceCost {
    pub dependency_count: u32,
    pub dependency_count_normalized: f64,
    pub cyclomatic_complexity_avg: f64,
    pub cyclomatic_complexity_normalized: f64,
    pub deployment_steps: u32,
    pub deployment_steps_normalized: f64,
    #[serde(rename = "M_score")]
    pub m_score: f64,
}

/// Creation cost block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreationCost {
    pub lines_of_code: u64,
    pub lines_of_code_normalized: f64,
    pub ai_generation_ratio: f64,
    pub development_time_minutes: i64,
    pub development_time_normalized: f64,
    #[serde(rename = "C_score")]
    pub c_score: f64,
}

/// Pedagogical alignment block, filled in by the module coordinator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PedagogicalAlignment {
    #[serde(default)]
    pub concept_coverage: Option<f64>,
    #[serde(default)]
    pub icap_level: Option<String>,
    #[serde(default)]
    pub icap_score: Option<f64>,
    #[serde(default, rename = "P_score")]
    pub p_score: Option<f64>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// Pedagogical purity block, filled in by expert reviewers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PedagogicalPurity {
    #[serde(default)]
    pub conceptual_fidelity_raw: Option<f64>,
    #[serde(default)]
    pub conceptual_fidelity_normalized: Option<f64>,
    #[serde(default)]
    pub process_replicability_raw: Option<f64>,
    #[serde(default)]
    pub process_replicability_normalized: Option<f64>,
    #[serde(default, rename = "E_score")]
    pub e_score: Option<f64>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// Composite weights.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weights {
    pub w1_maintenance: f64,
    pub w2_creation: f64,
    pub w3_pedagogical: f64,
    pub w4_purity: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            w1_maintenance: 0.3,
            w2_creation: 0.2,
            w3_pedagogical: 0.3,
            w4_purity: 0.2,
        }
    }
}

impl Weights {
    pub fn sum(&self) -> f64 {
        self.w1_maintenance + self.w2_creation + self.w3_pedagogical + self.w4_purity
    }
}

/// Session-log time totals as recorded in the result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DevTimeEvidence {
    pub wall_clock_minutes: i64,
    pub wakatime_seconds: f64,
    pub sessions: usize,
    pub source: String,
}

/// Session-log line attribution as recorded in the result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiRatioEvidence {
    pub ratio: f64,
    pub ai_generated_lines: u64,
    pub human_written_lines: u64,
    pub total_lines: u64,
    pub source: String,
}

/// Provenance plus the full collector outputs (`raw_metrics`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMetrics {
    pub collected_at: DateTime<Utc>,
    pub collector_version: String,
    #[serde(default)]
    pub source_dir: String,
    #[serde(default)]
    pub source_digest: String,
    /// Tool identifiers by concern
    #[serde(default)]
    pub tools: BTreeMap<String, String>,
    pub cloc: LineCountReport,
    pub complexity: ComplexityReport,
    pub dependency_analysis: DependencyReport,
    pub deployment: DeploymentPlan,
    pub dev_time: DevTimeEvidence,
    pub ai_ratio: AiRatioEvidence,
}

/// Where and how metrics were collected.
#[derive(Debug, Clone, PartialEq)]
pub struct Provenance {
    pub collected_at: DateTime<Utc>,
    pub source_dir: String,
    pub source_digest: String,
    pub tools: BTreeMap<String, String>,
}

/// Outputs of every collector for one artifact.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectorOutputs {
    pub line_count: LineCountReport,
    pub complexity: ComplexityReport,
    pub dependencies: DependencyReport,
    pub deployment: DeploymentPlan,
    pub dev_time: DevTimeTotals,
    /// Session log the totals came from
    pub session_log: String,
}

/// The six scored raw values with their provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct RawMetricSet {
    pub dependency_count: u32,
    pub complexity_avg: f64,
    pub deployment_steps: u32,
    pub lines_of_code: u64,
    pub development_minutes: i64,
    pub ai_ratio: f64,
    pub raw: RawMetrics,
}

impl RawMetricSet {
    pub fn new(outputs: CollectorOutputs, provenance: Provenance) -> Self {
        let CollectorOutputs {
            line_count,
            complexity,
            dependencies,
            deployment,
            dev_time,
            session_log,
        } = outputs;

        Self {
            dependency_count: dependencies.dependency_count,
            complexity_avg: complexity.overall_average,
            deployment_steps: deployment.steps_count,
            lines_of_code: line_count.code_lines(),
            development_minutes: dev_time.wall_clock_minutes,
            ai_ratio: dev_time.ai_ratio,
            raw: RawMetrics {
                collected_at: provenance.collected_at,
                collector_version: COLLECTOR_VERSION.to_string(),
                source_dir: provenance.source_dir,
                source_digest: provenance.source_digest,
                tools: provenance.tools,
                cloc: line_count,
                complexity,
                dependency_analysis: dependencies,
                deployment,
                dev_time: DevTimeEvidence {
                    wall_clock_minutes: dev_time.wall_clock_minutes,
                    wakatime_seconds: dev_time.wakatime_seconds,
                    sessions: dev_time.sessions,
                    source: session_log.clone(),
                },
                ai_ratio: AiRatioEvidence {
                    ratio: dev_time.ai_ratio,
                    ai_generated_lines: dev_time.ai_generated_lines,
                    human_written_lines: dev_time.human_written_lines,
                    total_lines: dev_time.total_lines,
                    source: session_log,
                },
            },
        }
    }
}

/// Maintenance composite from raw values.
pub fn maintenance_cost(
    thresholds: &Thresholds,
    dependency_count: u32,
    complexity_avg: f64,
    deployment_steps: u32,
) -> MaintenanceCost {
    let n_deps = normalize(dependency_count as f64, thresholds.dependency_count);
    let n_cc = normalize(complexity_avg, thresholds.complexity_avg);
    let n_steps = normalize(deployment_steps as f64, thresholds.deployment_steps);

    MaintenanceCost {
        dependency_count,
        dependency_count_normalized: round_to(n_deps, 4),
        cyclomatic_complexity_avg: complexity_avg,
        cyclomatic_complexity_normalized: round_to(n_cc, 4),
        deployment_steps,
        deployment_steps_normalized: round_to(n_steps, 4),
        m_score: round_to((n_deps + n_cc + n_steps) / 3.0, 4),
    }
}

/// Creation composite from raw values. A high AI ratio lowers the cost.
pub fn creation_cost(
    thresholds: &Thresholds,
    lines_of_code: u64,
    development_minutes: i64,
    ai_ratio: f64,
) -> CreationCost {
    let n_loc = normalize(lines_of_code as f64, thresholds.lines_of_code);
    let n_minutes = normalize(development_minutes as f64, thresholds.dev_time_minutes);

    CreationCost {
        lines_of_code,
        lines_of_code_normalized: round_to(n_loc, 4),
        ai_generation_ratio: ai_ratio,
        development_time_minutes: development_minutes,
        development_time_normalized: round_to(n_minutes, 4),
        c_score: round_to((n_loc + n_minutes + (1.0 - ai_ratio)) / 3.0, 4),
    }
}

/// One artifact's DSQI result (`layer1-dsqi/dsqi-<slug>.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DsqiResult {
    pub artifact_id: u32,
    pub artifact_slug: String,
    pub evaluator: String,
    pub date: NaiveDate,
    pub notes: String,
    pub maintenance_cost: MaintenanceCost,
    pub creation_cost: CreationCost,
    #[serde(default)]
    pub pedagogical_alignment: PedagogicalAlignment,
    #[serde(default)]
    pub pedagogical_purity: PedagogicalPurity,
    #[serde(default)]
    pub weights: Weights,
    #[serde(default)]
    dsqi_score: Option<f64>,
    pub raw_metrics: RawMetrics,
}

impl DsqiResult {
    /// Assemble a partial result with P, E and the index unset.
    pub fn assemble(artifact: &Artifact, metrics: RawMetricSet) -> Self {
        let maintenance_cost = maintenance_cost(
            &THRESHOLDS,
            metrics.dependency_count,
            metrics.complexity_avg,
            metrics.deployment_steps,
        );
        let creation_cost = creation_cost(
            &THRESHOLDS,
            metrics.lines_of_code,
            metrics.development_minutes,
            metrics.ai_ratio,
        );

        Self {
            artifact_id: artifact.id,
            artifact_slug: artifact.slug.clone(),
            evaluator: EVALUATOR.to_string(),
            date: metrics.raw.collected_at.date_naive(),
            notes: COLLECTION_NOTES.to_string(),
            maintenance_cost,
            creation_cost,
            pedagogical_alignment: PedagogicalAlignment::default(),
            pedagogical_purity: PedagogicalPurity::default(),
            weights: Weights::default(),
            dsqi_score: None,
            raw_metrics: metrics.raw,
        }
    }

    pub fn m_score(&self) -> f64 {
        self.maintenance_cost.m_score
    }

    pub fn c_score(&self) -> f64 {
        self.creation_cost.c_score
    }

    /// Final index, present only once P and E are both scored.
    pub fn dsqi_score(&self) -> Option<f64> {
        self.dsqi_score
    }

    pub fn has_human_scores(&self) -> bool {
        self.pedagogical_alignment.p_score.is_some() && self.pedagogical_purity.e_score.is_some()
    }

    /// The machine-computable part of the index: `w1·(1 - M) + w2·(1 - C)`.
    pub fn partial_index(&self) -> f64 {
        round_to(
            self.weights.w1_maintenance * (1.0 - self.m_score())
                + self.weights.w2_creation * (1.0 - self.c_score()),
            4,
        )
    }

    fn compute_index(&self) -> Option<f64> {
        let p = self.pedagogical_alignment.p_score?;
        let e = self.pedagogical_purity.e_score?;
        Some(round_to(
            self.weights.w1_maintenance * (1.0 - self.m_score())
                + self.weights.w2_creation * (1.0 - self.c_score())
                + self.weights.w3_pedagogical * p
                + self.weights.w4_purity * e,
            4,
        ))
    }

    /// Store reviewer scores and compute the index.
    pub fn record_human_scores(&mut self, p_score: f64, e_score: f64) -> Result<f64> {
        for (label, value) in [("P", p_score), ("E", e_score)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::InvalidInput(format!(
                    "{} score must be within [0, 1], got {}",
                    label, value
                )));
            }
        }

        self.pedagogical_alignment.p_score = Some(p_score);
        self.pedagogical_purity.e_score = Some(e_score);
        let index = self
            .compute_index()
            .ok_or_else(|| Error::InvalidInput("human scores missing after update".to_string()))?;
        self.dsqi_score = Some(index);
        Ok(index)
    }

    /// Carry reviewer input over from an earlier result and recompute the
    /// index against the new M and C.
    pub fn preserve_human_scores_from(&mut self, previous: &DsqiResult) {
        self.pedagogical_alignment = previous.pedagogical_alignment.clone();
        self.pedagogical_purity = previous.pedagogical_purity.clone();
        self.dsqi_score = self.compute_index();
    }
}
