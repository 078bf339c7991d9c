//! Consistency checks over the persisted study data.
//!
//! Each document is parsed into its typed record and then checked for the
//! invariants the tools maintain. Problems are collected per file rather
//! than stopping at the first one.

use crate::error::{Error, Result};
use crate::metrics::compose::DsqiResult;
use crate::store::{paths, Repository, Storage};
use crate::types::{ArtifactStatus, Registry, Session};
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;

/// Which documents to validate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationTarget {
    Registry,
    Sessions,
    Dsqi,
    Reviews,
    #[default]
    All,
}

impl ValidationTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationTarget::Registry => "registry",
            ValidationTarget::Sessions => "sessions",
            ValidationTarget::Dsqi => "dsqi",
            ValidationTarget::Reviews => "reviews",
            ValidationTarget::All => "all",
        }
    }

    fn includes(&self, other: ValidationTarget) -> bool {
        *self == ValidationTarget::All || *self == other
    }
}

impl std::fmt::Display for ValidationTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValidationTarget {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "registry" => Ok(ValidationTarget::Registry),
            "sessions" => Ok(ValidationTarget::Sessions),
            "dsqi" => Ok(ValidationTarget::Dsqi),
            "reviews" => Ok(ValidationTarget::Reviews),
            "all" => Ok(ValidationTarget::All),
            other => Err(Error::InvalidInput(format!(
                "unknown validation target '{}' (expected registry, sessions, dsqi, reviews or all)",
                other
            ))),
        }
    }
}

/// Problems found in one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileValidation {
    pub path: String,
    pub problems: Vec<String>,
}

impl FileValidation {
    pub fn is_ok(&self) -> bool {
        self.problems.is_empty()
    }
}

/// Outcome of a validation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub entries: Vec<FileValidation>,
}

impl ValidationReport {
    pub fn is_ok(&self) -> bool {
        self.entries.iter().all(FileValidation::is_ok)
    }

    pub fn problem_count(&self) -> usize {
        self.entries.iter().map(|e| e.problems.len()).sum()
    }
}

/// Validate the selected documents.
pub fn validate<S: Storage>(repo: &Repository<S>, target: ValidationTarget) -> Result<ValidationReport> {
    let mut report = ValidationReport::default();

    if target.includes(ValidationTarget::Registry) {
        report.entries.push(check_registry(repo));
    }
    if target.includes(ValidationTarget::Sessions) {
        for path in repo.storage().list(&paths::session_logs_glob())? {
            report.entries.push(check_session_log(repo, &path));
        }
    }
    if target.includes(ValidationTarget::Dsqi) {
        for path in repo.storage().list(&paths::dsqi_results_glob())? {
            report.entries.push(check_dsqi_result(repo, &path));
        }
    }
    if target.includes(ValidationTarget::Reviews) {
        for pattern in paths::review_globs() {
            for path in repo.storage().list(&pattern)? {
                report.entries.push(check_review(repo, &path));
            }
        }
    }

    tracing::info!(
        target = %target,
        files = report.entries.len(),
        problems = report.problem_count(),
        "Validation finished"
    );
    Ok(report)
}

/// Load a document for validation, recording why it could not be.
fn load_for_check<T: DeserializeOwned, S: Storage>(
    repo: &Repository<S>,
    path: &Path,
    problems: &mut Vec<String>,
) -> Option<T> {
    match repo.load_json(path) {
        Ok(Some(value)) => Some(value),
        Ok(None) => {
            problems.push("file not found".to_string());
            None
        }
        Err(e) => {
            problems.push(format!("malformed: {}", e));
            None
        }
    }
}

fn check_unit(problems: &mut Vec<String>, label: &str, value: f64) {
    if !(0.0..=1.0).contains(&value) {
        problems.push(format!("{} = {} is outside [0, 1]", label, value));
    }
}

/// Slug embedded in a `<prefix><slug>.json` file name.
fn slug_from_file<'p>(path: &'p Path, prefix: &str) -> Option<&'p str> {
    path.file_name()?
        .to_str()?
        .strip_prefix(prefix)?
        .strip_suffix(".json")
}

fn check_registry<S: Storage>(repo: &Repository<S>) -> FileValidation {
    let path = paths::registry();
    let mut problems = Vec::new();
    if let Some(registry) = load_for_check::<Registry, S>(repo, &path, &mut problems) {
        registry_problems(&registry, &mut problems);
    }
    FileValidation {
        path: path.display().to_string(),
        problems,
    }
}

fn registry_problems(registry: &Registry, problems: &mut Vec<String>) {
    let mut ids = HashSet::new();
    let mut slugs = HashSet::new();

    for artifact in &registry.artifacts {
        let label = format!("artifact {}", artifact.id);
        if !ids.insert(artifact.id) {
            problems.push(format!("{}: duplicate id", label));
        }
        if artifact.slug.trim().is_empty() {
            problems.push(format!("{}: empty slug", label));
        } else if !slugs.insert(artifact.slug.as_str()) {
            problems.push(format!("{}: duplicate slug '{}'", label, artifact.slug));
        }
        if artifact.name.trim().is_empty() {
            problems.push(format!("{}: empty name", label));
        }

        let dev = &artifact.development;
        match artifact.status {
            ArtifactStatus::NotStarted => {
                if dev.start_date.is_some() {
                    problems.push(format!("{}: not-started but has a start date", label));
                }
            }
            ArtifactStatus::InDevelopment => {
                if dev.start_date.is_none() {
                    problems.push(format!("{}: in-development without a start date", label));
                }
            }
            ArtifactStatus::Developed => {
                if dev.start_date.is_none() {
                    problems.push(format!("{}: developed without a start date", label));
                }
                if dev.end_date.is_none() {
                    problems.push(format!("{}: developed without an end date", label));
                }
            }
        }
        if let (Some(start), Some(end)) = (dev.start_date, dev.end_date) {
            if end < start {
                problems.push(format!("{}: end date precedes start date", label));
            }
        }
        if let Some(ratio) = dev.ai_generation_ratio {
            check_unit(problems, &format!("{}: ai_generation_ratio", label), ratio);
        }
    }
}

fn check_session_log<S: Storage>(repo: &Repository<S>, path: &Path) -> FileValidation {
    let mut problems = Vec::new();
    if let Some(sessions) = load_for_check::<Vec<Session>, S>(repo, path, &mut problems) {
        let slug = slug_from_file(path, "sessions-").unwrap_or_default();
        session_problems(slug, &sessions, &mut problems);
    }
    FileValidation {
        path: path.display().to_string(),
        problems,
    }
}

fn session_problems(slug: &str, sessions: &[Session], problems: &mut Vec<String>) {
    let mut open = 0;

    for (index, session) in sessions.iter().enumerate() {
        let label = format!("session {}", session.session_number);
        let expected = index as u32 + 1;
        if session.session_number != expected {
            problems.push(format!(
                "session at position {} is numbered {} (expected {})",
                expected, session.session_number, expected
            ));
        }
        if session.artifact_slug != slug {
            problems.push(format!(
                "{}: belongs to '{}', not '{}'",
                label, session.artifact_slug, slug
            ));
        }

        if session.closed {
            if session.closed_at.is_none() {
                problems.push(format!("{}: closed without a closing timestamp", label));
            }
            if session.duration_minutes.is_none() {
                problems.push(format!("{}: closed without a duration", label));
            }
        } else {
            open += 1;
            if session.closed_at.is_some() {
                problems.push(format!("{}: open but has a closing timestamp", label));
            }
        }

        if let (Some(ai), Some(human), Some(total)) = (
            session.ai_generated_lines,
            session.human_written_lines,
            session.total_lines,
        ) {
            if ai + human != total {
                problems.push(format!(
                    "{}: AI ({}) and human ({}) lines do not add up to {}",
                    label, ai, human, total
                ));
            }
        }
    }

    if open > 1 {
        problems.push(format!("{} sessions are open at once", open));
    }
}

fn check_dsqi_result<S: Storage>(repo: &Repository<S>, path: &Path) -> FileValidation {
    let mut problems = Vec::new();
    if let Some(result) = load_for_check::<DsqiResult, S>(repo, path, &mut problems) {
        let slug = slug_from_file(path, "dsqi-").unwrap_or_default();
        dsqi_problems(slug, &result, &mut problems);
    }
    FileValidation {
        path: path.display().to_string(),
        problems,
    }
}

fn dsqi_problems(slug: &str, result: &DsqiResult, problems: &mut Vec<String>) {
    if result.artifact_slug != slug {
        problems.push(format!(
            "artifact_slug '{}' does not match file name",
            result.artifact_slug
        ));
    }

    let m = &result.maintenance_cost;
    let c = &result.creation_cost;
    for (label, value) in [
        ("dependency_count_normalized", m.dependency_count_normalized),
        ("cyclomatic_complexity_normalized", m.cyclomatic_complexity_normalized),
        ("deployment_steps_normalized", m.deployment_steps_normalized),
        ("M_score", m.m_score),
        ("lines_of_code_normalized", c.lines_of_code_normalized),
        ("development_time_normalized", c.development_time_normalized),
        ("ai_generation_ratio", c.ai_generation_ratio),
        ("C_score", c.c_score),
    ] {
        check_unit(problems, label, value);
    }

    let p = result.pedagogical_alignment.p_score;
    let e = result.pedagogical_purity.e_score;
    if let Some(p) = p {
        check_unit(problems, "P_score", p);
    }
    if let Some(e) = e {
        check_unit(problems, "E_score", e);
    }

    let weight_sum = result.weights.sum();
    if (weight_sum - 1.0).abs() > 1e-9 {
        problems.push(format!("weights sum to {} instead of 1", weight_sum));
    }

    if let Some(score) = result.dsqi_score() {
        if p.is_none() || e.is_none() {
            problems.push("dsqi_score is set while P or E is missing".to_string());
        }
        check_unit(problems, "dsqi_score", score);
    }
}

fn check_review<S: Storage>(repo: &Repository<S>, path: &Path) -> FileValidation {
    let mut problems = Vec::new();
    if let Some(value) = load_for_check::<serde_json::Value, S>(repo, path, &mut problems) {
        if !value.is_object() {
            problems.push("review must be a JSON object".to_string());
        }
    }
    FileValidation {
        path: path.display().to_string(),
        problems,
    }
}
