//! On-disk layout of the study data, relative to the study root.
//!
//! ```text
//! <root>/
//! ├── artifacts/<slug>/src/                         source tree under study
//! └── data/
//!     ├── artifact-registry.json
//!     ├── development-logs/
//!     │   ├── sessions-<slug>.json
//!     │   └── wakatime-<slug>-<date>.json
//!     ├── evaluations/
//!     │   ├── layer1-dsqi/dsqi-<slug>.json
//!     │   ├── layer2-expert-review/expert-review-<slug>-<n>.json
//!     │   └── layer3-coordinator-review/coordinator-review-<slug>.json
//!     └── static-analysis/<slug>/
//!         ├── cloc-output.json
//!         └── complexity.json
//! ```

use std::path::{Path, PathBuf};

pub const REGISTRY: &str = "data/artifact-registry.json";
pub const DEV_LOGS_DIR: &str = "data/development-logs";
pub const DSQI_DIR: &str = "data/evaluations/layer1-dsqi";
pub const EXPERT_REVIEW_DIR: &str = "data/evaluations/layer2-expert-review";
pub const COORDINATOR_REVIEW_DIR: &str = "data/evaluations/layer3-coordinator-review";
pub const STATIC_ANALYSIS_DIR: &str = "data/static-analysis";
pub const ARTIFACTS_DIR: &str = "artifacts";

pub fn registry() -> PathBuf {
    PathBuf::from(REGISTRY)
}

pub fn session_log(slug: &str) -> PathBuf {
    Path::new(DEV_LOGS_DIR).join(format!("sessions-{slug}.json"))
}

pub fn time_tracking_raw(slug: &str, date: &str) -> PathBuf {
    Path::new(DEV_LOGS_DIR).join(format!("wakatime-{slug}-{date}.json"))
}

pub fn dsqi_result(slug: &str) -> PathBuf {
    Path::new(DSQI_DIR).join(format!("dsqi-{slug}.json"))
}

pub fn complexity_report(slug: &str) -> PathBuf {
    Path::new(STATIC_ANALYSIS_DIR)
        .join(slug)
        .join("complexity.json")
}

pub fn line_count_report(slug: &str) -> PathBuf {
    Path::new(STATIC_ANALYSIS_DIR)
        .join(slug)
        .join("cloc-output.json")
}

pub fn coordinator_review(slug: &str) -> PathBuf {
    Path::new(COORDINATOR_REVIEW_DIR).join(format!("coordinator-review-{slug}.json"))
}

/// Glob (relative to the root) matching every expert review of an artifact.
pub fn expert_reviews_glob(slug: &str) -> String {
    format!("{EXPERT_REVIEW_DIR}/expert-review-{slug}-*.json")
}

/// Glob matching all session logs.
pub fn session_logs_glob() -> String {
    format!("{DEV_LOGS_DIR}/sessions-*.json")
}

/// Glob matching all DSQI results.
pub fn dsqi_results_glob() -> String {
    format!("{DSQI_DIR}/dsqi-*.json")
}

/// Globs matching every review document.
pub fn review_globs() -> [String; 2] {
    [
        format!("{EXPERT_REVIEW_DIR}/expert-review-*.json"),
        format!("{COORDINATOR_REVIEW_DIR}/coordinator-review-*.json"),
    ]
}

/// Source directory of an artifact.
pub fn source_dir(root: &Path, slug: &str) -> PathBuf {
    root.join(ARTIFACTS_DIR).join(slug).join("src")
}
