//! The DSQI collection pipeline for one artifact.

use crate::error::{Error, Result};
use crate::metrics::complexity::{analyze_directory, ComplexityEstimator, ComplexityReport};
use crate::metrics::compose::{CollectorOutputs, DsqiResult, Provenance, RawMetricSet};
use crate::metrics::dependencies::{count_dependencies, DependencyReport};
use crate::metrics::deployment::{estimate_deployment, DeploymentOverride, DeploymentPlan};
use crate::metrics::dev_time::{aggregate_sessions, DevTimeTotals};
use crate::metrics::line_count::{LineCountReport, LineCountSource};
use crate::metrics::source::source_digest;
use crate::store::{paths, Repository, Storage};
use crate::types::Artifact;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Options for one collection run.
#[derive(Debug, Clone, Default)]
pub struct CollectOptions {
    pub deployment: DeploymentOverride,
    /// Drop reviewer P/E scores carried by an earlier result
    pub reset_human_scores: bool,
}

/// Everything a collection run produced.
#[derive(Debug, Clone)]
pub struct CollectionSummary {
    pub artifact: Artifact,
    pub source_dir: PathBuf,
    pub dependencies: DependencyReport,
    pub complexity: ComplexityReport,
    pub deployment: DeploymentPlan,
    pub line_count: LineCountReport,
    pub dev_time: DevTimeTotals,
    /// The session log was missing and time totals are defaults
    pub missing_session_log: bool,
    /// Reviewer P and E were carried over from the previous result
    pub preserved_human_scores: bool,
    pub result: DsqiResult,
}

impl CollectionSummary {
    /// `w1·(1 - M) + w2·(1 - C)`, the part of the index known before review.
    pub fn partial_index(&self) -> f64 {
        self.result.partial_index()
    }
}

/// Runs every collector for an artifact and writes its reports.
pub struct MetricCollector<'a, S: Storage> {
    repo: &'a Repository<S>,
    study_root: PathBuf,
    estimator: Box<dyn ComplexityEstimator>,
    line_counter: Box<dyn LineCountSource>,
}

impl<'a, S: Storage> MetricCollector<'a, S> {
    pub fn new(
        repo: &'a Repository<S>,
        study_root: impl Into<PathBuf>,
        estimator: Box<dyn ComplexityEstimator>,
        line_counter: Box<dyn LineCountSource>,
    ) -> Self {
        Self {
            repo,
            study_root: study_root.into(),
            estimator,
            line_counter,
        }
    }

    /// Source directory of an artifact under the study root.
    pub fn source_dir(&self, artifact: &Artifact) -> PathBuf {
        paths::source_dir(&self.study_root, &artifact.slug)
    }

    fn relative(&self, path: &Path) -> String {
        path.strip_prefix(&self.study_root)
            .unwrap_or(path)
            .display()
            .to_string()
    }

    /// Collect, assemble and persist the DSQI result of one artifact.
    ///
    /// Every collector runs before anything is written.
    pub fn collect(
        &self,
        artifact_id: u32,
        options: &CollectOptions,
        now: DateTime<Utc>,
    ) -> Result<CollectionSummary> {
        let artifact = self.repo.find_artifact(artifact_id)?;
        let slug = artifact.slug.clone();
        let source_dir = self.source_dir(&artifact);
        if !source_dir.is_dir() {
            return Err(Error::SourceDirNotFound(source_dir));
        }

        tracing::info!(artifact = %slug, source_dir = %source_dir.display(), "Collecting DSQI metrics");

        let dependencies = count_dependencies(&source_dir);
        let complexity = analyze_directory(self.estimator.as_ref(), &source_dir)?;
        let deployment = estimate_deployment(&source_dir, &options.deployment)?;
        let line_count = self.line_counter.count(&source_dir);

        let sessions = self.repo.load_sessions(&slug)?;
        let missing_session_log = sessions.is_none();
        if missing_session_log {
            tracing::warn!(artifact = %slug, "No session log, development time and AI ratio use defaults");
        }
        let dev_time = aggregate_sessions(sessions.as_deref().unwrap_or_default());

        let previous = match self.repo.load_dsqi(&slug) {
            Ok(previous) => previous,
            Err(e) => {
                tracing::warn!(artifact = %slug, error = %e, "Ignoring unreadable previous DSQI result");
                None
            }
        };

        let mut tools = BTreeMap::new();
        tools.insert("complexity".to_string(), self.estimator.name().to_string());
        tools.insert("line_count".to_string(), self.line_counter.name().to_string());

        let provenance = Provenance {
            collected_at: now,
            source_dir: self.relative(&source_dir),
            source_digest: source_digest(&source_dir)?,
            tools,
        };
        let outputs = CollectorOutputs {
            line_count: line_count.clone(),
            complexity: complexity.clone(),
            dependencies: dependencies.clone(),
            deployment: deployment.clone(),
            dev_time: dev_time.clone(),
            session_log: paths::session_log(&slug).display().to_string(),
        };

        let mut result = DsqiResult::assemble(&artifact, RawMetricSet::new(outputs, provenance));
        let preserved_human_scores = match previous {
            Some(previous) if !options.reset_human_scores => {
                result.preserve_human_scores_from(&previous);
                previous.has_human_scores()
            }
            _ => false,
        };

        self.repo.save_complexity(&slug, &complexity)?;
        if !line_count.is_empty() {
            self.repo.save_line_count(&slug, &line_count)?;
        }
        self.repo.save_dsqi(&result)?;

        tracing::info!(
            artifact = %slug,
            m_score = result.m_score(),
            c_score = result.c_score(),
            dsqi = ?result.dsqi_score(),
            "DSQI result written"
        );

        Ok(CollectionSummary {
            artifact,
            source_dir,
            dependencies,
            complexity,
            deployment,
            line_count,
            dev_time,
            missing_session_log,
            preserved_human_scores,
            result,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::complexity::LexicalEstimator;
    use crate::store::MemoryStorage;
    use crate::types::Registry;
    use std::fs;
    use tempfile::TempDir;

    struct NoLineCount;

    impl LineCountSource for NoLineCount {
        fn name(&self) -> &str {
            "none"
        }

        fn count(&self, _dir: &Path) -> LineCountReport {
            LineCountReport::empty()
        }
    }

    fn setup() -> (TempDir, Repository<MemoryStorage>) {
        let root = TempDir::new().unwrap();
        let src = paths::source_dir(root.path(), "01-quiz");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("index.html"), "<html></html>\n").unwrap();
        fs::write(src.join("app.js"), "function go(a) { return a ? 1 : 2; }\n").unwrap();

        let repo = Repository::new(MemoryStorage::new());
        let mut registry = Registry::default();
        registry.artifacts.push(Artifact::new(1, "01-quiz", "Quiz"));
        registry.artifacts.push(Artifact::new(2, "02-missing", "Missing"));
        repo.save_registry(&registry).unwrap();
        (root, repo)
    }

    fn collector<'a>(root: &Path, repo: &'a Repository<MemoryStorage>) -> MetricCollector<'a, MemoryStorage> {
        MetricCollector::new(repo, root, Box::new(LexicalEstimator), Box::new(NoLineCount))
    }

    #[test]
    fn test_unknown_artifact_is_fatal() {
        let (root, repo) = setup();
        let err = collector(root.path(), &repo)
            .collect(9, &CollectOptions::default(), Utc::now())
            .unwrap_err();
        assert!(matches!(err, Error::ArtifactNotFound(9)));
    }

    #[test]
    fn test_missing_source_dir_is_fatal_and_writes_nothing() {
        let (root, repo) = setup();
        let before = repo.storage().len();
        let err = collector(root.path(), &repo)
            .collect(2, &CollectOptions::default(), Utc::now())
            .unwrap_err();
        assert!(matches!(err, Error::SourceDirNotFound(_)));
        assert_eq!(repo.storage().len(), before);
    }

    #[test]
    fn test_collect_without_session_log() {
        let (root, repo) = setup();
        let summary = collector(root.path(), &repo)
            .collect(1, &CollectOptions::default(), Utc::now())
            .unwrap();

        assert!(summary.missing_session_log);
        assert_eq!(summary.dev_time.ai_ratio, 1.0);
        assert_eq!(summary.deployment.steps_count, 3);
        assert_eq!(summary.complexity.overall_average, 2.0);
        assert_eq!(summary.result.creation_cost.lines_of_code, 0);
        assert_eq!(summary.result.raw_metrics.source_dir, "artifacts/01-quiz/src");
        assert_eq!(summary.result.raw_metrics.tools["line_count"], "none");

        assert!(repo.load_complexity("01-quiz").unwrap().is_some());
        assert!(!repo.storage().exists(&paths::line_count_report("01-quiz")));
        assert_eq!(repo.load_dsqi("01-quiz").unwrap().unwrap(), summary.result);
    }

    #[test]
    fn test_recollection_preserves_and_resets_human_scores() {
        let (root, repo) = setup();
        let collector = collector(root.path(), &repo);
        let first = collector
            .collect(1, &CollectOptions::default(), Utc::now())
            .unwrap();

        let mut reviewed = first.result.clone();
        reviewed.record_human_scores(0.8, 0.6).unwrap();
        repo.save_dsqi(&reviewed).unwrap();

        let again = collector
            .collect(1, &CollectOptions::default(), Utc::now())
            .unwrap();
        assert!(again.preserved_human_scores);
        assert_eq!(again.result.dsqi_score(), reviewed.dsqi_score());

        let reset = collector
            .collect(
                1,
                &CollectOptions {
                    reset_human_scores: true,
                    ..Default::default()
                },
                Utc::now(),
            )
            .unwrap();
        assert!(!reset.preserved_human_scores);
        assert_eq!(reset.result.dsqi_score(), None);
        assert!(!reset.result.has_human_scores());
    }

    #[test]
    fn test_recollection_without_review_preserves_nothing() {
        let (root, repo) = setup();
        let collector = collector(root.path(), &repo);
        collector
            .collect(1, &CollectOptions::default(), Utc::now())
            .unwrap();

        let again = collector
            .collect(1, &CollectOptions::default(), Utc::now())
            .unwrap();
        assert!(!again.preserved_human_scores);
        assert_eq!(again.result.dsqi_score(), None);
    }

    #[test]
    fn test_malformed_previous_result_is_ignored() {
        let (root, repo) = setup();
        repo.storage()
            .write(&paths::dsqi_result("01-quiz"), "{ broken")
            .unwrap();
        let summary = collector(root.path(), &repo)
            .collect(1, &CollectOptions::default(), Utc::now())
            .unwrap();
        assert!(!summary.preserved_human_scores);
    }
}
