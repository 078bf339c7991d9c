//! Study progress across the three evaluation layers.

use crate::error::Result;
use crate::store::{paths, Repository, Storage};
use crate::types::{ArtifactStatus, StudyInfo};

/// One artifact's row on the dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusRow {
    pub id: u32,
    pub name: String,
    pub status: ArtifactStatus,
    pub sessions: usize,
    /// Layer 1 index, once P and E are scored
    pub dsqi_score: Option<f64>,
    /// Layer 2 review count
    pub expert_reviews: usize,
    /// Layer 3 review received
    pub coordinator_review: bool,
}

/// Whole-study dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct StudyStatus {
    pub study: StudyInfo,
    pub rows: Vec<StatusRow>,
}

/// Gather the dashboard from the registry and evaluation directories.
///
/// Unreadable per-artifact documents are shown as absent.
pub fn study_status<S: Storage>(repo: &Repository<S>) -> Result<StudyStatus> {
    let registry = repo.load_registry()?;

    let mut rows = Vec::with_capacity(registry.artifacts.len());
    for artifact in &registry.artifacts {
        let slug = artifact.slug.as_str();
        rows.push(StatusRow {
            id: artifact.id,
            name: artifact.name.clone(),
            status: artifact.status,
            sessions: session_count(repo, slug),
            dsqi_score: dsqi_score(repo, slug),
            expert_reviews: repo.count_expert_reviews(slug)?,
            coordinator_review: repo.has_coordinator_review(slug),
        });
    }

    Ok(StudyStatus {
        study: registry.study,
        rows,
    })
}

fn session_count<S: Storage>(repo: &Repository<S>, slug: &str) -> usize {
    match repo.read_json_value(&paths::session_log(slug)) {
        Ok(Some(serde_json::Value::Array(sessions))) => sessions.len(),
        Ok(_) => 0,
        Err(e) => {
            tracing::warn!(artifact = %slug, error = %e, "Unreadable session log");
            0
        }
    }
}

fn dsqi_score<S: Storage>(repo: &Repository<S>, slug: &str) -> Option<f64> {
    match repo.read_json_value(&paths::dsqi_result(slug)) {
        Ok(value) => value?.get("dsqi_score")?.as_f64(),
        Err(e) => {
            tracing::warn!(artifact = %slug, error = %e, "Unreadable DSQI result");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStorage;
    use crate::types::{Artifact, Registry};
    use std::path::Path;

    #[test]
    fn test_study_status() {
        let repo = Repository::new(MemoryStorage::new());
        let mut registry = Registry::default();
        registry.study.title = "Disposable software".to_string();
        registry.study.current_phase = "evaluation".to_string();
        let mut quiz = Artifact::new(1, "01-quiz", "Quiz");
        quiz.status = ArtifactStatus::Developed;
        registry.artifacts.push(quiz);
        registry.artifacts.push(Artifact::new(2, "02-sim", "Simulator"));
        repo.save_registry(&registry).unwrap();

        let storage = repo.storage();
        storage
            .write(&paths::session_log("01-quiz"), "[{}, {}, {}]\n")
            .unwrap();
        storage
            .write(&paths::dsqi_result("01-quiz"), "{\"dsqi_score\": 0.8125}\n")
            .unwrap();
        storage
            .write(&paths::dsqi_result("02-sim"), "{\"dsqi_score\": null}\n")
            .unwrap();
        storage
            .write(
                Path::new("data/evaluations/layer2-expert-review/expert-review-01-quiz-a.json"),
                "{}\n",
            )
            .unwrap();
        storage
            .write(&paths::coordinator_review("01-quiz"), "{}\n")
            .unwrap();
        storage
            .write(&paths::session_log("02-sim"), "not json")
            .unwrap();

        let status = study_status(&repo).unwrap();
        assert_eq!(status.study.title, "Disposable software");
        assert_eq!(
            status.rows[0],
            StatusRow {
                id: 1,
                name: "Quiz".to_string(),
                status: ArtifactStatus::Developed,
                sessions: 3,
                dsqi_score: Some(0.8125),
                expert_reviews: 1,
                coordinator_review: true,
            }
        );
        assert_eq!(status.rows[1].sessions, 0);
        assert_eq!(status.rows[1].dsqi_score, None);
        assert!(!status.rows[1].coordinator_review);
    }
}
