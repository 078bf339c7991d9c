//! Typed access to study records.

use super::paths;
use super::storage::Storage;
use crate::error::{Error, Result};
use crate::metrics::complexity::ComplexityReport;
use crate::metrics::compose::DsqiResult;
use crate::metrics::line_count::LineCountReport;
use crate::types::{Artifact, Registry, Session};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

/// Repository over a [`Storage`] backend.
///
/// Every record is read and written as one pretty-printed JSON document
/// terminated by a newline.
pub struct Repository<S: Storage> {
    storage: S,
}

impl<S: Storage> Repository<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Describe a record location for messages.
    pub fn describe(&self, path: &Path) -> String {
        self.storage.describe(path)
    }

    // ============================================
    // Generic JSON documents
    // ============================================

    /// Load and deserialize a document, `None` when it does not exist.
    pub fn load_json<T: DeserializeOwned>(&self, path: &Path) -> Result<Option<T>> {
        match self.storage.read(path)? {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    /// Serialize and replace a document.
    pub fn save_json<T: Serialize + ?Sized>(&self, path: &Path, value: &T) -> Result<()> {
        let mut text = serde_json::to_string_pretty(value)?;
        text.push('\n');
        self.storage.write(path, &text)
    }

    /// Load any document as untyped JSON.
    pub fn read_json_value(&self, path: &Path) -> Result<Option<serde_json::Value>> {
        self.load_json(path)
    }

    // ============================================
    // Registry
    // ============================================

    pub fn load_registry(&self) -> Result<Registry> {
        let path = paths::registry();
        self.load_json(&path)?
            .ok_or_else(|| Error::RegistryNotFound(self.storage.describe(&path).into()))
    }

    pub fn save_registry(&self, registry: &Registry) -> Result<()> {
        self.save_json(&paths::registry(), registry)
    }

    /// Look up an artifact by id.
    pub fn find_artifact(&self, id: u32) -> Result<Artifact> {
        self.load_registry()?
            .artifact(id)
            .cloned()
            .ok_or(Error::ArtifactNotFound(id))
    }

    // ============================================
    // Session logs
    // ============================================

    /// Session log of an artifact, `None` when it was never created.
    pub fn load_sessions(&self, slug: &str) -> Result<Option<Vec<Session>>> {
        self.load_json(&paths::session_log(slug))
    }

    /// Session log of an artifact that must exist.
    pub fn sessions(&self, slug: &str) -> Result<Vec<Session>> {
        self.load_sessions(slug)?
            .ok_or_else(|| Error::SessionLogNotFound(slug.to_string()))
    }

    pub fn save_sessions(&self, slug: &str, sessions: &[Session]) -> Result<()> {
        self.save_json(&paths::session_log(slug), sessions)
    }

    /// Persist a raw time-tracking API response.
    pub fn save_time_tracking_raw(
        &self,
        slug: &str,
        date: &str,
        response: &serde_json::Value,
    ) -> Result<()> {
        self.save_json(&paths::time_tracking_raw(slug, date), response)
    }

    // ============================================
    // Evaluations and static analysis
    // ============================================

    pub fn load_dsqi(&self, slug: &str) -> Result<Option<DsqiResult>> {
        self.load_json(&paths::dsqi_result(slug))
    }

    pub fn save_dsqi(&self, result: &DsqiResult) -> Result<()> {
        self.save_json(&paths::dsqi_result(&result.artifact_slug), result)
    }

    pub fn load_complexity(&self, slug: &str) -> Result<Option<ComplexityReport>> {
        self.load_json(&paths::complexity_report(slug))
    }

    pub fn save_complexity(&self, slug: &str, report: &ComplexityReport) -> Result<()> {
        self.save_json(&paths::complexity_report(slug), report)
    }

    pub fn save_line_count(&self, slug: &str, report: &LineCountReport) -> Result<()> {
        self.save_json(&paths::line_count_report(slug), report)
    }

    // ============================================
    // Reviews
    // ============================================

    pub fn count_expert_reviews(&self, slug: &str) -> Result<usize> {
        Ok(self.storage.list(&paths::expert_reviews_glob(slug))?.len())
    }

    pub fn has_coordinator_review(&self, slug: &str) -> bool {
        self.storage.exists(&paths::coordinator_review(slug))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::storage::MemoryStorage;
    use crate::types::ArtifactStatus;
    use chrono::Utc;

    fn seeded() -> Repository<MemoryStorage> {
        let repo = Repository::new(MemoryStorage::new());
        let mut registry = Registry::default();
        registry.study.title = "Disposable software study".to_string();
        registry.artifacts.push(Artifact::new(1, "01-quiz", "Quiz"));
        registry.artifacts.push(Artifact::new(2, "02-sim", "Simulator"));
        repo.save_registry(&registry).unwrap();
        repo
    }

    #[test]
    fn test_missing_registry() {
        let repo = Repository::new(MemoryStorage::new());
        assert!(matches!(repo.load_registry(), Err(Error::RegistryNotFound(_))));
    }

    #[test]
    fn test_documents_are_pretty_and_newline_terminated() {
        let repo = seeded();
        let text = repo
            .storage()
            .read(&paths::registry())
            .unwrap()
            .unwrap();
        assert!(text.ends_with("}\n"));
        assert!(text.contains("\n  \"study\""));
    }

    #[test]
    fn test_find_artifact() {
        let repo = seeded();
        assert_eq!(repo.find_artifact(2).unwrap().slug, "02-sim");
        assert!(matches!(repo.find_artifact(9), Err(Error::ArtifactNotFound(9))));
    }

    #[test]
    fn test_sessions_round_trip() {
        let repo = seeded();
        assert!(repo.load_sessions("01-quiz").unwrap().is_none());
        assert!(matches!(
            repo.sessions("01-quiz"),
            Err(Error::SessionLogNotFound(_))
        ));

        let artifact = repo.find_artifact(1).unwrap();
        let sessions = vec![Session::open(&artifact, 1, Utc::now())];
        repo.save_sessions("01-quiz", &sessions).unwrap();
        assert_eq!(repo.sessions("01-quiz").unwrap(), sessions);
    }

    #[test]
    fn test_registry_round_trip() {
        let repo = seeded();
        let mut registry = repo.load_registry().unwrap();
        registry.artifacts[0].status = ArtifactStatus::InDevelopment;
        repo.save_registry(&registry).unwrap();
        assert_eq!(repo.load_registry().unwrap(), registry);
    }

    #[test]
    fn test_review_lookup() {
        let repo = seeded();
        let storage = repo.storage();
        storage
            .write(
                Path::new("data/evaluations/layer2-expert-review/expert-review-01-quiz-1.json"),
                "{}\n",
            )
            .unwrap();
        storage
            .write(
                Path::new("data/evaluations/layer2-expert-review/expert-review-01-quiz-2.json"),
                "{}\n",
            )
            .unwrap();
        storage
            .write(
                Path::new("data/evaluations/layer2-expert-review/expert-review-02-sim-1.json"),
                "{}\n",
            )
            .unwrap();
        storage
            .write(&paths::coordinator_review("02-sim"), "{}\n")
            .unwrap();

        assert_eq!(repo.count_expert_reviews("01-quiz").unwrap(), 2);
        assert_eq!(repo.count_expert_reviews("02-sim").unwrap(), 1);
        assert!(!repo.has_coordinator_review("01-quiz"));
        assert!(repo.has_coordinator_review("02-sim"));
    }
}
