//! Core domain types for dsqi
//!
//! These types mirror the persisted study records: the artifact registry and
//! the per-artifact session logs. Field names follow the on-disk JSON keys,
//! and keys this crate does not model are carried through untouched in the
//! `extra` maps so a rewrite never drops data entered by hand.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Artifact** | One software deliverable under study |
//! | **Session** | One bounded development work interval for an artifact |
//! | **Active seconds** | Editor activity measured by the time-tracking service |
//! | **AI ratio** | Share of produced lines attributed to AI generation |

use chrono::{DateTime, NaiveDate, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Free-form JSON fields preserved across rewrites.
pub type ExtraFields = serde_json::Map<String, serde_json::Value>;

// ============================================
// Registry
// ============================================

/// The artifact registry (`data/artifact-registry.json`).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Registry {
    /// Study-level metadata
    #[serde(default)]
    pub study: StudyInfo,
    /// Every artifact under study
    #[serde(default)]
    pub artifacts: Vec<Artifact>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl Registry {
    /// Look up an artifact by numeric id.
    pub fn artifact(&self, id: u32) -> Option<&Artifact> {
        self.artifacts.iter().find(|a| a.id == id)
    }

    /// Mutable lookup by numeric id.
    pub fn artifact_mut(&mut self, id: u32) -> Option<&mut Artifact> {
        self.artifacts.iter_mut().find(|a| a.id == id)
    }
}

/// Study-level metadata shown by the status dashboard.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StudyInfo {
    #[serde(default)]
    pub title: String,
    /// Current study phase (e.g. "planning", "development")
    #[serde(default)]
    pub current_phase: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_journal: Option<String>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// Study phase recorded once development starts.
pub const PHASE_DEVELOPMENT: &str = "development";

// ============================================
// Artifact
// ============================================

/// Lifecycle status of an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArtifactStatus {
    #[default]
    NotStarted,
    InDevelopment,
    Developed,
}

impl ArtifactStatus {
    /// Returns the identifier used in the registry
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactStatus::NotStarted => "not-started",
            ArtifactStatus::InDevelopment => "in-development",
            ArtifactStatus::Developed => "developed",
        }
    }
}

impl std::fmt::Display for ArtifactStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ArtifactStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not-started" => Ok(ArtifactStatus::NotStarted),
            "in-development" => Ok(ArtifactStatus::InDevelopment),
            "developed" => Ok(ArtifactStatus::Developed),
            _ => Err(format!("unknown artifact status: {}", s)),
        }
    }
}

/// One software deliverable under study.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub id: u32,
    /// Directory and file-name key (e.g. "01-unit-testing-gauntlet")
    pub slug: String,
    /// Display name
    pub name: String,
    #[serde(default)]
    pub status: ArtifactStatus,
    #[serde(default)]
    pub development: DevelopmentRecord,
    #[serde(default)]
    pub tech_stack: Vec<String>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl Artifact {
    /// Create a fresh, not-started artifact.
    pub fn new(id: u32, slug: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id,
            slug: slug.into(),
            name: name.into(),
            status: ArtifactStatus::NotStarted,
            development: DevelopmentRecord::default(),
            tech_stack: Vec::new(),
            extra: ExtraFields::new(),
        }
    }
}

/// Aggregate development record, frozen by the final session close.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DevelopmentRecord {
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub lines_of_code: Option<u64>,
    #[serde(default)]
    pub dependency_count: Option<u32>,
    #[serde(default)]
    pub ai_generation_ratio: Option<f64>,
    #[serde(default)]
    pub wakatime_active_seconds: Option<f64>,
    #[serde(default)]
    pub total_sessions: Option<u32>,
    #[serde(default)]
    pub total_duration_minutes: Option<i64>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

// ============================================
// Session
// ============================================

/// Line count of one produced source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileLineCount {
    pub file: String,
    pub lines: u64,
    pub language: String,
}

/// One development session of an artifact (an entry of
/// `data/development-logs/sessions-<slug>.json`).
///
/// A session is open until [`Session::closed`] is set; closing fills in the
/// closing timestamp, duration and line attribution exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub artifact_id: u32,
    pub artifact_slug: String,
    /// 1-based, contiguous per artifact
    pub session_number: u32,
    /// When the session was opened
    #[serde(rename = "timestamp")]
    pub opened_at: DateTime<Utc>,
    pub date: NaiveDate,
    #[serde(default)]
    pub duration_minutes: Option<i64>,
    #[serde(default)]
    pub ai_tools_used: Vec<String>,
    #[serde(default, rename = "session_closed")]
    pub closed: bool,
    #[serde(default, rename = "closed_timestamp")]
    pub closed_at: Option<DateTime<Utc>>,
    #[serde(default, rename = "code_written_lines")]
    pub human_written_lines: Option<u64>,
    #[serde(default, rename = "code_ai_generated_lines")]
    pub ai_generated_lines: Option<u64>,
    #[serde(default)]
    pub files_produced: Vec<FileLineCount>,
    #[serde(default)]
    pub total_lines: Option<u64>,
    /// Active-editing summary from the time-tracking service
    #[serde(default, rename = "wakatime", skip_serializing_if = "Option::is_none")]
    pub time_tracking: Option<TimeTrackingSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_estimate_note: Option<String>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl Session {
    /// Create an open session.
    pub fn open(artifact: &Artifact, session_number: u32, opened_at: DateTime<Utc>) -> Self {
        Self {
            artifact_id: artifact.id,
            artifact_slug: artifact.slug.clone(),
            session_number,
            opened_at,
            date: opened_at.date_naive(),
            duration_minutes: None,
            ai_tools_used: Vec::new(),
            closed: false,
            closed_at: None,
            human_written_lines: None,
            ai_generated_lines: None,
            files_produced: Vec::new(),
            total_lines: None,
            time_tracking: None,
            duration_estimate_note: None,
            extra: ExtraFields::new(),
        }
    }

    /// Externally measured active-editing seconds, if any were recorded.
    pub fn active_seconds(&self) -> Option<f64> {
        self.time_tracking.as_ref().map(|t| t.total_seconds)
    }
}

// ============================================
// Time tracking
// ============================================

/// Per-language active time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageTime {
    pub seconds: f64,
    #[serde(default)]
    pub percent: f64,
}

/// Active time spent on one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileTime {
    /// File basename
    pub name: String,
    pub seconds: f64,
}

/// Compact per-day summary from the time-tracking service.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TimeTrackingSummary {
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub total_seconds: f64,
    #[serde(default)]
    pub total_text: String,
    /// Keyed `<category>_seconds`, e.g. `coding_seconds`
    #[serde(default)]
    pub categories: IndexMap<String, f64>,
    /// In the service's order, most active first
    #[serde(default)]
    pub languages: IndexMap<String, LanguageTime>,
    #[serde(default)]
    pub files: Vec<FileTime>,
    #[serde(default)]
    pub machine: Option<String>,
    #[serde(default)]
    pub editor: Option<String>,
}
