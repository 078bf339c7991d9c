//! Development session lifecycle.
//!
//! A session is opened by "start" and amended exactly once by "close".
//! Numbering is `len + 1` over the artifact's log, so numbers stay
//! contiguous even when an earlier session was never closed.
//!
//! The free functions operate on in-memory records only; [`SessionTracker`]
//! wraps them with loading and saving through a [`Repository`].

use crate::error::{Error, Result};
use crate::metrics::normalize::round_to;
use crate::store::{Repository, Storage};
use crate::types::{
    Artifact, ArtifactStatus, FileLineCount, Session, TimeTrackingSummary, PHASE_DEVELOPMENT,
};
use chrono::{DateTime, Utc};
use serde_json::{json, Value};

/// Journal fields seeded empty on every new session, for the developer
/// to fill in by hand.
fn journal_fields() -> [(&'static str, Value); 6] {
    [
        ("prompts", json!([])),
        ("prompt_strategy", Value::Null),
        ("outcome", Value::Null),
        ("observations", Value::Null),
        ("prompts_count", json!(0)),
        ("challenges", json!([])),
    ]
}

/// What "start" did.
#[derive(Debug, Clone, PartialEq)]
pub struct StartOutcome {
    pub session: Session,
    /// This is the artifact's first session
    pub first_session: bool,
    /// Number of an earlier session still open when this one started
    pub previously_open: Option<u32>,
    /// The artifact was already marked developed
    pub already_developed: bool,
    pub status: ArtifactStatus,
}

/// Open the next session of `artifact`.
pub fn open_session(
    artifact: &mut Artifact,
    sessions: &mut Vec<Session>,
    now: DateTime<Utc>,
    ai_tools: Vec<String>,
) -> StartOutcome {
    let already_developed = artifact.status == ArtifactStatus::Developed;
    if already_developed {
        tracing::warn!(artifact = %artifact.slug, "Artifact already developed, starting an additional session");
    }

    let previously_open = sessions.iter().rev().find(|s| !s.closed).map(|s| s.session_number);
    if let Some(number) = previously_open {
        tracing::warn!(artifact = %artifact.slug, session = number, "Earlier session is still open");
    }

    if artifact.status == ArtifactStatus::NotStarted {
        artifact.status = ArtifactStatus::InDevelopment;
    }
    let first_session = artifact.development.start_date.is_none();
    if first_session {
        artifact.development.start_date = Some(now);
    }

    let mut session = Session::open(artifact, sessions.len() as u32 + 1, now);
    session.ai_tools_used = ai_tools;
    for (key, empty) in journal_fields() {
        session.extra.insert(key.to_string(), empty);
    }
    sessions.push(session.clone());

    tracing::info!(artifact = %artifact.slug, session = session.session_number, "Session started");

    StartOutcome {
        session,
        first_session,
        previously_open,
        already_developed,
        status: artifact.status,
    }
}

/// Measurements attached to a session at close.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CloseDetails {
    pub files: Vec<FileLineCount>,
    /// Share of lines attributed to AI tools, within `[0, 1]`
    pub ai_ratio: f64,
    pub time_tracking: Option<TimeTrackingSummary>,
}

impl CloseDetails {
    pub fn total_lines(&self) -> u64 {
        self.files.iter().map(|f| f.lines).sum()
    }
}

/// What "close" did.
#[derive(Debug, Clone, PartialEq)]
pub struct CloseOutcome {
    pub session_number: u32,
    pub closed_at: DateTime<Utc>,
    pub duration_minutes: i64,
    /// No session was open, so the last one was amended
    pub amended_last: bool,
    pub total_lines: u64,
    pub ai_generated_lines: u64,
    pub human_written_lines: u64,
}

fn validate_ratio(ai_ratio: f64) -> Result<()> {
    if (0.0..=1.0).contains(&ai_ratio) {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!(
            "AI ratio must be within [0, 1], got {}",
            ai_ratio
        )))
    }
}

/// Close the most recent open session of a log.
///
/// Without an open session the last session is amended instead.
pub fn close_session(
    slug: &str,
    sessions: &mut [Session],
    details: CloseDetails,
    now: DateTime<Utc>,
) -> Result<CloseOutcome> {
    validate_ratio(details.ai_ratio)?;

    let open_index = sessions.iter().rposition(|s| !s.closed);
    let amended_last = open_index.is_none();
    let index = match open_index {
        Some(index) => index,
        None if sessions.is_empty() => return Err(Error::NoSessions(slug.to_string())),
        None => {
            tracing::warn!(artifact = %slug, "No open session, amending the last session");
            sessions.len() - 1
        }
    };
    let session = &mut sessions[index];

    let elapsed_ms = (now - session.opened_at).num_milliseconds();
    let duration_minutes = (elapsed_ms as f64 / 60_000.0).round() as i64;

    let total_lines = details.total_lines();
    let ai_generated_lines = (total_lines as f64 * details.ai_ratio).round() as u64;
    let human_written_lines = total_lines - ai_generated_lines;

    let active_text = details
        .time_tracking
        .as_ref()
        .map(|t| t.total_text.clone())
        .unwrap_or_else(|| "N/A".to_string());

    session.duration_minutes = Some(duration_minutes);
    session.closed = true;
    session.closed_at = Some(now);
    session.ai_generated_lines = Some(ai_generated_lines);
    session.human_written_lines = Some(human_written_lines);
    session.files_produced = details.files;
    session.total_lines = Some(total_lines);
    if details.time_tracking.is_some() {
        session.time_tracking = details.time_tracking;
    }
    session.duration_estimate_note = Some(format!(
        "Session wall-clock time approx {} mins. WakaTime active editor time: {}.",
        duration_minutes, active_text
    ));

    tracing::info!(
        artifact = %slug,
        session = session.session_number,
        duration_minutes,
        total_lines,
        "Session closed"
    );

    Ok(CloseOutcome {
        session_number: session.session_number,
        closed_at: now,
        duration_minutes,
        amended_last,
        total_lines,
        ai_generated_lines,
        human_written_lines,
    })
}

/// Facts recorded when an artifact is finalized.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FinalDetails {
    pub dependency_count: u32,
    pub tech_stack: Option<Vec<String>>,
}

/// Mark an artifact developed and record its development totals.
pub fn finalize_artifact(
    artifact: &mut Artifact,
    sessions: &[Session],
    details: FinalDetails,
    ai_ratio: f64,
    total_lines: u64,
    now: DateTime<Utc>,
) {
    let development = &mut artifact.development;
    development.end_date = Some(now);
    development.lines_of_code = Some(total_lines);
    development.dependency_count = Some(details.dependency_count);
    development.ai_generation_ratio = Some(ai_ratio);
    development.total_sessions = Some(sessions.len() as u32);
    development.total_duration_minutes =
        Some(sessions.iter().filter_map(|s| s.duration_minutes).sum());

    let tracked: Vec<f64> = sessions.iter().filter_map(Session::active_seconds).collect();
    if !tracked.is_empty() {
        development.wakatime_active_seconds = Some(round_to(tracked.iter().sum(), 2));
    }

    if let Some(stack) = details.tech_stack {
        artifact.tech_stack = stack;
    }
    artifact.status = ArtifactStatus::Developed;

    tracing::info!(artifact = %artifact.slug, total_lines, "Artifact finalized");
}

/// Close request for [`SessionTracker::close`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CloseRequest {
    pub artifact_id: u32,
    pub details: CloseDetails,
    /// Finalize the artifact after closing
    pub finalize: Option<FinalDetails>,
}

/// Result of [`SessionTracker::close`].
#[derive(Debug, Clone, PartialEq)]
pub struct CloseReport {
    pub artifact: Artifact,
    pub outcome: CloseOutcome,
    pub finalized: bool,
}

/// Session operations against persisted records.
pub struct SessionTracker<'a, S: Storage> {
    repo: &'a Repository<S>,
}

impl<'a, S: Storage> SessionTracker<'a, S> {
    pub fn new(repo: &'a Repository<S>) -> Self {
        Self { repo }
    }

    /// Start a session and move the study into its development phase.
    pub fn start(
        &self,
        artifact_id: u32,
        ai_tools: Vec<String>,
        now: DateTime<Utc>,
    ) -> Result<StartOutcome> {
        let mut registry = self.repo.load_registry()?;
        let artifact = registry
            .artifact_mut(artifact_id)
            .ok_or(Error::ArtifactNotFound(artifact_id))?;
        let slug = artifact.slug.clone();

        let mut sessions = self.repo.load_sessions(&slug)?.unwrap_or_default();
        let outcome = open_session(artifact, &mut sessions, now, ai_tools);
        registry.study.current_phase = PHASE_DEVELOPMENT.to_string();

        self.repo.save_sessions(&slug, &sessions)?;
        self.repo.save_registry(&registry)?;
        Ok(outcome)
    }

    /// Close the open session, optionally finalizing the artifact.
    ///
    /// The registry is only rewritten when finalizing.
    pub fn close(&self, request: CloseRequest, now: DateTime<Utc>) -> Result<CloseReport> {
        let mut registry = self.repo.load_registry()?;
        let artifact = registry
            .artifact_mut(request.artifact_id)
            .ok_or(Error::ArtifactNotFound(request.artifact_id))?;
        let slug = artifact.slug.clone();

        let mut sessions = self.repo.sessions(&slug)?;
        let ai_ratio = request.details.ai_ratio;
        let outcome = close_session(&slug, &mut sessions, request.details, now)?;

        let finalized = request.finalize.is_some();
        if let Some(details) = request.finalize {
            finalize_artifact(artifact, &sessions, details, ai_ratio, outcome.total_lines, now);
        }
        let artifact = artifact.clone();

        self.repo.save_sessions(&slug, &sessions)?;
        if finalized {
            self.repo.save_registry(&registry)?;
        }

        Ok(CloseReport {
            artifact,
            outcome,
            finalized,
        })
    }
}
