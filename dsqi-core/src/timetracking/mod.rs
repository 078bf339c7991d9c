//! WakaTime time tracking.
//!
//! Active-editing time is fetched per project (the artifact slug) and day.
//! The raw response is kept under the development logs and a compact
//! [`TimeTrackingSummary`] is attached to the session being closed.

mod client;
mod summary;

pub use client::{read_api_key, SyncTimeTrackingClient, TimeTrackingClient};
pub use summary::extract_summary;

use crate::error::Result;
use crate::store::{Repository, Storage};
use crate::types::TimeTrackingSummary;

/// Fetch a project's day, persist the raw response and summarize it.
///
/// Returns `None` when the API has no data for that day.
pub fn fetch_and_record<S: Storage>(
    client: &SyncTimeTrackingClient,
    repo: &Repository<S>,
    project: &str,
    date: &str,
) -> Result<Option<TimeTrackingSummary>> {
    let raw = client.fetch_day(project, date)?;
    repo.save_time_tracking_raw(project, date, &raw)?;

    let summary = extract_summary(&raw)?.map(|mut summary| {
        summary.project = Some(project.to_string());
        summary
    });
    match &summary {
        Some(s) => tracing::info!(project, date, seconds = s.total_seconds, "Fetched active time"),
        None => tracing::info!(project, date, "No active time recorded"),
    }
    Ok(summary)
}
