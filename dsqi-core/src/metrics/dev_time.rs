//! Development time and AI attribution totals over a session log.

use crate::metrics::normalize::round_to;
use crate::types::Session;
use serde::{Deserialize, Serialize};

/// Totals over every session of one artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DevTimeTotals {
    pub wall_clock_minutes: i64,
    pub wakatime_seconds: f64,
    pub sessions: usize,
    pub ai_generated_lines: u64,
    pub human_written_lines: u64,
    pub total_lines: u64,
    /// AI-attributed share of all lines, 4 decimals
    pub ai_ratio: f64,
}

impl Default for DevTimeTotals {
    fn default() -> Self {
        Self {
            wall_clock_minutes: 0,
            wakatime_seconds: 0.0,
            sessions: 0,
            ai_generated_lines: 0,
            human_written_lines: 0,
            total_lines: 0,
            ai_ratio: 1.0,
        }
    }
}

/// Sum a session log. Absent values count as zero.
///
/// Without any attributed lines the AI ratio is 1.0.
pub fn aggregate_sessions(sessions: &[Session]) -> DevTimeTotals {
    let mut totals = sessions
        .iter()
        .fold(DevTimeTotals::default(), |mut acc, s| {
            acc.wall_clock_minutes += s.duration_minutes.unwrap_or(0);
            acc.wakatime_seconds += s.active_seconds().unwrap_or(0.0);
            acc.ai_generated_lines += s.ai_generated_lines.unwrap_or(0);
            acc.human_written_lines += s.human_written_lines.unwrap_or(0);
            acc.total_lines += s.total_lines.unwrap_or(0);
            acc
        });

    totals.sessions = sessions.len();
    totals.ai_ratio = if totals.total_lines > 0 {
        round_to(totals.ai_generated_lines as f64 / totals.total_lines as f64, 4)
    } else {
        1.0
    };
    totals
}
