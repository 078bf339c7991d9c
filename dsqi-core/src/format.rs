//! Formatting helpers shared by the command-line tools.

/// Placeholder for values not yet available.
pub const MISSING: &str = "—";

/// Format an optional score with three decimals, or a dash if missing.
pub fn format_score_opt(score: Option<f64>) -> String {
    match score {
        Some(score) => format!("{:.3}", score),
        None => MISSING.to_string(),
    }
}

/// Format seconds as minutes and seconds (e.g., "45m 12s").
pub fn format_seconds(seconds: f64) -> String {
    let whole = seconds.max(0.0) as u64;
    format!("{}m {}s", whole / 60, whole % 60)
}

/// Format minutes compactly (e.g., "1h 05m", "42m").
pub fn format_minutes(minutes: i64) -> String {
    if minutes.abs() < 60 {
        format!("{}m", minutes)
    } else {
        format!("{}h {:02}m", minutes / 60, (minutes % 60).abs())
    }
}
