//! Compact summaries of WakaTime summaries-API responses.

use crate::error::Result;
use crate::types::{FileTime, LanguageTime, TimeTrackingSummary};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct SummariesResponse {
    #[serde(default)]
    data: Vec<DaySummary>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DaySummary {
    grand_total: GrandTotal,
    range: Range,
    categories: Vec<NamedDuration>,
    languages: Vec<NamedDuration>,
    entities: Vec<NamedDuration>,
    machines: Vec<NamedDuration>,
    editors: Vec<NamedDuration>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GrandTotal {
    total_seconds: f64,
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Range {
    date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct NamedDuration {
    name: String,
    total_seconds: f64,
    percent: f64,
}

/// `Coding` -> `coding_seconds`, `AI Coding` -> `ai_coding_seconds`.
fn category_key(name: &str) -> String {
    format!("{}_seconds", name.to_lowercase().replace(' ', "_"))
}

/// Last path component, for either separator.
fn basename(name: &str) -> &str {
    name.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(name)
}

/// Summarize the first day of a summaries response.
///
/// A response without days yields `None`.
pub fn extract_summary(raw: &serde_json::Value) -> Result<Option<TimeTrackingSummary>> {
    let response: SummariesResponse = serde_json::from_value(raw.clone())?;
    let Some(day) = response.data.into_iter().next() else {
        return Ok(None);
    };

    let summary = TimeTrackingSummary {
        project: None,
        date: day.range.date,
        total_seconds: day.grand_total.total_seconds,
        total_text: day
            .grand_total
            .text
            .unwrap_or_else(|| "0 secs".to_string()),
        categories: day
            .categories
            .iter()
            .map(|c| (category_key(&c.name), c.total_seconds))
            .collect(),
        languages: day
            .languages
            .iter()
            .map(|l| {
                (
                    l.name.clone(),
                    LanguageTime {
                        seconds: l.total_seconds,
                        percent: l.percent,
                    },
                )
            })
            .collect(),
        files: day
            .entities
            .iter()
            .map(|e| FileTime {
                name: basename(&e.name).to_string(),
                seconds: e.total_seconds,
            })
            .collect(),
        machine: day.machines.first().map(|m| m.name.clone()),
        editor: day.editors.first().map(|e| e.name.clone()),
    };
    Ok(Some(summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response() -> serde_json::Value {
        json!({
            "data": [{
                "grand_total": {"total_seconds": 2712.4, "text": "45 mins", "digital": "0:45"},
                "range": {"date": "2026-02-18", "timezone": "Europe/London"},
                "categories": [
                    {"name": "Coding", "total_seconds": 2000.0},
                    {"name": "AI Coding", "total_seconds": 712.4}
                ],
                "languages": [
                    {"name": "JavaScript", "total_seconds": 1800.0, "percent": 66.4},
                    {"name": "HTML", "total_seconds": 912.4, "percent": 33.6}
                ],
                "entities": [
                    {"name": "/home/dev/study/artifacts/01-quiz/src/game.js", "total_seconds": 1500.0},
                    {"name": "C:\\study\\artifacts\\01-quiz\\src\\index.html", "total_seconds": 900.0}
                ],
                "machines": [{"name": "lab-laptop", "total_seconds": 2712.4}, {"name": "desk", "total_seconds": 1.0}],
                "editors": [{"name": "VS Code", "total_seconds": 2712.4}]
            }],
            "cumulative_total": {"seconds": 2712.4}
        })
    }

    #[test]
    fn test_extract_summary() {
        let summary = extract_summary(&response()).unwrap().unwrap();
        assert_eq!(summary.date.as_deref(), Some("2026-02-18"));
        assert_eq!(summary.total_seconds, 2712.4);
        assert_eq!(summary.total_text, "45 mins");
        assert_eq!(summary.categories["coding_seconds"], 2000.0);
        assert_eq!(summary.categories["ai_coding_seconds"], 712.4);
        assert_eq!(summary.languages["HTML"].percent, 33.6);
        let languages: Vec<_> = summary.languages.keys().map(String::as_str).collect();
        assert_eq!(languages, vec!["JavaScript", "HTML"]);
        let categories: Vec<_> = summary.categories.keys().map(String::as_str).collect();
        assert_eq!(categories, vec!["coding_seconds", "ai_coding_seconds"]);
        assert_eq!(summary.files[0].name, "game.js");
        assert_eq!(summary.files[1].name, "index.html");
        assert_eq!(summary.machine.as_deref(), Some("lab-laptop"));
        assert_eq!(summary.editor.as_deref(), Some("VS Code"));
        assert_eq!(summary.project, None);
    }

    #[test]
    fn test_empty_data_has_no_summary() {
        assert_eq!(extract_summary(&json!({"data": []})).unwrap(), None);
        assert_eq!(extract_summary(&json!({})).unwrap(), None);
    }

    #[test]
    fn test_sparse_day_uses_defaults() {
        let summary = extract_summary(&json!({"data": [{}]})).unwrap().unwrap();
        assert_eq!(summary.total_seconds, 0.0);
        assert_eq!(summary.total_text, "0 secs");
        assert!(summary.files.is_empty());
        assert_eq!(summary.machine, None);
    }

    #[test]
    fn test_malformed_response_is_an_error() {
        assert!(extract_summary(&json!({"data": "nope"})).is_err());
    }
}
