//! dsqi-session-close - close the open development session of an artifact
//!
//! Counts the lines of the artifact's source files, optionally attaches the
//! day's WakaTime active time, and records the closing. With `--final` the
//! artifact is marked developed and its development totals are written to
//! the registry.

mod cli;
mod study_lock;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use dsqi_core::format::{format_minutes, format_seconds};
use dsqi_core::metrics::count_dependencies;
use dsqi_core::metrics::source::count_source_lines;
use dsqi_core::session::{CloseDetails, CloseRequest, FinalDetails, SessionTracker};
use dsqi_core::store::paths;
use dsqi_core::timetracking::{fetch_and_record, SyncTimeTrackingClient};
use dsqi_core::{FileLineCount, Storage, TimeTrackingSummary};

#[derive(Parser)]
#[command(name = "dsqi-session-close")]
#[command(about = "Close the open development session of an artifact")]
#[command(version)]
struct Args {
    #[command(flatten)]
    study: cli::StudyArgs,

    /// Artifact id from the registry
    #[arg(short, long)]
    artifact: u32,

    /// Mark the artifact as developed and record its totals
    #[arg(long = "final")]
    finalize: bool,

    /// Comma-separated tech stack recorded with --final
    #[arg(long, value_delimiter = ',')]
    tech: Option<Vec<String>>,

    /// Production dependency count recorded with --final
    /// (defaults to the count found in the source manifests)
    #[arg(long)]
    deps: Option<u32>,

    /// Share of the session's lines generated by AI, in [0, 1]
    #[arg(long, default_value_t = 1.0)]
    ai_ratio: f64,

    /// Do not query WakaTime for active editor time
    #[arg(long)]
    skip_wakatime: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    if !(0.0..=1.0).contains(&args.ai_ratio) {
        anyhow::bail!("--ai-ratio must be between 0 and 1, got {}", args.ai_ratio);
    }

    let study = args.study.open()?;
    let _lock = study_lock::acquire_study_lock(&study.root)?;

    let artifact = study
        .repo
        .find_artifact(args.artifact)
        .with_context(|| format!("failed to look up artifact {}", args.artifact))?;
    let slug = artifact.slug.clone();
    if !study
        .repo
        .storage()
        .exists(&paths::session_log(&slug))
    {
        anyhow::bail!(
            "no session log for {}. Start a session first with dsqi-session-start --artifact {}",
            slug,
            artifact.id
        );
    }

    let source_dir = paths::source_dir(&study.root, &slug);
    let files = if source_dir.is_dir() {
        count_source_lines(&source_dir)
            .with_context(|| format!("failed to count lines in {}", source_dir.display()))?
    } else {
        eprintln!("Warning: source directory not found: {}", source_dir.display());
        Vec::new()
    };
    print_line_counts(&files);

    let time_tracking = if study.config.time_tracking.enabled && !args.skip_wakatime {
        fetch_time_tracking(&study, &slug)
    } else {
        None
    };

    let finalize = args.finalize.then(|| FinalDetails {
        dependency_count: args
            .deps
            .unwrap_or_else(|| count_dependencies(&source_dir).dependency_count),
        tech_stack: args.tech.as_deref().map(tech_stack),
    });

    let report = SessionTracker::new(&study.repo)
        .close(
            CloseRequest {
                artifact_id: args.artifact,
                details: CloseDetails {
                    files,
                    ai_ratio: args.ai_ratio,
                    time_tracking,
                },
                finalize,
            },
            Utc::now(),
        )
        .with_context(|| format!("failed to close the session of {}", slug))?;

    let outcome = &report.outcome;
    if outcome.amended_last {
        eprintln!(
            "Warning: no open session for {}; amended the last session ({}).",
            slug, outcome.session_number
        );
    }

    println!();
    println!("Session {} closed", outcome.session_number);
    println!("  Closed at:   {}", outcome.closed_at.to_rfc3339());
    println!("  Duration:    {}", format_minutes(outcome.duration_minutes));
    println!("  Total lines: {}", outcome.total_lines);
    println!("  AI lines:    {}", outcome.ai_generated_lines);
    println!("  Human lines: {}", outcome.human_written_lines);

    if report.finalized {
        let dev = &report.artifact.development;
        println!();
        println!("Artifact {} marked {}", slug, report.artifact.status.as_str());
        println!("  Sessions:     {}", dev.total_sessions.unwrap_or_default());
        println!(
            "  Total time:   {}",
            format_minutes(dev.total_duration_minutes.unwrap_or_default())
        );
        if let Some(seconds) = dev.wakatime_active_seconds {
            println!("  Active time:  {}", format_seconds(seconds));
        }
        println!("  Dependencies: {}", dev.dependency_count.unwrap_or_default());
        if !report.artifact.tech_stack.is_empty() {
            println!("  Tech stack:   {}", report.artifact.tech_stack.join(", "));
        }
        println!();
        println!("Next: dsqi-collect --artifact {}", report.artifact.id);
    }

    Ok(())
}

/// Trimmed, non-empty `--tech` entries.
fn tech_stack(raw: &[String]) -> Vec<String> {
    raw.iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

fn print_line_counts(files: &[FileLineCount]) {
    if files.is_empty() {
        println!("No source files found.");
        return;
    }
    let width = files.iter().map(|f| f.file.len()).max().unwrap_or(4).max(4);
    println!("{:<width$}  {:>6}  Language", "File", "Lines", width = width);
    for file in files {
        println!(
            "{:<width$}  {:>6}  {}",
            file.file,
            file.lines,
            file.language,
            width = width
        );
    }
    let total: u64 = files.iter().map(|f| f.lines).sum();
    println!("{:<width$}  {:>6}", "Total", total, width = width);
}

/// Today's active time for the artifact; any failure only skips it.
fn fetch_time_tracking(study: &cli::Study, slug: &str) -> Option<TimeTrackingSummary> {
    let date = Utc::now().date_naive().format("%Y-%m-%d").to_string();
    let result = SyncTimeTrackingClient::from_config(&study.config.time_tracking)
        .and_then(|client| fetch_and_record(&client, &study.repo, slug, &date));

    match result {
        Ok(Some(summary)) => {
            println!(
                "WakaTime: {} active ({})",
                summary.total_text,
                format_seconds(summary.total_seconds)
            );
            Some(summary)
        }
        Ok(None) => {
            println!("WakaTime: no activity recorded for {} on {}", slug, date);
            None
        }
        Err(e) => {
            eprintln!("Warning: WakaTime lookup failed, continuing without it: {}", e);
            None
        }
    }
}
