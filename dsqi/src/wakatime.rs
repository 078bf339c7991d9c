//! dsqi-wakatime - fetch a day of WakaTime active time for a project
//!
//! Project names are artifact slugs. With `--save` the raw API response is
//! stored under the development logs, as session close does.

mod cli;
mod study_lock;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::Parser;
use dsqi_core::format::format_seconds;
use dsqi_core::store::paths;
use dsqi_core::timetracking::{extract_summary, fetch_and_record, SyncTimeTrackingClient};
use dsqi_core::TimeTrackingSummary;

#[derive(Parser)]
#[command(name = "dsqi-wakatime")]
#[command(about = "Fetch WakaTime active time for an artifact")]
#[command(version)]
struct Args {
    #[command(flatten)]
    study: cli::StudyArgs,

    /// WakaTime project (the artifact slug)
    #[arg(short, long)]
    project: String,

    /// Day to fetch, YYYY-MM-DD (defaults to today)
    #[arg(short, long)]
    date: Option<NaiveDate>,

    /// Store the raw response under the development logs
    #[arg(long)]
    save: bool,

    /// Print the compact summary as JSON
    #[arg(long, conflicts_with = "json")]
    summary: bool,

    /// Print the raw API response
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let study = args.study.open()?;

    let date = args
        .date
        .unwrap_or_else(|| Utc::now().date_naive())
        .format("%Y-%m-%d")
        .to_string();

    let client = SyncTimeTrackingClient::from_config(&study.config.time_tracking)
        .context("failed to set up the WakaTime client")?;

    let summary = if args.save {
        let _lock = study_lock::acquire_study_lock(&study.root)?;
        let summary = fetch_and_record(&client, &study.repo, &args.project, &date)
            .with_context(|| format!("failed to fetch WakaTime data for {}", args.project))?;
        eprintln!(
            "Saved {}",
            paths::time_tracking_raw(&args.project, &date).display()
        );
        if args.json {
            let raw = study
                .repo
                .read_json_value(&paths::time_tracking_raw(&args.project, &date))?
                .unwrap_or_default();
            println!("{}", serde_json::to_string_pretty(&raw)?);
            return Ok(());
        }
        summary
    } else {
        let raw = client
            .fetch_day(&args.project, &date)
            .with_context(|| format!("failed to fetch WakaTime data for {}", args.project))?;
        if args.json {
            println!("{}", serde_json::to_string_pretty(&raw)?);
            return Ok(());
        }
        extract_summary(&raw)?.map(|mut summary| {
            summary.project = Some(args.project.clone());
            summary
        })
    };

    if args.summary {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    match summary {
        Some(summary) => print_summary(&args.project, &date, &summary),
        None => println!("No WakaTime activity for {} on {}.", args.project, date),
    }
    Ok(())
}

fn print_summary(project: &str, date: &str, summary: &TimeTrackingSummary) {
    println!("WakaTime {} on {}", project, date);
    println!(
        "  Active: {} ({})",
        summary.total_text,
        format_seconds(summary.total_seconds)
    );
    if let Some(editor) = &summary.editor {
        println!("  Editor: {}", editor);
    }
    if let Some(machine) = &summary.machine {
        println!("  Machine: {}", machine);
    }

    if !summary.languages.is_empty() {
        println!("  Languages:");
        for (name, time) in &summary.languages {
            println!(
                "    {:<16} {:>10}  {:>5.1}%",
                name,
                format_seconds(time.seconds),
                time.percent
            );
        }
    }
    if !summary.files.is_empty() {
        println!("  Files:");
        for file in &summary.files {
            println!("    {:<24} {:>10}", file.name, format_seconds(file.seconds));
        }
    }
}
