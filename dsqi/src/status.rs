//! dsqi-status - show the progress of every artifact in the study

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use dsqi_core::format::{format_score_opt, MISSING};
use dsqi_core::status::study_status;

#[derive(Parser)]
#[command(name = "dsqi-status")]
#[command(about = "Show the status of all study artifacts")]
#[command(version)]
struct Args {
    #[command(flatten)]
    study: cli::StudyArgs,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let study = args.study.open()?;

    let status = study_status(&study.repo).context("failed to read study status")?;

    println!("{}", status.study.title);
    println!("  Phase:   {}", status.study.current_phase);
    println!(
        "  Journal: {}",
        status.study.target_journal.as_deref().unwrap_or(MISSING)
    );
    println!();

    if status.rows.is_empty() {
        println!("No artifacts registered.");
        return Ok(());
    }

    let name_width = status
        .rows
        .iter()
        .map(|r| r.name.chars().count())
        .max()
        .unwrap_or(4)
        .max(4);
    println!(
        "{:>3}  {:<name_width$}  {:<14}  {:>8}  {:>6}  {:>7}  {:>11}",
        "ID", "Name", "Status", "Sessions", "DSQI", "Experts", "Coordinator",
        name_width = name_width
    );
    for row in &status.rows {
        println!(
            "{:>3}  {:<name_width$}  {:<14}  {:>8}  {:>6}  {:>7}  {:>11}",
            row.id,
            row.name,
            row.status.as_str(),
            row.sessions,
            format_score_opt(row.dsqi_score),
            row.expert_reviews,
            if row.coordinator_review { "yes" } else { MISSING },
            name_width = name_width
        );
    }

    Ok(())
}
