//! dsqi-collect - collect the automated DSQI metrics of an artifact
//!
//! Runs the dependency, complexity, deployment, line-count and development
//! time collectors over an artifact's source tree and session log, then
//! writes the complexity report, the line-count report and the partial DSQI
//! result (M and C; P and E come from reviewers).

mod cli;
mod study_lock;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use dsqi_core::format::format_minutes;
use dsqi_core::metrics::{
    CollectOptions, CollectionSummary, DeploymentOverride, LexicalEstimator, LineCounter,
    MetricCollector,
};
use dsqi_core::store::paths;

#[derive(Parser)]
#[command(name = "dsqi-collect")]
#[command(about = "Collect automated DSQI metrics for an artifact")]
#[command(version)]
struct Args {
    #[command(flatten)]
    study: cli::StudyArgs,

    /// Artifact id from the registry
    #[arg(short, long)]
    artifact: u32,

    /// Override the detected number of deployment steps
    #[arg(long)]
    deployment_steps: Option<u32>,

    /// Override the detected deployment method label
    #[arg(long)]
    deploy_method: Option<String>,

    /// Comma-separated deployment steps (replaces detection entirely)
    #[arg(long)]
    deploy_steps_desc: Option<String>,

    /// Discard reviewer P/E scores from an earlier result
    #[arg(long)]
    reset_human_scores: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let study = args.study.open()?;
    let _lock = study_lock::acquire_study_lock(&study.root)?;

    let mut deployment = DeploymentOverride {
        method: args.deploy_method.clone(),
        steps_count: args.deployment_steps,
        ..Default::default()
    };
    if let Some(csv) = &args.deploy_steps_desc {
        deployment = deployment.with_steps_csv(csv);
    }
    let options = CollectOptions {
        deployment,
        reset_human_scores: args.reset_human_scores,
    };

    let line_counter =
        LineCounter::new(&study.config.line_count).context("invalid [line_count] configuration")?;
    let collector = MetricCollector::new(
        &study.repo,
        &study.root,
        Box::new(LexicalEstimator),
        Box::new(line_counter),
    );

    let summary = collector
        .collect(args.artifact, &options, Utc::now())
        .with_context(|| format!("failed to collect metrics for artifact {}", args.artifact))?;

    print_summary(&summary);
    Ok(())
}

fn print_summary(summary: &CollectionSummary) {
    let slug = &summary.artifact.slug;
    let result = &summary.result;
    let m = &result.maintenance_cost;
    let c = &result.creation_cost;

    println!("DSQI collection: {} ({})", summary.artifact.name, slug);
    println!("  Source: {}", summary.source_dir.display());
    println!();

    println!("Maintenance cost (M)");
    println!(
        "  Dependencies:      {:>6}  -> {:.4}",
        m.dependency_count, m.dependency_count_normalized
    );
    println!(
        "  Avg complexity:    {:>6.2}  -> {:.4}",
        m.cyclomatic_complexity_avg, m.cyclomatic_complexity_normalized
    );
    println!(
        "  Deployment steps:  {:>6}  -> {:.4}  ({})",
        m.deployment_steps, m.deployment_steps_normalized, summary.deployment.method
    );
    println!("  M = {:.4}", m.m_score);
    println!();

    println!("Creation cost (C)");
    println!(
        "  Lines of code:     {:>6}  -> {:.4}",
        c.lines_of_code, c.lines_of_code_normalized
    );
    println!(
        "  Development time:  {:>6}  -> {:.4}",
        format_minutes(c.development_time_minutes),
        c.development_time_normalized
    );
    println!("  AI ratio:          {:>6.4}", c.ai_generation_ratio);
    println!("  C = {:.4}", c.c_score);
    println!();

    if summary.line_count.is_empty() {
        eprintln!("Warning: no line-count tool produced output; lines of code recorded as 0.");
    }
    if summary.missing_session_log {
        eprintln!(
            "Warning: no session log for {}; development time and AI ratio use defaults.",
            slug
        );
    }

    println!("DSQI = 0.3×(1-M) + 0.2×(1-C) + 0.3×P + 0.2×E");
    println!("  Automated part: {:.4}", summary.partial_index());
    match result.dsqi_score() {
        Some(score) if summary.preserved_human_scores => {
            println!("  Reviewer scores carried over, DSQI = {:.4}", score)
        }
        _ => println!("  P and E pending expert review"),
    }
    println!();
    println!("Wrote {}", paths::dsqi_result(slug).display());
}
