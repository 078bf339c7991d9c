//! dsqi-validate - check the study data files for consistency

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use dsqi_core::validate::{validate, ValidationTarget};

#[derive(Parser)]
#[command(name = "dsqi-validate")]
#[command(about = "Validate study data files")]
#[command(version)]
struct Args {
    #[command(flatten)]
    study: cli::StudyArgs,

    /// What to validate: registry, sessions, dsqi, reviews or all
    #[arg(short, long, default_value = "all")]
    target: ValidationTarget,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let study = args.study.open()?;

    let report = validate(&study.repo, args.target)
        .with_context(|| format!("failed to validate {}", args.target))?;

    if report.entries.is_empty() {
        println!("Nothing to validate for target '{}'.", args.target);
        return Ok(());
    }

    for entry in &report.entries {
        if entry.is_ok() {
            println!("✓ {}", entry.path);
        } else {
            println!("✗ {}", entry.path);
            for problem in &entry.problems {
                println!("    - {}", problem);
            }
        }
    }
    println!();

    if !report.is_ok() {
        anyhow::bail!(
            "validation failed: {} problem(s) in {} file(s)",
            report.problem_count(),
            report.entries.iter().filter(|e| !e.is_ok()).count()
        );
    }
    println!("All {} file(s) valid.", report.entries.len());
    Ok(())
}
