//! dsqi-session-start - open a development session for an artifact
//!
//! Appends a new open session to the artifact's session log, marks the
//! artifact as in development and moves the study into its development phase.

mod cli;
mod study_lock;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use dsqi_core::session::SessionTracker;

#[derive(Parser)]
#[command(name = "dsqi-session-start")]
#[command(about = "Start a development session for an artifact")]
#[command(version)]
struct Args {
    #[command(flatten)]
    study: cli::StudyArgs,

    /// Artifact id from the registry
    #[arg(short, long)]
    artifact: u32,

    /// AI tool used during the session (repeatable)
    #[arg(long = "ai-tool", default_value = "GitHub Copilot")]
    ai_tools: Vec<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let study = args.study.open()?;
    let _lock = study_lock::acquire_study_lock(&study.root)?;

    let outcome = SessionTracker::new(&study.repo)
        .start(args.artifact, args.ai_tools, Utc::now())
        .with_context(|| format!("failed to start a session for artifact {}", args.artifact))?;

    let session = &outcome.session;
    if outcome.already_developed {
        eprintln!(
            "Warning: artifact {} is already marked developed; starting an additional session.",
            session.artifact_slug
        );
    }
    if let Some(number) = outcome.previously_open {
        eprintln!(
            "Warning: session {} was never closed. Close it with dsqi-session-close.",
            number
        );
    }

    println!("Session started");
    println!("  Artifact:  {} ({})", session.artifact_slug, session.artifact_id);
    println!("  Session:   {}", session.session_number);
    println!("  Opened at: {}", session.opened_at.to_rfc3339());
    println!("  AI tools:  {}", session.ai_tools_used.join(", "));
    println!("  Status:    {}", outcome.status.as_str());
    if outcome.first_session {
        println!("  First session: development start date recorded.");
    }
    println!();
    println!(
        "Close the session with: dsqi-session-close --artifact {}",
        session.artifact_id
    );

    Ok(())
}
