//! Start-up shared by the dsqi command-line tools.

use anyhow::{Context, Result};
use clap::Args;
use dsqi_core::logging::LoggingGuard;
use dsqi_core::{Config, FsStorage, Repository};
use std::path::PathBuf;

/// Study root selection, common to every tool.
#[derive(Args, Debug)]
pub struct StudyArgs {
    /// Study root directory (overrides `[study] root` in the config file;
    /// defaults to the current directory)
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,
}

/// Loaded configuration, active logging and the study repository.
#[allow(dead_code)]
pub struct Study {
    pub config: Config,
    pub root: PathBuf,
    pub repo: Repository<FsStorage>,
    _log_guard: LoggingGuard,
}

impl StudyArgs {
    /// Load configuration, initialize logging and open the study root.
    pub fn open(&self) -> Result<Study> {
        let config = Config::load().context("failed to load configuration")?;
        let log_guard =
            dsqi_core::logging::init(&config.logging).context("failed to initialize logging")?;

        let root = config.study.resolve_root(self.root.as_deref());
        if !root.is_dir() {
            anyhow::bail!("study root is not a directory: {}", root.display());
        }

        Ok(Study {
            repo: Repository::new(FsStorage::new(&root)),
            config,
            root,
            _log_guard: log_guard,
        })
    }
}
