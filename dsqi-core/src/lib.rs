//! # dsqi-core
//!
//! Core library for dsqi - the Disposable Software Quality Index toolkit.
//!
//! This library provides:
//! - Domain types for artifacts, development sessions and time tracking
//! - JSON record storage for the study data tree
//! - Metric collection, normalization and DSQI composition
//! - Session lifecycle tracking
//! - Configuration management
//! - Logging infrastructure
//!
//! ## Index
//!
//! ```text
//! DSQI = 0.3·(1 - M) + 0.2·(1 - C) + 0.3·P + 0.2·E
//! ```
//!
//! M (maintenance cost) and C (creation cost) are collected from the
//! artifact's source tree and development log. P (pedagogical alignment)
//! and E (pedagogical purity) come from human reviewers, so the index stays
//! unset until both are recorded.
//!
//! ## Example
//!
//! ```rust,no_run
//! use dsqi_core::metrics::{CollectOptions, LexicalEstimator, LineCounter, MetricCollector};
//! use dsqi_core::{Config, FsStorage, Repository};
//!
//! let config = Config::load().expect("failed to load config");
//! let root = config.study.resolve_root(None);
//! let repo = Repository::new(FsStorage::new(&root));
//!
//! let line_counter = LineCounter::new(&config.line_count).expect("invalid line count config");
//! let collector = MetricCollector::new(
//!     &repo,
//!     &root,
//!     Box::new(LexicalEstimator),
//!     Box::new(line_counter),
//! );
//! let summary = collector
//!     .collect(1, &CollectOptions::default(), chrono::Utc::now())
//!     .expect("collection failed");
//! println!("M = {:.4}", summary.result.m_score());
//! ```

// Re-export commonly used items at the crate root
pub use config::Config;
pub use error::{Error, Result};
pub use store::{FsStorage, MemoryStorage, Repository, Storage};
pub use types::*;

// Public modules
pub mod config;
pub mod error;
pub mod format;
pub mod logging;
pub mod metrics;
pub mod session;
pub mod status;
pub mod store;
pub mod timetracking;
pub mod types;
pub mod validate;
