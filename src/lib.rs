//! patchrun - batch text patching with ordered regex rewrite rules.
//!
//! This library provides the core functionality for patchrun, including:
//! - Rule file parsing and discovery
//! - Compiling rules into an ordered per-file plan
//! - Applying rules to files with atomic, change-only writes
//! - Per-file status reporting
//!
//! # Example
//!
//! ```no_run
//! use patchrun_cli::config::load_rules;
//! use patchrun_cli::rules::compile_plan;
//! use patchrun_cli::runner::{RunOptions, run_plan};
//!
//! let cwd = std::env::current_dir().unwrap();
//! let loaded = load_rules(None, &cwd).unwrap();
//! let plan = compile_plan(&loaded, None).unwrap();
//!
//! let report = run_plan(&plan, RunOptions::default());
//! for file in &report.files {
//!     println!("{}", file.status_line());
//! }
//! ```

pub mod config;
pub mod error;
pub mod report;
pub mod rules;
pub mod runner;

pub use error::{PatchError, Result};
