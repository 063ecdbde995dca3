//! Rule file loading and parsing for patchrun.
//!
//! This module handles:
//! - TOML rule file parsing and validation
//! - Upward discovery of `.patchrun.toml`
//! - The `--init` starter template

pub mod discover;
pub mod parser;
pub mod template;
pub mod types;

pub use discover::{RULES_FILE_NAME, discover_rules_file, load_rules};
pub use parser::{parse_rules_file, parse_rules_str};
pub use template::generate_init_template;
pub use types::{LoadedRules, Patch, PatternFlags, Rule, RuleFile};
