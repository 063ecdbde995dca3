//! Rewrite rules for patchrun.
//!
//! This module handles:
//! - Compiling rule-file entries into regex rewrite rules
//! - sed-like `s/pattern/replacement/flags` shorthand
//! - Flattening patches into an ordered per-file plan

pub mod plan;
pub mod rewriter;
pub mod substitution;

pub use plan::{PatchPlan, PlanEntry, compile_plan};
pub use rewriter::{RewriteRule, Rewritten, Scope, apply_rules};
pub use substitution::Substitution;
