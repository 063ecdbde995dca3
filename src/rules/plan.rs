use crate::config::types::LoadedRules;
use crate::error::Result;
use crate::rules::rewriter::RewriteRule;
use std::path::{Path, PathBuf};

/// A target file together with every rule that applies to it, in order.
#[derive(Debug, Clone)]
pub struct PlanEntry {
	/// Path as written in the rule file, used in status lines.
	pub name: String,

	/// Path resolved against the base directory.
	pub path: PathBuf,

	/// Rules to apply, in declaration order.
	pub rules: Vec<RewriteRule>,
}

/// The compiled, ordered batch of files to patch.
#[derive(Debug, Clone, Default)]
pub struct PatchPlan {
	/// Directory relative targets were resolved against.
	pub base_dir: PathBuf,

	/// Entries in first-declared order.
	pub entries: Vec<PlanEntry>,
}

impl PatchPlan {
	/// Total number of rules across all entries.
	pub fn rule_count(&self) -> usize {
		self.entries.iter().map(|entry| entry.rules.len()).sum()
	}
}

/// Compile a loaded rule file into a plan.
///
/// Every pattern is compiled up front, so an invalid rule fails the whole
/// plan before any file is read. A file named by several patches gets one
/// entry, positioned where it was first named, with the rules of each
/// patch appended in order.
pub fn compile_plan(loaded: &LoadedRules, base_dir_override: Option<&Path>) -> Result<PatchPlan> {
	let base_dir = base_dir_override
		.map(Path::to_path_buf)
		.unwrap_or_else(|| loaded.base_dir());
	let defaults = loaded.rules.flags;

	let mut plan = PatchPlan {
		base_dir,
		entries: Vec::new(),
	};

	for patch in &loaded.rules.patches {
		let rules = patch
			.rules
			.iter()
			.map(|rule| RewriteRule::compile(rule, defaults))
			.collect::<Result<Vec<_>>>()?;

		for target in patch.targets() {
			let path = plan.base_dir.join(target);
			match plan.entries.iter().position(|entry| entry.path == path) {
				Some(i) => plan.entries[i].rules.extend(rules.iter().cloned()),
				None => plan.entries.push(PlanEntry {
					name: target.display().to_string(),
					path,
					rules: rules.clone(),
				}),
			}
		}
	}

	tracing::debug!(
		files = plan.entries.len(),
		rules = plan.rule_count(),
		base_dir = %plan.base_dir.display(),
		"compiled patch plan"
	);

	Ok(plan)
}
