use crate::error::PatchError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Top-level contents of a `.patchrun.toml` rule file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RuleFile {
	/// Directory that relative target paths are resolved against.
	/// Itself relative to the rule file's directory.
	#[serde(default)]
	pub base_dir: Option<PathBuf>,

	/// Default pattern flags for every rule in this file.
	#[serde(default)]
	pub flags: PatternFlags,

	/// Patches in application order.
	#[serde(default)]
	pub patches: Vec<Patch>,
}

/// Flags controlling how a rule's pattern is compiled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct PatternFlags {
	/// `^` and `$` match at line boundaries.
	#[serde(default)]
	pub multi_line: bool,

	/// `.` also matches line terminators.
	#[serde(default)]
	pub dot_matches_new_line: bool,

	#[serde(default)]
	pub case_insensitive: bool,
}

/// One or more target files and the rules to apply to each of them.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct Patch {
	/// Single target file (mutually exclusive with `files`).
	pub file: Option<PathBuf>,

	/// Several target files sharing the same rules.
	#[serde(default)]
	pub files: Vec<PathBuf>,

	/// Free-form note shown by `rules show`.
	pub description: Option<String>,

	/// Rewrite rules, applied in order.
	#[serde(default)]
	pub rules: Vec<Rule>,
}

/// A single rewrite rule as written in the rule file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct Rule {
	/// Regex pattern to search for.
	pub pattern: Option<String>,

	/// Replacement text. `$1` / `${name}` expand capture groups unless `literal` is set.
	pub replacement: Option<String>,

	/// sed-like shorthand: "s/pattern/replacement/flags".
	/// Mutually exclusive with `pattern` and `replacement`.
	pub substitute: Option<String>,

	/// Match `pattern` as plain text and insert `replacement` verbatim.
	#[serde(default)]
	pub literal: bool,

	/// Replace at most this many matches.
	pub limit: Option<usize>,

	/// Restrict the rule to this 1-based line.
	pub line: Option<usize>,

	/// Only apply if the text in scope contains this string.
	pub if_contains: Option<String>,

	/// Skip if the text in scope already contains this string.
	pub unless_contains: Option<String>,

	pub multi_line: Option<bool>,

	pub dot_matches_new_line: Option<bool>,

	pub case_insensitive: Option<bool>,
}

/// A loaded rule file with its source path.
#[derive(Debug, Clone)]
pub struct LoadedRules {
	/// The parsed rule file.
	pub rules: RuleFile,

	/// The path it was loaded from.
	pub path: PathBuf,
}

impl LoadedRules {
	/// Directory relative targets resolve against: the rule file's directory
	/// joined with `base-dir`, if any.
	pub fn base_dir(&self) -> PathBuf {
		let root = self
			.path
			.parent()
			.map(Path::to_path_buf)
			.unwrap_or_default();
		match self.rules.base_dir {
			Some(ref dir) => root.join(dir),
			None => root,
		}
	}
}

impl PatternFlags {
	/// Apply per-rule overrides on top of these defaults.
	pub fn with_overrides(self, rule: &Rule) -> Self {
		PatternFlags {
			multi_line: rule.multi_line.unwrap_or(self.multi_line),
			dot_matches_new_line: rule
				.dot_matches_new_line
				.unwrap_or(self.dot_matches_new_line),
			case_insensitive: rule.case_insensitive.unwrap_or(self.case_insensitive),
		}
	}
}

impl Rule {
	/// Validate field combinations. `patch` is the 1-based patch index used in messages.
	pub fn validate(&self, patch: usize) -> Result<(), PatchError> {
		if self.substitute.is_some() {
			for (name, is_set) in [
				("pattern", self.pattern.is_some()),
				("replacement", self.replacement.is_some()),
				("literal", self.literal),
			] {
				if is_set {
					return Err(PatchError::MutuallyExclusive {
						option1: "substitute".to_string(),
						option2: name.to_string(),
					});
				}
			}
		} else if self.pattern.is_none() {
			return Err(PatchError::InvalidRule {
				patch,
				reason: "rule needs either `pattern` or `substitute`".to_string(),
			});
		}

		if self.pattern.as_deref() == Some("") {
			return Err(PatchError::InvalidRule {
				patch,
				reason: "`pattern` must not be empty".to_string(),
			});
		}

		if self.limit == Some(0) {
			return Err(PatchError::InvalidRule {
				patch,
				reason: "`limit` must be at least 1".to_string(),
			});
		}

		if self.line == Some(0) {
			return Err(PatchError::InvalidRule {
				patch,
				reason: "`line` is 1-based and must be at least 1".to_string(),
			});
		}

		Ok(())
	}
}

impl Patch {
	/// Target paths in declaration order.
	pub fn targets(&self) -> Vec<&Path> {
		self.file
			.iter()
			.chain(self.files.iter())
			.map(PathBuf::as_path)
			.collect()
	}

	/// Validate this patch. `index` is 1-based.
	pub fn validate(&self, index: usize) -> Result<(), PatchError> {
		if self.file.is_some() && !self.files.is_empty() {
			return Err(PatchError::MutuallyExclusive {
				option1: "file".to_string(),
				option2: "files".to_string(),
			});
		}

		if self.targets().is_empty() {
			return Err(PatchError::InvalidRule {
				patch: index,
				reason: "patch names no target file".to_string(),
			});
		}

		if self.rules.is_empty() {
			return Err(PatchError::InvalidRule {
				patch: index,
				reason: "patch has no rules".to_string(),
			});
		}

		for rule in &self.rules {
			rule.validate(index)?;
		}
		Ok(())
	}
}

impl RuleFile {
	/// Validate all patches in this file.
	pub fn validate(&self) -> Result<(), PatchError> {
		for (i, patch) in self.patches.iter().enumerate() {
			patch.validate(i + 1)?;
		}
		Ok(())
	}
}
