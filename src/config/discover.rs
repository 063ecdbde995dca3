use crate::config::parser::parse_rules_file;
use crate::config::types::LoadedRules;
use crate::error::{PatchError, Result};
use std::path::{Path, PathBuf};

/// File name looked up during discovery.
pub const RULES_FILE_NAME: &str = ".patchrun.toml";

/// Find the nearest rule file, starting at `start_dir` and walking up the
/// directory tree. The first `.patchrun.toml` found wins.
pub fn discover_rules_file(start_dir: &Path) -> Option<PathBuf> {
	let mut current_dir = Some(start_dir);

	while let Some(dir) = current_dir {
		let candidate = dir.join(RULES_FILE_NAME);
		if candidate.is_file() {
			return Some(candidate);
		}
		current_dir = dir.parent();
	}

	None
}

/// Load the rule file at `explicit`, or discover one from `start_dir`.
pub fn load_rules(explicit: Option<&Path>, start_dir: &Path) -> Result<LoadedRules> {
	let path = match explicit {
		Some(path) => path.to_path_buf(),
		None => discover_rules_file(start_dir).ok_or_else(|| PatchError::NoRulesDiscovered {
			start_dir: start_dir.to_path_buf(),
		})?,
	};

	tracing::debug!(path = %path.display(), "loading rule file");
	let rules = parse_rules_file(&path)?;

	Ok(LoadedRules { rules, path })
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::fs;

	#[test]
	fn test_discover_in_start_dir() {
		let temp = tempfile::tempdir().unwrap();
		let rules_path = temp.path().join(RULES_FILE_NAME);
		fs::write(&rules_path, "").unwrap();

		assert_eq!(discover_rules_file(temp.path()), Some(rules_path));
	}

	#[test]
	fn test_discover_walks_up_to_nearest() {
		let temp = tempfile::tempdir().unwrap();
		let nested = temp.path().join("a").join("b").join("c");
		fs::create_dir_all(&nested).unwrap();

		let outer = temp.path().join(RULES_FILE_NAME);
		let inner = temp.path().join("a").join(RULES_FILE_NAME);
		fs::write(&outer, "").unwrap();
		fs::write(&inner, "").unwrap();

		assert_eq!(discover_rules_file(&nested), Some(inner));
	}

	#[test]
	fn test_load_rules_explicit_path() {
		let temp = tempfile::tempdir().unwrap();
		let rules_path = temp.path().join("campaign.toml");
		fs::write(&rules_path, "base-dir = \"src\"\n").unwrap();

		let loaded = load_rules(Some(&rules_path), Path::new("/")).unwrap();
		assert_eq!(loaded.path, rules_path);
		assert_eq!(loaded.base_dir(), temp.path().join("src"));
	}

	#[test]
	fn test_load_rules_explicit_missing() {
		let temp = tempfile::tempdir().unwrap();
		let missing = temp.path().join("nope.toml");

		let result = load_rules(Some(&missing), temp.path());
		assert!(matches!(
			result.unwrap_err(),
			PatchError::RulesNotFound { .. }
		));
	}

	#[test]
	fn test_base_dir_defaults_to_rule_file_dir() {
		let temp = tempfile::tempdir().unwrap();
		fs::write(temp.path().join(RULES_FILE_NAME), "").unwrap();

		let loaded = load_rules(None, temp.path()).unwrap();
		assert_eq!(loaded.base_dir(), temp.path());
	}
}
