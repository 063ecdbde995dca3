use crate::config::types::RuleFile;
use crate::error::{PatchError, Result};
use std::path::Path;

/// Parse a rule file from the given path.
pub fn parse_rules_file(path: &Path) -> Result<RuleFile> {
	let content = std::fs::read_to_string(path).map_err(|source| {
		if source.kind() == std::io::ErrorKind::NotFound {
			PatchError::RulesNotFound {
				path: path.to_path_buf(),
			}
		} else {
			PatchError::RulesReadError {
				path: path.to_path_buf(),
				source,
			}
		}
	})?;

	parse_rules_str(&content, path)
}

/// Parse a rule file from a string (useful for testing).
pub fn parse_rules_str(content: &str, path: &Path) -> Result<RuleFile> {
	let rules: RuleFile = toml::from_str(content).map_err(|source| PatchError::RulesParseError {
		path: path.to_path_buf(),
		source,
	})?;

	rules.validate()?;

	Ok(rules)
}
