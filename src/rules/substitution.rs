use crate::error::{PatchError, Result};

/// Parsed sed-like substitution: "s/pattern/replacement/flags".
///
/// Supported flags: `g` (replace every match, otherwise only the first),
/// `m` (multi-line), `s` (dot matches newline), `i` (case-insensitive).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
	/// The regex source text.
	pub pattern: String,

	/// The replacement string.
	pub replacement: String,

	/// Whether to replace all occurrences (global flag).
	pub global: bool,

	pub multi_line: bool,

	pub dot_matches_new_line: bool,

	pub case_insensitive: bool,
}

impl Substitution {
	/// Parse a substitution string such as "s/foo/bar/" or "s#a.b#c#gs".
	pub fn parse(input: &str) -> Result<Self> {
		let Some(rest) = input.strip_prefix('s') else {
			return Err(syntax_error(input, "Substitution must start with 's'"));
		};

		// The delimiter is whatever character follows the 's'
		let Some(delimiter) = rest.chars().next() else {
			return Err(syntax_error(input, "Substitution too short"));
		};
		if delimiter.is_alphanumeric() || delimiter == '\\' || delimiter.is_whitespace() {
			return Err(syntax_error(input, "Invalid substitution delimiter"));
		}

		let parts = split_by_delimiter(&rest[delimiter.len_utf8()..], delimiter);

		if parts.len() < 2 {
			return Err(syntax_error(
				input,
				"Substitution must have pattern and replacement",
			));
		}
		if parts.len() > 3 {
			return Err(syntax_error(input, "Too many delimiters in substitution"));
		}

		let mut substitution = Substitution {
			pattern: parts[0].clone(),
			replacement: parts[1].clone(),
			global: false,
			multi_line: false,
			dot_matches_new_line: false,
			case_insensitive: false,
		};

		if substitution.pattern.is_empty() {
			return Err(syntax_error(input, "Substitution pattern is empty"));
		}

		let flags = parts.get(2).map(String::as_str).unwrap_or("");
		for flag in flags.chars() {
			match flag {
				'g' => substitution.global = true,
				'm' => substitution.multi_line = true,
				's' => substitution.dot_matches_new_line = true,
				'i' => substitution.case_insensitive = true,
				other => {
					return Err(syntax_error(
						input,
						&format!("Unknown substitution flag '{other}'"),
					));
				}
			}
		}

		Ok(substitution)
	}
}

fn syntax_error(input: &str, message: &str) -> PatchError {
	PatchError::InvalidRegex {
		pattern: input.to_string(),
		source: regex::Error::Syntax(message.to_string()),
	}
}

/// Split a string by a delimiter, respecting backslash escapes.
fn split_by_delimiter(input: &str, delimiter: char) -> Vec<String> {
	let mut parts = Vec::new();
	let mut current = String::new();
	let mut chars = input.chars().peekable();

	while let Some(c) = chars.next() {
		if c == '\\' {
			// An escaped delimiter becomes the literal delimiter; other escapes
			// pass through untouched for the regex engine.
			if chars.peek() == Some(&delimiter) {
				current.push(delimiter);
				chars.next();
			} else {
				current.push(c);
				if let Some(next) = chars.next() {
					current.push(next);
				}
			}
		} else if c == delimiter {
			parts.push(std::mem::take(&mut current));
		} else {
			current.push(c);
		}
	}

	// A trailing delimiter leaves an empty flags part; keep it so "s/a/b/" has three parts
	parts.push(current);

	parts
}
