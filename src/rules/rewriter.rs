use crate::config::types::{PatternFlags, Rule};
use crate::error::{PatchError, Result};
use crate::rules::substitution::Substitution;
use regex::{NoExpand, Regex, RegexBuilder};
use std::fmt;
use std::ops::Range;

/// Which part of the text a rule operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
	/// The whole file content.
	Whole,
	/// A single 1-based line, without its terminator.
	Line(usize),
}

/// A compiled rewrite rule ready for application.
#[derive(Debug, Clone)]
pub struct RewriteRule {
	/// Compiled pattern.
	pub regex: Regex,

	/// The replacement text.
	pub replacement: String,

	/// Insert `replacement` verbatim instead of expanding `$` references.
	pub literal: bool,

	/// Maximum number of replacements; `None` replaces every match.
	pub limit: Option<usize>,

	pub scope: Scope,

	pub if_contains: Option<String>,

	pub unless_contains: Option<String>,
}

/// Text after applying one or more rules, with the number of replacements made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewritten {
	pub text: String,
	pub replacements: usize,
}

impl RewriteRule {
	/// Compile a rule from the rule file, layering its flag overrides on `defaults`.
	pub fn compile(rule: &Rule, defaults: PatternFlags) -> Result<Self> {
		let (source, replacement, literal, limit, flags) = match rule.substitute {
			Some(ref sed) => {
				let sub = Substitution::parse(sed)?;
				let flags = PatternFlags {
					multi_line: sub.multi_line,
					dot_matches_new_line: sub.dot_matches_new_line,
					case_insensitive: sub.case_insensitive,
				};
				// Without `g` sed replaces the first match only; an explicit limit still wins.
				let limit = rule.limit.or(if sub.global { None } else { Some(1) });
				(
					sub.pattern,
					sub.replacement,
					false,
					limit,
					flags_or(defaults, flags).with_overrides(rule),
				)
			}
			None => {
				let pattern = rule.pattern.clone().unwrap_or_default();
				let source = if rule.literal {
					regex::escape(&pattern)
				} else {
					pattern
				};
				(
					source,
					rule.replacement.clone().unwrap_or_default(),
					rule.literal,
					rule.limit,
					defaults.with_overrides(rule),
				)
			}
		};

		let regex = build_regex(&source, flags)?;

		Ok(RewriteRule {
			regex,
			replacement,
			literal,
			limit,
			scope: rule.line.map_or(Scope::Whole, Scope::Line),
			if_contains: rule.if_contains.clone(),
			unless_contains: rule.unless_contains.clone(),
		})
	}

	/// Apply this rule to `text`.
	pub fn apply(&self, text: &str) -> Rewritten {
		let range = match self.scope {
			Scope::Whole => 0..text.len(),
			Scope::Line(line) => match line_range(text, line) {
				Some(range) => range,
				None => return unchanged(text),
			},
		};

		let target = &text[range.clone()];
		if !self.guards_pass(target) {
			return unchanged(text);
		}

		let matches = self.regex.find_iter(target).count();
		let replacements = match self.limit {
			Some(limit) => matches.min(limit),
			None => matches,
		};
		if replacements == 0 {
			return unchanged(text);
		}

		let limit = self.limit.unwrap_or(0);
		let rewritten = if self.literal {
			self.regex
				.replacen(target, limit, NoExpand(self.replacement.as_str()))
		} else {
			self.regex.replacen(target, limit, self.replacement.as_str())
		};

		let mut out = String::with_capacity(text.len() - target.len() + rewritten.len());
		out.push_str(&text[..range.start]);
		out.push_str(&rewritten);
		out.push_str(&text[range.end..]);

		Rewritten {
			text: out,
			replacements,
		}
	}

	fn guards_pass(&self, target: &str) -> bool {
		if let Some(ref needle) = self.if_contains
			&& !target.contains(needle.as_str())
		{
			return false;
		}
		if let Some(ref needle) = self.unless_contains
			&& target.contains(needle.as_str())
		{
			return false;
		}
		true
	}
}

impl fmt::Display for RewriteRule {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{:?} -> {:?}", self.regex.as_str(), self.replacement)?;
		if self.literal {
			write!(f, " (literal)")?;
		}
		if let Some(limit) = self.limit {
			write!(f, " limit={limit}")?;
		}
		if let Scope::Line(line) = self.scope {
			write!(f, " line={line}")?;
		}
		if let Some(ref needle) = self.if_contains {
			write!(f, " if_contains={needle:?}")?;
		}
		if let Some(ref needle) = self.unless_contains {
			write!(f, " unless_contains={needle:?}")?;
		}
		Ok(())
	}
}

/// Apply rules in order; each rule sees the output of the previous one.
pub fn apply_rules(text: &str, rules: &[RewriteRule]) -> Rewritten {
	let mut current = unchanged(text);
	for rule in rules {
		let next = rule.apply(&current.text);
		current.replacements += next.replacements;
		if next.replacements > 0 {
			current.text = next.text;
		}
	}
	current
}

fn unchanged(text: &str) -> Rewritten {
	Rewritten {
		text: text.to_string(),
		replacements: 0,
	}
}

/// sed flags switch modes on; they never switch off a file-level default.
fn flags_or(defaults: PatternFlags, sed: PatternFlags) -> PatternFlags {
	PatternFlags {
		multi_line: defaults.multi_line || sed.multi_line,
		dot_matches_new_line: defaults.dot_matches_new_line || sed.dot_matches_new_line,
		case_insensitive: defaults.case_insensitive || sed.case_insensitive,
	}
}

/// Compile a regex pattern string with the given flags.
fn build_regex(pattern: &str, flags: PatternFlags) -> Result<Regex> {
	RegexBuilder::new(pattern)
		.multi_line(flags.multi_line)
		.crlf(flags.multi_line)
		.dot_matches_new_line(flags.dot_matches_new_line)
		.case_insensitive(flags.case_insensitive)
		.build()
		.map_err(|source| PatchError::InvalidRegex {
			pattern: pattern.to_string(),
			source,
		})
}

/// Byte range of the 1-based `line` in `text`, excluding its `\n` or `\r\n`.
fn line_range(text: &str, line: usize) -> Option<Range<usize>> {
	let mut start = 0;
	for _ in 1..line {
		let newline = text[start..].find('\n')?;
		start += newline + 1;
	}
	if start >= text.len() && line > 1 {
		// Trailing newline: there is no line after it
		return None;
	}

	let end = text[start..]
		.find('\n')
		.map_or(text.len(), |offset| start + offset);
	let end = if text[start..end].ends_with('\r') {
		end - 1
	} else {
		end
	};
	Some(start..end)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn rule(pattern: &str, replacement: &str) -> Rule {
		Rule {
			pattern: Some(pattern.to_string()),
			replacement: Some(replacement.to_string()),
			..Default::default()
		}
	}

	fn compile(rule: &Rule) -> RewriteRule {
		RewriteRule::compile(rule, PatternFlags::default()).unwrap()
	}

	#[test]
	fn test_repository_call_is_redirected() {
		let compiled = compile(&rule(r"teacherRepository\.", "sisDataService."));
		let out = compiled.apply("teacherRepository.findById(");
		assert_eq!(out.text, "sisDataService.findById(");
		assert_eq!(out.replacements, 1);
	}

	#[test]
	fn test_every_occurrence_is_replaced() {
		let compiled = compile(&rule("foo", "bar"));
		let out = compiled.apply("foo foo\nfoo");
		assert_eq!(out.text, "bar bar\nbar");
		assert_eq!(out.replacements, 3);
	}

	#[test]
	fn test_no_match_leaves_text_unchanged() {
		let compiled = compile(&rule("missing", "x"));
		let out = compiled.apply("nothing to see");
		assert_eq!(out.text, "nothing to see");
		assert_eq!(out.replacements, 0);
	}

	#[test]
	fn test_capture_groups() {
		let compiled = compile(&rule(r"(\w+)\.getDisplayName\(\)", "$1"));
		assert_eq!(compiled.apply("status.getDisplayName()").text, "status");

		let compiled = compile(&rule(r"(import java\.util\.List;)", "${1}\nimport java.util.Optional;"));
		assert_eq!(
			compiled.apply("import java.util.List;\n").text,
			"import java.util.List;\nimport java.util.Optional;\n"
		);
	}

	#[test]
	fn test_cross_line_pattern_requires_dot_matches_new_line() {
		let text = "byte[] data = export();\n    write(data);";
		let mut r = rule(r"data = export\(\);.*write\(data\);", "// removed");

		let without = compile(&r).apply(text);
		assert_eq!(without.text, text);
		assert_eq!(without.replacements, 0);

		r.dot_matches_new_line = Some(true);
		let with = compile(&r).apply(text);
		assert_eq!(with.text, "byte[] // removed");
		assert_eq!(with.replacements, 1);
	}

	#[test]
	fn test_file_level_flags_apply_to_rules() {
		let text = "a\nb";
		let flags = PatternFlags {
			dot_matches_new_line: true,
			..Default::default()
		};
		let compiled = RewriteRule::compile(&rule("a.b", "ab"), flags).unwrap();
		assert_eq!(compiled.apply(text).text, "ab");

		// A per-rule override switches it back off
		let mut r = rule("a.b", "ab");
		r.dot_matches_new_line = Some(false);
		let compiled = RewriteRule::compile(&r, flags).unwrap();
		assert_eq!(compiled.apply(text).text, text);
	}

	#[test]
	fn test_multi_line_anchors() {
		let text = "import a;\nimport b;\n";
		let mut r = rule("^import", "// import");
		assert_eq!(compile(&r).apply(text).text, "// import a;\nimport b;\n");

		r.multi_line = Some(true);
		assert_eq!(
			compile(&r).apply(text).text,
			"// import a;\n// import b;\n"
		);
	}

	#[test]
	fn test_multi_line_end_anchor_before_crlf() {
		let text = "a;\r\nb;\r\n";
		let mut r = rule(";$", ",");
		r.multi_line = Some(true);

		let rewritten = compile(&r).apply(text);
		assert_eq!(rewritten.text, "a,\r\nb,\r\n");
		assert_eq!(rewritten.replacements, 2);
	}

	#[test]
	fn test_case_insensitive() {
		let mut r = rule("todo", "DONE");
		r.case_insensitive = Some(true);
		assert_eq!(compile(&r).apply("TODO todo").text, "DONE DONE");
	}

	#[test]
	fn test_literal_rule_ignores_regex_syntax() {
		let mut r = rule("new TimePickerField(x)", "new TimePickerField() $1");
		r.literal = true;
		let out = compile(&r).apply("f = new TimePickerField(x);");
		assert_eq!(out.text, "f = new TimePickerField() $1;");
	}

	#[test]
	fn test_limit() {
		let mut r = rule("x", "y");
		r.limit = Some(2);
		let out = compile(&r).apply("x x x");
		assert_eq!(out.text, "y y x");
		assert_eq!(out.replacements, 2);
	}

	#[test]
	fn test_sed_substitution_first_match_only_without_g() {
		let r = Rule {
			substitute: Some("s/foo/bar/".to_string()),
			..Default::default()
		};
		let out = compile(&r).apply("foo foo");
		assert_eq!(out.text, "bar foo");

		let r = Rule {
			substitute: Some("s/foo/bar/g".to_string()),
			..Default::default()
		};
		assert_eq!(compile(&r).apply("foo foo").text, "bar bar");
	}

	#[test]
	fn test_sed_substitution_dotall_flag() {
		let r = Rule {
			substitute: Some("s/a.b/X/s".to_string()),
			..Default::default()
		};
		assert_eq!(compile(&r).apply("a\nb").text, "X");
	}

	#[test]
	fn test_line_scope() {
		let mut r = rule(r"\.showAndWait\(\)", ".show()");
		r.line = Some(2);
		let text = "a.showAndWait();\nb.showAndWait();\r\nc.showAndWait();";
		let out = compile(&r).apply(text);
		assert_eq!(
			out.text,
			"a.showAndWait();\nb.show();\r\nc.showAndWait();"
		);
		assert_eq!(out.replacements, 1);
	}

	#[test]
	fn test_line_scope_past_end_is_noop() {
		let mut r = rule("a", "b");
		r.line = Some(3);
		assert_eq!(compile(&r).apply("a\na\n").text, "a\na\n");
		r.line = Some(2);
		assert_eq!(compile(&r).apply("a\na\n").text, "a\nb\n");
	}

	#[test]
	fn test_line_scope_does_not_reach_neighbours() {
		// `$` must not let the pattern run into the next line
		let mut r = rule(r"x\s*$", "y");
		r.line = Some(1);
		assert_eq!(compile(&r).apply("x\nx").text, "y\nx");
	}

	#[test]
	fn test_unless_contains_guard() {
		let mut r = rule(r"(import [^;]+;)\n", "${1}\nimport data.Service;\n");
		r.limit = Some(1);
		r.unless_contains = Some("import data.Service;".to_string());

		let compiled = compile(&r);
		let once = compiled.apply("import a.B;\n\nclass X {}");
		assert_eq!(once.text, "import a.B;\nimport data.Service;\n\nclass X {}");

		let twice = compiled.apply(&once.text);
		assert_eq!(twice.text, once.text);
		assert_eq!(twice.replacements, 0);
	}

	#[test]
	fn test_if_contains_guard() {
		let mut r = rule("controller\\.", "// controller.");
		r.if_contains = Some("TODO".to_string());
		assert_eq!(compile(&r).apply("controller.run()").text, "controller.run()");
		assert_eq!(
			compile(&r).apply("controller.run() TODO").text,
			"// controller.run() TODO"
		);
	}

	#[test]
	fn test_rules_apply_in_order() {
		let rules = vec![compile(&rule("a", "b")), compile(&rule("b", "c"))];
		let out = apply_rules("a", &rules);
		assert_eq!(out.text, "c");
		assert_eq!(out.replacements, 2);

		let reversed = vec![compile(&rule("b", "c")), compile(&rule("a", "b"))];
		assert_eq!(apply_rules("a", &reversed).text, "b");
	}

	#[test]
	fn test_second_pass_is_noop_when_replacement_does_not_rematch() {
		let rules = vec![compile(&rule(r"\bteacherRepository\b", "sisDataService"))];
		let first = apply_rules("teacherRepository.findAll(); teacherRepository.count();", &rules);
		let second = apply_rules(&first.text, &rules);
		assert_eq!(second.text, first.text);
		assert_eq!(second.replacements, 0);
	}

	#[test]
	fn test_invalid_regex() {
		let result = RewriteRule::compile(&rule("[invalid", "x"), PatternFlags::default());
		match result.unwrap_err() {
			PatchError::InvalidRegex { pattern, .. } => assert_eq!(pattern, "[invalid"),
			other => panic!("Expected InvalidRegex error, got {other:?}"),
		}
	}

	#[test]
	fn test_line_range() {
		assert_eq!(line_range("ab\ncd", 1), Some(0..2));
		assert_eq!(line_range("ab\ncd", 2), Some(3..5));
		assert_eq!(line_range("ab\ncd", 3), None);
		assert_eq!(line_range("ab\r\ncd\n", 1), Some(0..2));
		assert_eq!(line_range("ab\ncd\n", 3), None);
		assert_eq!(line_range("", 1), Some(0..0));
	}
}
