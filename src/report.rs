//! Per-file outcomes and the operator-facing status lines.

use similar::TextDiff;
use std::path::PathBuf;

/// What happened to a single target file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
	/// At least one rule changed the content.
	Fixed { replacements: usize },
	/// No rule changed the content; nothing was written.
	Unchanged,
	/// The file does not exist.
	NotFound,
	/// Reading or writing the file failed.
	Failed(String),
}

/// Outcome for one plan entry.
#[derive(Debug, Clone)]
pub struct FileReport {
	/// Path as written in the rule file.
	pub name: String,

	/// Resolved path.
	pub path: PathBuf,

	pub outcome: FileOutcome,

	/// Unified diff of the change, collected in dry-run mode.
	pub diff: Option<String>,
}

impl FileReport {
	/// The status line printed for this file.
	pub fn status_line(&self) -> String {
		match self.outcome {
			FileOutcome::Fixed { .. } => format!("Fixed: {}", self.name),
			FileOutcome::Unchanged => format!("No match found in: {}", self.name),
			FileOutcome::NotFound => format!("File not found: {}", self.path.display()),
			FileOutcome::Failed(ref error) => format!("Failed: {}: {}", self.name, error),
		}
	}
}

/// Outcomes for a whole batch, in plan order.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
	pub files: Vec<FileReport>,
}

impl BatchReport {
	pub fn fixed(&self) -> usize {
		self.count(|o| matches!(o, FileOutcome::Fixed { .. }))
	}

	pub fn unchanged(&self) -> usize {
		self.count(|o| matches!(o, FileOutcome::Unchanged))
	}

	pub fn not_found(&self) -> usize {
		self.count(|o| matches!(o, FileOutcome::NotFound))
	}

	pub fn failed(&self) -> usize {
		self.count(|o| matches!(o, FileOutcome::Failed(_)))
	}

	/// Whether any file failed to read or write. Missing files do not count.
	pub fn has_failures(&self) -> bool {
		self.failed() > 0
	}

	/// Closing line for the batch.
	pub fn summary(&self, dry_run: bool) -> String {
		let fixed_label = if dry_run { "would fix" } else { "fixed" };
		format!(
			"Done: {} {}, {} unchanged, {} not found, {} failed",
			self.fixed(),
			fixed_label,
			self.unchanged(),
			self.not_found(),
			self.failed()
		)
	}

	fn count(&self, pred: impl Fn(&FileOutcome) -> bool) -> usize {
		self.files.iter().filter(|f| pred(&f.outcome)).count()
	}
}

/// Render a unified-style line diff between `original` and `patched`.
pub fn unified_diff(name: &str, original: &str, patched: &str) -> String {
	TextDiff::from_lines(original, patched)
		.unified_diff()
		.context_radius(3)
		.header(&format!("{name} (original)"), &format!("{name} (patched)"))
		.to_string()
}
