//! The patch runner.
//!
//! Files are processed one at a time in plan order. For each file the whole
//! text is read, every rule is applied in sequence, and the file is written
//! back only when the final text differs from what was read. A missing or
//! unwritable file is recorded in the report and the batch moves on.

pub mod write;

use crate::error::{PatchError, Result};
use crate::report::{BatchReport, FileOutcome, FileReport, unified_diff};
use crate::rules::{PatchPlan, PlanEntry, RewriteRule, apply_rules};
use std::path::Path;

/// Options controlling how the runner touches the filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
	/// Compute outcomes and diffs without writing anything.
	pub dry_run: bool,

	/// Save the pre-patch content as `<file>.bak` before replacing it.
	pub backup: bool,
}

/// Result of running the rules for a single file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
	/// Content as read from disk.
	pub original: String,

	/// Content after every rule was applied.
	pub patched: String,

	/// Number of replacements made across all rules.
	pub replacements: usize,
}

impl FileChange {
	/// Whether the patched text differs from the original.
	pub fn is_changed(&self) -> bool {
		self.original != self.patched
	}
}

/// Apply `rules` to the file at `path`, writing it back only if it changed.
///
/// Returns [`PatchError::FileNotFound`] if the file does not exist.
pub fn patch_file(path: &Path, rules: &[RewriteRule], options: RunOptions) -> Result<FileChange> {
	let original = read_text(path)?;
	let rewritten = apply_rules(&original, rules);

	let change = FileChange {
		original,
		patched: rewritten.text,
		replacements: rewritten.replacements,
	};

	if !change.is_changed() {
		tracing::debug!(path = %path.display(), "no rule changed the file");
		return Ok(change);
	}

	if options.dry_run {
		tracing::debug!(path = %path.display(), "dry run, not writing");
		return Ok(change);
	}

	if options.backup {
		let backup = write::write_backup(path)?;
		tracing::debug!(backup = %backup.display(), "saved backup");
	}

	write::atomic_write(path, change.patched.as_bytes())?;
	tracing::info!(
		path = %path.display(),
		replacements = change.replacements,
		"patched file"
	);

	Ok(change)
}

/// Run every entry of `plan` in order and collect the outcomes.
pub fn run_plan(plan: &PatchPlan, options: RunOptions) -> BatchReport {
	let mut report = BatchReport::default();
	for entry in &plan.entries {
		report.files.push(run_entry(entry, options));
	}
	report
}

fn run_entry(entry: &PlanEntry, options: RunOptions) -> FileReport {
	let mut diff = None;
	let outcome = match patch_file(&entry.path, &entry.rules, options) {
		Ok(change) if change.is_changed() => {
			if options.dry_run {
				diff = Some(unified_diff(&entry.name, &change.original, &change.patched));
			}
			FileOutcome::Fixed {
				replacements: change.replacements,
			}
		}
		Ok(_) => FileOutcome::Unchanged,
		Err(PatchError::FileNotFound { .. }) => {
			tracing::warn!(path = %entry.path.display(), "target file not found");
			FileOutcome::NotFound
		}
		Err(e) => {
			tracing::error!(path = %entry.path.display(), error = %e, "failed to patch file");
			FileOutcome::Failed(e.to_string())
		}
	};

	FileReport {
		name: entry.name.clone(),
		path: entry.path.clone(),
		outcome,
		diff,
	}
}

fn read_text(path: &Path) -> Result<String> {
	let bytes = std::fs::read(path).map_err(|source| {
		if source.kind() == std::io::ErrorKind::NotFound {
			PatchError::FileNotFound {
				path: path.to_path_buf(),
			}
		} else {
			PatchError::ReadError {
				path: path.to_path_buf(),
				source,
			}
		}
	})?;

	String::from_utf8(bytes).map_err(|source| PatchError::InvalidUtf8 {
		path: path.to_path_buf(),
		source,
	})
}
