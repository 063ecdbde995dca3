use std::path::PathBuf;

/// Library-level structured errors for patchrun.
///
/// Use `thiserror` for structured errors that library consumers can match on.
/// The CLI binary wraps these with `anyhow` for rich context chains.
#[derive(Debug, thiserror::Error)]
pub enum PatchError {
	#[error("Rule file not found: {path}")]
	RulesNotFound { path: PathBuf },

	#[error("No .patchrun.toml found in {start_dir} or any parent directory")]
	NoRulesDiscovered { start_dir: PathBuf },

	#[error("Failed to read rule file: {path}")]
	RulesReadError {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to parse rule file: {path}")]
	RulesParseError {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},

	#[error("Invalid regex pattern in rule: {pattern}")]
	InvalidRegex {
		pattern: String,
		#[source]
		source: regex::Error,
	},

	#[error("Invalid rule in patch {patch}: {reason}")]
	InvalidRule { patch: usize, reason: String },

	#[error("Mutually exclusive options: {option1} and {option2}")]
	MutuallyExclusive { option1: String, option2: String },

	#[error("File not found: {path}")]
	FileNotFound { path: PathBuf },

	#[error("Failed to read file: {path}")]
	ReadError {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("File is not valid UTF-8: {path}")]
	InvalidUtf8 {
		path: PathBuf,
		#[source]
		source: std::string::FromUtf8Error,
	},

	#[error("Failed to write file: {path}")]
	WriteError {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to create backup: {path}")]
	BackupError {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
}

/// Result type alias using PatchError.
pub type Result<T> = std::result::Result<T, PatchError>;
