use crate::error::{PatchError, Result};
use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Path of the backup copy for `path`: the full file name with `.bak` appended.
pub fn backup_path(path: &Path) -> PathBuf {
	let mut name = path
		.file_name()
		.map(OsString::from)
		.unwrap_or_default();
	name.push(".bak");
	path.with_file_name(name)
}

/// Copy the current content of `path` to its `.bak` sibling, overwriting any
/// previous backup.
pub fn write_backup(path: &Path) -> Result<PathBuf> {
	let backup = backup_path(path);
	fs::copy(path, &backup).map_err(|source| PatchError::BackupError {
		path: backup.clone(),
		source,
	})?;
	Ok(backup)
}

/// Replace the content of `path` atomically.
///
/// The new content goes to a temporary file in the same directory, is
/// synced to disk, and is then renamed over the target, so readers never
/// observe a half-written file. The target's permissions are carried over.
/// A symlinked target is resolved first so the file it points to is
/// replaced and the link itself stays in place.
/// On any error the temporary file is removed when it is dropped.
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
	let write_error = |source: std::io::Error| PatchError::WriteError {
		path: path.to_path_buf(),
		source,
	};

	let target = fs::canonicalize(path).map_err(write_error)?;

	// Create the temp file next to the target so the rename stays on one filesystem
	let parent = match target.parent() {
		Some(dir) if !dir.as_os_str().is_empty() => dir,
		_ => Path::new("."),
	};

	let permissions = fs::metadata(&target).map_err(write_error)?.permissions();

	let mut temp = tempfile::NamedTempFile::new_in(parent).map_err(write_error)?;
	temp.write_all(content).map_err(write_error)?;
	temp.as_file().sync_all().map_err(write_error)?;
	temp.as_file()
		.set_permissions(permissions)
		.map_err(write_error)?;

	temp.persist(&target).map_err(|e| write_error(e.error))?;

	Ok(())
}
