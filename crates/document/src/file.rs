//! Client-local save and load of single buffers.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::buffer::{LanguageTag, SourceBuffer};

/// Hard limit on a loaded file, matching what the preview engine will accept.
pub const MAX_BUFFER_BYTES: u64 = 4 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum FileError {
	#[error("I/O error on {path}: {error}")]
	Io { path: PathBuf, error: std::io::Error },

	#[error("{path} exceeds the {limit} byte buffer limit")]
	TooLarge { path: PathBuf, limit: u64 },

	#[error("{0} has no file name")]
	NoFileName(PathBuf),
}

/// Reads `path` into a new buffer named after the file stem.
///
/// The language comes from the extension; files without a known extension
/// open as JavaScript.
pub fn load_buffer(path: &Path) -> Result<SourceBuffer, FileError> {
	let io_err = |error| FileError::Io {
		path: path.to_path_buf(),
		error,
	};
	let metadata = std::fs::metadata(path).map_err(io_err)?;
	if metadata.len() > MAX_BUFFER_BYTES {
		return Err(FileError::TooLarge {
			path: path.to_path_buf(),
			limit: MAX_BUFFER_BYTES,
		});
	}
	let content = std::fs::read_to_string(path).map_err(io_err)?;
	let stem = path
		.file_stem()
		.map(|s| s.to_string_lossy().into_owned())
		.ok_or_else(|| FileError::NoFileName(path.to_path_buf()))?;
	let language = path
		.extension()
		.map_or(LanguageTag::Javascript, |ext| LanguageTag::from_extension(&ext.to_string_lossy()));

	tracing::debug!(path = %path.display(), %language, bytes = content.len(), "buffer.load");
	Ok(SourceBuffer::new(stem, language, content))
}

/// Writes `buffer` into `dir` as `<display_name>.<extension>` and returns the path.
pub fn save_buffer(dir: &Path, buffer: &SourceBuffer) -> Result<PathBuf, FileError> {
	let path = dir.join(file_name_for(buffer));
	std::fs::write(&path, &buffer.content).map_err(|error| FileError::Io { path: path.clone(), error })?;
	tracing::debug!(path = %path.display(), "buffer.save");
	Ok(path)
}

/// File name used when saving `buffer`.
pub fn file_name_for(buffer: &SourceBuffer) -> String {
	let ext = buffer.language.extension();
	let suffix = format!(".{ext}");
	if buffer.display_name.ends_with(&suffix) {
		buffer.display_name.clone()
	} else {
		format!("{}{suffix}", buffer.display_name)
	}
}
