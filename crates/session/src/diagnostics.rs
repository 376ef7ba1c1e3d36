//! Maps relayed errors back onto the JavaScript buffer.

use std::ops::Range;

use livepane_bridge::{LogEntry, RelayedSignal};
use livepane_document::{AssembledDocument, Section};
use ropey::Rope;
use serde::Serialize;

/// An error located in the user's script buffer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
	/// Char range in the buffer, from the reported column to the end of the line.
	pub range: Range<usize>,
	/// 1-based buffer line.
	pub line: usize,
	/// 1-based column as reported.
	pub column: u32,
	pub message: String,
}

/// Converts document-relative error entries into buffer diagnostics.
///
/// Entries that point outside the embedded script, such as errors raised by
/// markup-level scripts, are skipped.
pub fn diagnostics(document: &AssembledDocument, errors: &[LogEntry]) -> Vec<Diagnostic> {
	let script = Rope::from_str(document.section(Section::Script));
	let script_line = document.script_line();

	errors
		.iter()
		.filter_map(|entry| match &entry.signal {
			RelayedSignal::Error { text, line, column } => locate(&script, script_line, *line, *column, text),
			RelayedSignal::Console { .. } => None,
		})
		.collect()
}

fn locate(script: &Rope, script_line: u32, line: u32, column: u32, message: &str) -> Option<Diagnostic> {
	let index = usize::try_from(line.checked_sub(script_line)?).ok()?;
	if index >= script.len_lines() {
		return None;
	}
	let text = script.line(index);
	let mut width = text.len_chars();
	while width > 0 && matches!(text.char(width - 1), '\n' | '\r') {
		width -= 1;
	}
	let line_start = script.line_to_char(index);
	let offset = usize::try_from(column.saturating_sub(1)).unwrap_or(usize::MAX).min(width);

	Some(Diagnostic {
		range: line_start + offset..line_start + width,
		line: index + 1,
		column,
		message: message.to_owned(),
	})
}
