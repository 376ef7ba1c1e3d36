//! Script block extraction from an assembled document.
//!
//! This is a tag scanner, not an HTML parser: it finds `<script ...>` start
//! tags case-insensitively and takes everything up to the next `</script`.
//! That matches how a browser splits raw script text.

/// 1-based document coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
	pub line: u32,
	pub column: u32,
}

impl Position {
	pub const START: Self = Self { line: 1, column: 1 };

	/// Maps a position relative to a block's source into document coordinates.
	pub(crate) fn offset(self, relative: Position) -> Position {
		if relative.line <= 1 {
			Position {
				line: self.line,
				column: self.column.saturating_add(relative.column.saturating_sub(1)),
			}
		} else {
			Position {
				line: self.line.saturating_add(relative.line - 1),
				column: relative.column,
			}
		}
	}
}

/// One runnable inline script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ScriptBlock<'a> {
	pub source: &'a str,
	/// Where `source` starts in the document.
	pub start: Position,
}

impl ScriptBlock<'_> {
	/// Position of the first non-whitespace character, or `start` for a
	/// blank block.
	pub(crate) fn code_start(&self) -> Position {
		let skipped = self.source.len() - self.source.trim_start().len();
		if skipped == 0 || skipped == self.source.len() {
			return self.start;
		}
		self.start.offset(position_at(self.source, skipped))
	}
}

const OPEN: &str = "<script";
const CLOSE: &str = "</script";

pub(crate) fn script_blocks(document: &str) -> Vec<ScriptBlock<'_>> {
	let lower = document.to_ascii_lowercase();
	let mut blocks = Vec::new();
	let mut cursor = 0;

	while let Some(found) = lower[cursor..].find(OPEN) {
		let tag_start = cursor + found;
		let after_name = tag_start + OPEN.len();
		let boundary = lower[after_name..].chars().next();
		if !matches!(boundary, Some(c) if c == '>' || c == '/' || c.is_ascii_whitespace()) {
			cursor = after_name;
			continue;
		}
		let Some(gt) = lower[after_name..].find('>') else {
			break;
		};
		let attrs = &lower[after_name..after_name + gt];
		let content_start = after_name + gt + 1;
		let content_end = lower[content_start..].find(CLOSE).map_or(document.len(), |i| content_start + i);
		cursor = content_end;

		if !is_runnable(attrs) {
			tracing::trace!(attrs, "scan.skip_script");
			continue;
		}
		blocks.push(ScriptBlock {
			source: &document[content_start..content_end],
			start: position_at(document, content_start),
		});
	}
	blocks
}

/// Returns false for external scripts and non-JavaScript `type`s.
fn is_runnable(attrs: &str) -> bool {
	if attribute(attrs, "src").is_some() {
		return false;
	}
	match attribute(attrs, "type") {
		None => true,
		Some(kind) => {
			let kind = kind.trim();
			kind.is_empty() || kind == "module" || kind.contains("javascript") || kind.contains("ecmascript")
		}
	}
}

/// Naive attribute lookup on an already lowercased start tag.
fn attribute<'a>(attrs: &'a str, name: &str) -> Option<&'a str> {
	let mut rest = attrs;
	loop {
		let at = rest.find(name)?;
		let preceded_ok = at == 0 || rest.as_bytes()[at - 1].is_ascii_whitespace();
		let after = rest[at + name.len()..].trim_start();
		if preceded_ok && let Some(value) = after.strip_prefix('=') {
			let value = value.trim_start();
			return Some(match value.chars().next() {
				Some(quote @ ('"' | '\'')) => value[1..].split(quote).next().unwrap_or(""),
				_ => value.split(|c: char| c.is_ascii_whitespace() || c == '/').next().unwrap_or(""),
			});
		}
		if preceded_ok && (after.is_empty() || after.starts_with(|c: char| c.is_ascii_whitespace() || c == '/')) {
			return Some("");
		}
		rest = &rest[at + name.len()..];
	}
}

pub(crate) fn position_at(text: &str, offset: usize) -> Position {
	let before = &text[..offset];
	let line = before.matches('\n').count() + 1;
	let line_start = before.rfind('\n').map_or(0, |i| i + 1);
	let column = before[line_start..].chars().count() + 1;
	Position {
		line: u32::try_from(line).unwrap_or(u32::MAX),
		column: u32::try_from(column).unwrap_or(u32::MAX),
	}
}

/// Extracts `line N, col M` from an engine syntax error message.
pub(crate) fn syntax_error_position(message: &str) -> Option<Position> {
	let rest = &message[message.rfind("at line ")? + "at line ".len()..];
	let (line, rest) = rest.split_once(',')?;
	let column = rest.trim_start().strip_prefix("col")?.trim_start();
	let digits: String = column.chars().take_while(char::is_ascii_digit).collect();
	Some(Position {
		line: line.trim().parse().ok()?,
		column: digits.parse().ok()?,
	})
}
