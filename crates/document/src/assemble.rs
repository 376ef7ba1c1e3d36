use std::fmt;
use std::ops::Range;

use crate::buffer::{LanguageTag, SourceBuffer};
use crate::shim;

/// Section of an assembled document that carries buffer content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
	Style,
	Body,
	Script,
}

impl Section {
	/// Language whose buffer feeds this section.
	pub const fn language(self) -> LanguageTag {
		match self {
			Self::Style => LanguageTag::Css,
			Self::Body => LanguageTag::Html,
			Self::Script => LanguageTag::Javascript,
		}
	}
}

/// Immutable preview document built from one snapshot of the buffer set.
#[derive(Clone, PartialEq, Eq)]
pub struct AssembledDocument {
	text: String,
	style: Range<usize>,
	body: Range<usize>,
	script: Range<usize>,
	script_line: u32,
}

impl AssembledDocument {
	pub fn as_str(&self) -> &str {
		&self.text
	}

	pub fn into_string(self) -> String {
		self.text
	}

	/// Embedded content of one section, byte-for-byte as taken from its buffer.
	pub fn section(&self, section: Section) -> &str {
		let range = match section {
			Section::Style => &self.style,
			Section::Body => &self.body,
			Section::Script => &self.script,
		};
		&self.text[range.clone()]
	}

	/// 1-based document line holding the first line of the user script.
	pub const fn script_line(&self) -> u32 {
		self.script_line
	}

	pub fn len(&self) -> usize {
		self.text.len()
	}

	pub fn is_empty(&self) -> bool {
		self.text.is_empty()
	}
}

impl fmt::Display for AssembledDocument {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.text)
	}
}

impl fmt::Debug for AssembledDocument {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("AssembledDocument")
			.field("len", &self.text.len())
			.field("style", &self.style)
			.field("body", &self.body)
			.field("script", &self.script)
			.field("script_line", &self.script_line)
			.finish()
	}
}

/// Returns the content of the last buffer tagged `language`, or `""`.
fn last_content(buffers: &[SourceBuffer], language: LanguageTag) -> &str {
	buffers
		.iter()
		.rev()
		.find(|buffer| buffer.language == language)
		.map_or("", |buffer| buffer.content.as_str())
}

/// Appends `content` and returns the byte range it occupies.
fn push_section(text: &mut String, content: &str) -> Range<usize> {
	let start = text.len();
	text.push_str(content);
	start..text.len()
}

/// Assembles the preview document for `buffers`.
///
/// The shim is the first script in the document so its overrides are in
/// place before any user script runs. When several buffers share a
/// language the last one in buffer order wins; a missing language yields an
/// empty section.
pub fn assemble(buffers: &[SourceBuffer]) -> AssembledDocument {
	let css = last_content(buffers, LanguageTag::Css);
	let html = last_content(buffers, LanguageTag::Html);
	let js = last_content(buffers, LanguageTag::Javascript);

	let mut text = String::with_capacity(css.len() + html.len() + js.len() + shim::SHIM_SCRIPT.len() + 128);
	text.push_str("<html>\n<head>\n");
	text.push_str(&shim::shim_element());
	text.push_str("\n<style>");
	let style = push_section(&mut text, css);
	text.push_str("</style>\n</head>\n<body>\n");
	let body = push_section(&mut text, html);
	text.push_str("\n<script>\n");
	let script_line = line_at(&text, text.len());
	let script = push_section(&mut text, js);
	text.push_str("\n</script>\n</body>\n</html>\n");

	tracing::trace!(buffers = buffers.len(), bytes = text.len(), "document.assemble");

	AssembledDocument {
		text,
		style,
		body,
		script,
		script_line,
	}
}

/// 1-based line number of byte `offset` in `text`.
pub(crate) fn line_at(text: &str, offset: usize) -> u32 {
	let newlines = text.as_bytes()[..offset].iter().filter(|&&b| b == b'\n').count();
	u32::try_from(newlines).map_or(u32::MAX, |n| n.saturating_add(1))
}
