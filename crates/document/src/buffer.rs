use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identity of one open buffer.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BufferId(Uuid);

impl BufferId {
	/// Allocates a fresh random identifier.
	pub fn new() -> Self {
		Self(Uuid::new_v4())
	}

	pub const fn from_uuid(raw: Uuid) -> Self {
		Self(raw)
	}

	pub const fn as_uuid(self) -> Uuid {
		self.0
	}
}

impl Default for BufferId {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Debug for BufferId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "BufferId({})", self.0.simple())
	}
}

/// Language of a buffer.
///
/// `Typescript` and `React` are superset tags: they belong to the script
/// family but are never transpiled, so the preview only embeds `Javascript`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageTag {
	Html,
	Css,
	Javascript,
	Typescript,
	React,
}

impl LanguageTag {
	pub const ALL: [Self; 5] = [Self::Html, Self::Css, Self::Javascript, Self::Typescript, Self::React];

	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Html => "html",
			Self::Css => "css",
			Self::Javascript => "javascript",
			Self::Typescript => "typescript",
			Self::React => "react",
		}
	}

	/// Returns true for tags whose source is run by a script engine.
	pub const fn is_script(self) -> bool {
		matches!(self, Self::Javascript | Self::Typescript | Self::React)
	}

	/// File extension written when saving a buffer of this language.
	pub const fn extension(self) -> &'static str {
		match self {
			Self::Html => "html",
			Self::Css => "css",
			Self::Javascript => "js",
			Self::Typescript => "ts",
			Self::React => "jsx",
		}
	}

	/// Maps a file extension back to a language. Unknown extensions are
	/// treated as JavaScript.
	pub fn from_extension(extension: &str) -> Self {
		match extension.to_ascii_lowercase().as_str() {
			"html" | "htm" => Self::Html,
			"css" => Self::Css,
			"ts" => Self::Typescript,
			"jsx" | "tsx" => Self::React,
			_ => Self::Javascript,
		}
	}
}

impl fmt::Display for LanguageTag {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Error for a language tag outside the supported set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported language tag '{0}'")]
pub struct UnknownLanguage(pub String);

impl FromStr for LanguageTag {
	type Err = UnknownLanguage;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::ALL
			.into_iter()
			.find(|tag| tag.as_str().eq_ignore_ascii_case(s))
			.ok_or_else(|| UnknownLanguage(s.to_string()))
	}
}

/// One editor buffer as seen by the preview core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceBuffer {
	pub id: BufferId,
	pub display_name: String,
	pub content: String,
	pub language: LanguageTag,
}

impl SourceBuffer {
	pub fn new(display_name: impl Into<String>, language: LanguageTag, content: impl Into<String>) -> Self {
		Self {
			id: BufferId::new(),
			display_name: display_name.into(),
			content: content.into(),
			language,
		}
	}

	/// Replaces the buffer text, keeping identity and language.
	pub fn set_content(&mut self, content: impl Into<String>) {
		self.content = content.into();
	}
}
