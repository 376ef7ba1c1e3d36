//! Shallow format and lint heuristics offered next to the editor.
//!
//! These are deliberately naive text rules, not a formatter or a linter.

use crate::buffer::LanguageTag;

/// Trims every line for html, css, and javascript. Other languages are
/// returned unchanged.
pub fn format_source(code: &str, language: LanguageTag) -> String {
	match language {
		LanguageTag::Html | LanguageTag::Css | LanguageTag::Javascript => code.split('\n').map(str::trim).collect::<Vec<_>>().join("\n"),
		LanguageTag::Typescript | LanguageTag::React => code.to_string(),
	}
}

/// One heuristic warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LintWarning {
	VarDeclaration,
	MissingDoctype,
	ImportantRule,
}

impl LintWarning {
	pub const fn message(self) -> &'static str {
		match self {
			Self::VarDeclaration => "Consider using \"let\" or \"const\" instead of \"var\".",
			Self::MissingDoctype => "HTML5 doctype is missing.",
			Self::ImportantRule => "Avoid using !important in CSS.",
		}
	}
}

pub fn lint_source(code: &str, language: LanguageTag) -> Vec<LintWarning> {
	let mut warnings = Vec::new();
	match language {
		LanguageTag::Javascript => {
			if code.contains("var ") {
				warnings.push(LintWarning::VarDeclaration);
			}
		}
		LanguageTag::Html => {
			if !code.to_ascii_lowercase().contains("<!doctype html>") {
				warnings.push(LintWarning::MissingDoctype);
			}
		}
		LanguageTag::Css => {
			if code.contains("!important") {
				warnings.push(LintWarning::ImportantRule);
			}
		}
		LanguageTag::Typescript | LanguageTag::React => {}
	}
	warnings
}
