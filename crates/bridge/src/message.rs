//! Wire shapes crossing the isolation boundary.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::generation::Generation;

/// Severity reported by a console call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleLevel {
	#[default]
	Log,
	Warn,
	Error,
	Info,
}

impl ConsoleLevel {
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Log => "log",
			Self::Warn => "warn",
			Self::Error => "error",
			Self::Info => "info",
		}
	}
}

impl fmt::Display for ConsoleLevel {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Message posted by the instrumentation shim.
///
/// `level` is optional on the wire and defaults to `log` so payloads from
/// instrumentation that only forwarded `console.log` still parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ChannelMessage {
	Console {
		#[serde(default)]
		level: ConsoleLevel,
		content: String,
	},
	Error {
		content: String,
		line: u32,
		column: u32,
	},
}

impl ChannelMessage {
	/// Parses a posted value. Returns `None` for anything outside the contract.
	pub fn parse(data: &serde_json::Value) -> Option<Self> {
		Self::deserialize(data).ok()
	}
}

/// How one isolated-context run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunOutcome {
	/// Every script block and due timer ran (some may have thrown).
	Completed { scripts: usize, timers: usize },
	/// A newer reload cancelled the run before it finished.
	Abandoned,
	/// The isolated context could not be set up.
	Failed { reason: String },
	/// The engine panicked; the panic stayed inside the isolated thread.
	Panicked,
}

/// Event delivered from an isolated context to the relay.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
	/// One `postMessage` call, data already converted to JSON.
	Post { generation: Generation, data: serde_json::Value },
	/// Sent after the last post of a run.
	Settled { generation: Generation, outcome: RunOutcome },
}

impl HostEvent {
	pub const fn generation(&self) -> Generation {
		match self {
			Self::Post { generation, .. } | Self::Settled { generation, .. } => *generation,
		}
	}
}
