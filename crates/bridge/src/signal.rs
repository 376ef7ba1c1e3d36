use std::collections::VecDeque;
use std::num::NonZeroUsize;

use serde::Serialize;

use crate::generation::Generation;
use crate::message::{ChannelMessage, ConsoleLevel};

/// One classified event that crossed the isolation boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RelayedSignal {
	Console { level: ConsoleLevel, text: String },
	Error { text: String, line: u32, column: u32 },
}

impl RelayedSignal {
	pub fn text(&self) -> &str {
		match self {
			Self::Console { text, .. } | Self::Error { text, .. } => text,
		}
	}
}

impl From<ChannelMessage> for RelayedSignal {
	fn from(message: ChannelMessage) -> Self {
		match message {
			ChannelMessage::Console { level, content } => Self::Console { level, text: content },
			ChannelMessage::Error { content, line, column } => Self::Error { text: content, line, column },
		}
	}
}

/// A relayed signal stamped with its arrival order.
///
/// `seq` is shared by the console and error logs, so entries of both can be
/// merged back into one timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
	pub seq: u64,
	pub generation: Generation,
	pub signal: RelayedSignal,
}

/// How many entries a log keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retention {
	Unbounded,
	/// Keep the newest `n` entries, evicting the oldest.
	Capped(NonZeroUsize),
}

impl Retention {
	pub const DEFAULT_CAP: usize = 1000;

	/// `None` means unbounded; `Some(0)` is clamped to one entry.
	pub fn from_max(max: Option<usize>) -> Self {
		match max {
			None => Self::Unbounded,
			Some(n) => Self::Capped(NonZeroUsize::new(n).unwrap_or(NonZeroUsize::MIN)),
		}
	}
}

impl Default for Retention {
	fn default() -> Self {
		Self::from_max(Some(Self::DEFAULT_CAP))
	}
}

/// Append-only ring of log entries.
#[derive(Debug, Clone, Default)]
pub struct SignalLog {
	entries: VecDeque<LogEntry>,
	retention: Retention,
	evicted: u64,
}

impl SignalLog {
	pub fn new(retention: Retention) -> Self {
		Self {
			entries: VecDeque::new(),
			retention,
			evicted: 0,
		}
	}

	pub(crate) fn push(&mut self, entry: LogEntry) {
		if let Retention::Capped(cap) = self.retention {
			while self.entries.len() >= cap.get() {
				self.entries.pop_front();
				self.evicted += 1;
			}
		}
		self.entries.push_back(entry);
	}

	pub(crate) fn clear(&mut self) {
		self.entries.clear();
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Number of entries dropped by the retention policy so far.
	pub const fn evicted(&self) -> u64 {
		self.evicted
	}

	pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
		self.entries.iter()
	}

	/// Entries with `seq` strictly greater than `after`.
	pub fn since(&self, after: u64) -> Vec<LogEntry> {
		self.entries.iter().filter(|entry| entry.seq > after).cloned().collect()
	}

	pub fn snapshot(&self) -> Vec<LogEntry> {
		self.entries.iter().cloned().collect()
	}
}
