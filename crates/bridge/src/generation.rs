use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Identity of one isolated-context lifetime.
///
/// Every reload draws a fresh generation; every event leaving the isolated
/// context carries the generation it was loaded under.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Generation(u64);

impl Generation {
	pub const fn from_raw(raw: u64) -> Self {
		Self(raw)
	}

	pub const fn raw(self) -> u64 {
		self.0
	}
}

impl fmt::Debug for Generation {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Generation({})", self.0)
	}
}

impl fmt::Display for Generation {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "g{}", self.0)
	}
}

/// Monotonic generation clock shared by everything that reloads a host.
#[derive(Debug, Default, Clone)]
pub struct GenerationClock {
	last: Arc<AtomicU64>,
}

impl GenerationClock {
	/// Creates a clock whose first generation is 1.
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the next generation.
	pub fn next(&self) -> Generation {
		Generation(self.last.fetch_add(1, Ordering::AcqRel).wrapping_add(1))
	}

	/// Returns the most recently issued generation, if any.
	pub fn current(&self) -> Option<Generation> {
		match self.last.load(Ordering::Acquire) {
			0 => None,
			raw => Some(Generation(raw)),
		}
	}
}
