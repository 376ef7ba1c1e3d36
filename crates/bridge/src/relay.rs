//! Signal relay: the only writer of the console and error logs.
//!
//! Events arrive on an unbounded FIFO channel from isolated contexts. The
//! relay keeps exactly one active generation; anything tagged with another
//! generation is stale and never reaches a log. Posted data that does not
//! parse as a [`ChannelMessage`] is foreign and is dropped without surfacing
//! an error.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use crate::generation::Generation;
use crate::message::{ChannelMessage, HostEvent, RunOutcome};
use crate::signal::{LogEntry, RelayedSignal, Retention, SignalLog};

pub type EventSender = mpsc::UnboundedSender<HostEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<HostEvent>;

/// Creates the channel isolated contexts post into.
pub fn event_channel() -> (EventSender, EventReceiver) {
	mpsc::unbounded_channel()
}

/// Relay behavior knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RelayConfig {
	pub console: Retention,
	pub errors: Retention,
	/// Clear both logs whenever a new generation is activated.
	pub clear_on_reload: bool,
}

/// What the relay did with one inbound event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
	AppendedConsole,
	AppendedError,
	Settled,
	Stale,
	Malformed,
}

/// Running counters, including events that never reached a log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayStats {
	pub console: u64,
	pub errors: u64,
	pub stale: u64,
	pub malformed: u64,
	pub console_evicted: u64,
	pub errors_evicted: u64,
}

/// Published after every relay state change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelayStatus {
	pub revision: u64,
	pub active: Option<Generation>,
	pub settled: Option<(Generation, RunOutcome)>,
	pub last_seq: u64,
}

struct RelayState {
	config: RelayConfig,
	active: Option<Generation>,
	console: SignalLog,
	errors: SignalLog,
	next_seq: u64,
	stats: RelayStats,
	settled: Option<(Generation, RunOutcome)>,
}

impl RelayState {
	fn append(&mut self, generation: Generation, signal: RelayedSignal) -> Disposition {
		self.next_seq += 1;
		let entry = LogEntry {
			seq: self.next_seq,
			generation,
			signal,
		};
		if matches!(entry.signal, RelayedSignal::Console { .. }) {
			self.console.push(entry);
			self.stats.console += 1;
			self.stats.console_evicted = self.console.evicted();
			Disposition::AppendedConsole
		} else {
			self.errors.push(entry);
			self.stats.errors += 1;
			self.stats.errors_evicted = self.errors.evicted();
			Disposition::AppendedError
		}
	}
}

/// Cloneable handle to the relay and its logs.
#[derive(Clone)]
pub struct SignalRelay {
	state: Arc<Mutex<RelayState>>,
	status: Arc<watch::Sender<RelayStatus>>,
}

impl std::fmt::Debug for SignalRelay {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let state = self.state.lock();
		f.debug_struct("SignalRelay")
			.field("active", &state.active)
			.field("console", &state.console.len())
			.field("errors", &state.errors.len())
			.finish_non_exhaustive()
	}
}

impl Default for SignalRelay {
	fn default() -> Self {
		Self::new(RelayConfig::default())
	}
}

impl SignalRelay {
	pub fn new(config: RelayConfig) -> Self {
		let (status, _) = watch::channel(RelayStatus::default());
		Self {
			state: Arc::new(Mutex::new(RelayState {
				config,
				active: None,
				console: SignalLog::new(config.console),
				errors: SignalLog::new(config.errors),
				next_seq: 0,
				stats: RelayStats::default(),
				settled: None,
			})),
			status: Arc::new(status),
		}
	}

	/// Makes `generation` the only generation whose events are accepted.
	///
	/// Called right before the host loads a new document, so anything still
	/// in flight from the previous context is rejected from here on.
	pub fn activate(&self, generation: Generation) {
		let mut state = self.state.lock();
		state.active = Some(generation);
		if state.config.clear_on_reload {
			state.console.clear();
			state.errors.clear();
		}
		tracing::debug!(%generation, "relay.activate");
		self.publish(&state);
	}

	/// Classifies and stores one inbound event.
	pub fn accept(&self, event: HostEvent) -> Disposition {
		let mut state = self.state.lock();
		let generation = event.generation();
		let disposition = if state.active != Some(generation) {
			state.stats.stale += 1;
			tracing::debug!(%generation, active = ?state.active, "relay.stale");
			Disposition::Stale
		} else {
			match event {
				HostEvent::Post { data, .. } => match ChannelMessage::parse(&data) {
					Some(message) => state.append(generation, message.into()),
					None => {
						state.stats.malformed += 1;
						tracing::trace!(%generation, "relay.malformed");
						Disposition::Malformed
					}
				},
				HostEvent::Settled { outcome, .. } => {
					tracing::debug!(%generation, ?outcome, "relay.settled");
					state.settled = Some((generation, outcome));
					Disposition::Settled
				}
			}
		};
		self.publish(&state);
		disposition
	}

	/// Drains `events` until the channel closes or `cancel` fires.
	pub async fn pump(self, mut events: EventReceiver, cancel: CancellationToken) {
		loop {
			tokio::select! {
				_ = cancel.cancelled() => break,
				event = events.recv() => match event {
					Some(event) => {
						self.accept(event);
					}
					None => break,
				},
			}
		}
		tracing::debug!("relay.pump.exit");
	}

	/// Waits until `generation` settles or is superseded.
	///
	/// A superseded generation reports [`RunOutcome::Abandoned`].
	pub async fn wait_settled(&self, generation: Generation) -> RunOutcome {
		let mut status = self.status.subscribe();
		let result = status
			.wait_for(|s| {
				s.settled.as_ref().is_some_and(|(settled, _)| *settled >= generation) || s.active.is_some_and(|active| active > generation)
			})
			.await;
		match result {
			Ok(s) => match &s.settled {
				Some((settled, outcome)) if *settled == generation => outcome.clone(),
				_ => RunOutcome::Abandoned,
			},
			Err(_) => RunOutcome::Abandoned,
		}
	}

	pub fn subscribe(&self) -> watch::Receiver<RelayStatus> {
		self.status.subscribe()
	}

	pub fn active(&self) -> Option<Generation> {
		self.state.lock().active
	}

	pub fn console(&self) -> Vec<LogEntry> {
		self.state.lock().console.snapshot()
	}

	pub fn errors(&self) -> Vec<LogEntry> {
		self.state.lock().errors.snapshot()
	}

	/// Console and error entries newer than `seq`, merged in arrival order.
	pub fn since(&self, seq: u64) -> Vec<LogEntry> {
		let state = self.state.lock();
		let mut entries = state.console.since(seq);
		entries.extend(state.errors.since(seq));
		entries.sort_by_key(|entry| entry.seq);
		entries
	}

	pub fn stats(&self) -> RelayStats {
		self.state.lock().stats
	}

	/// Must run under the state lock so watchers never see an older snapshot
	/// replace a newer one.
	fn publish(&self, state: &RelayState) {
		self.status.send_modify(|status| {
			status.revision += 1;
			status.active = state.active;
			status.settled = state.settled.clone();
			status.last_seq = state.next_seq;
		});
	}
}

#[cfg(test)]
mod tests;
