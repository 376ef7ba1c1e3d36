//! Isolation host: one engine thread per loaded document.
//!
//! Every [`IsolationHost::reload`] discards the running context (by
//! cancelling it) and starts a fresh one on a dedicated thread. Nothing is
//! shared between contexts except the outbound event sender; each event is
//! tagged with the generation of the context that produced it, so whatever a
//! discarded context still manages to post is rejected by the relay.

use std::panic::AssertUnwindSafe;
use std::sync::{Arc, mpsc};
use std::thread;

use livepane_bridge::{EventSender, Generation, HostEvent, RunOutcome};
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::error::{HostError, Result};
use crate::limits::{ENGINE_THREAD_STACK, HostLimits};
use crate::run::run_document;

struct LoadedRun {
	generation: Generation,
	cancel: CancellationToken,
}

#[derive(Default)]
struct Slot {
	run: Option<LoadedRun>,
	closed: bool,
}

/// Owner of the isolated preview context.
pub struct IsolationHost {
	sink: EventSender,
	limits: HostLimits,
	slot: Mutex<Slot>,
}

impl IsolationHost {
	pub fn new(sink: EventSender, limits: HostLimits) -> Self {
		Self {
			sink,
			limits,
			slot: Mutex::new(Slot::default()),
		}
	}

	pub fn limits(&self) -> &HostLimits {
		&self.limits
	}

	/// Generation of the most recently loaded document.
	pub fn current(&self) -> Option<Generation> {
		self.slot.lock().run.as_ref().map(|run| run.generation)
	}

	/// Replaces the loaded document. Returns once the engine thread has been
	/// started; the run itself is not awaited.
	///
	/// The previous context is cancelled before the new one starts. When the
	/// new run ends a [`HostEvent::Settled`] carrying its outcome is sent.
	pub fn reload(&self, document: impl Into<Arc<str>>, generation: Generation) -> Result<()> {
		self.reload_with(document, generation, || {})
	}

	/// Like [`reload`](Self::reload), calling `on_start` once the engine
	/// thread exists but before it runs any script.
	///
	/// `on_start` is skipped when the host is shut down or the thread cannot
	/// be spawned; the previous run is then left untouched.
	pub fn reload_with(&self, document: impl Into<Arc<str>>, generation: Generation, on_start: impl FnOnce()) -> Result<()> {
		let document = document.into();
		let mut slot = self.slot.lock();
		if slot.closed {
			return Err(HostError::ShutDown);
		}

		let cancel = CancellationToken::new();
		let sink = self.sink.clone();
		let limits = self.limits.clone();
		let token = cancel.clone();
		let span = tracing::debug_span!("host.run", %generation);
		let (release, gate) = mpsc::sync_channel::<()>(1);

		thread::Builder::new()
			.name(format!("livepane-preview-{}", generation.raw()))
			.stack_size(ENGINE_THREAD_STACK)
			.spawn(move || {
				let _guard = span.enter();
				if gate.recv().is_err() {
					return;
				}
				let outcome = match std::panic::catch_unwind(AssertUnwindSafe(|| run_document(&document, generation, sink.clone(), &limits, &token))) {
					Ok(outcome) => outcome,
					Err(_) => {
						tracing::error!(%generation, "host.engine_panicked");
						RunOutcome::Panicked
					}
				};
				tracing::debug!(%generation, ?outcome, "host.settled");
				let _ = sink.send(HostEvent::Settled { generation, outcome });
			})
			.map_err(|error| HostError::Spawn { generation, error })?;

		if let Some(previous) = slot.run.replace(LoadedRun { generation, cancel }) {
			tracing::debug!(previous = %previous.generation, next = %generation, "host.discard");
			previous.cancel.cancel();
		}
		on_start();
		let _ = release.send(());
		Ok(())
	}

	/// Cancels the loaded context and refuses further reloads.
	pub fn shutdown(&self) {
		let mut slot = self.slot.lock();
		slot.closed = true;
		if let Some(run) = slot.run.take() {
			tracing::debug!(generation = %run.generation, "host.shutdown");
			run.cancel.cancel();
		}
	}
}

impl Drop for IsolationHost {
	fn drop(&mut self) {
		if let Some(run) = self.slot.get_mut().run.take() {
			run.cancel.cancel();
		}
	}
}

impl std::fmt::Debug for IsolationHost {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("IsolationHost")
			.field("limits", &self.limits)
			.field("current", &self.current())
			.finish_non_exhaustive()
	}
}
