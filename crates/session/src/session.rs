//! Preview session: the rebuild trigger in front of one isolation host.
//!
//! [`PreviewSession::sync`] is the rebuild trigger. Every buffer change is
//! funneled through it; it assembles a fresh document and, unless the result
//! is byte-identical to what is already loaded, reloads the host under a new
//! generation.

use livepane_bridge::{Generation, GenerationClock, RunOutcome, SignalRelay, event_channel};
use livepane_document::{AssembledDocument, SourceBuffer, assemble};
use livepane_host::{ExecutionResult, HostError, IsolationHost, execute_with_timeout};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::diagnostics::{Diagnostic, diagnostics};

/// Result of one [`PreviewSession::sync`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebuildOutcome {
	/// The assembled document matched the loaded one; nothing happened.
	Unchanged,
	/// The host was reloaded under `generation`.
	Reloaded { generation: Generation },
}

struct Loaded {
	generation: Generation,
	document: AssembledDocument,
}

/// One live preview and the document it has loaded.
pub struct PreviewSession {
	config: Config,
	relay: SignalRelay,
	host: IsolationHost,
	clock: GenerationClock,
	loaded: Mutex<Option<Loaded>>,
	pump_cancel: CancellationToken,
	pump: Mutex<Option<JoinHandle<()>>>,
}

impl PreviewSession {
	/// Creates the session and spawns its relay pump on the current runtime.
	pub fn start(config: Config) -> Self {
		let (tx, rx) = event_channel();
		let relay = SignalRelay::new(config.relay.relay_config());
		let host = IsolationHost::new(tx, config.host.clone());
		let pump_cancel = CancellationToken::new();
		let pump = tokio::spawn(relay.clone().pump(rx, pump_cancel.clone()));
		tracing::debug!(?config, "session.start");

		Self {
			config,
			relay,
			host,
			clock: GenerationClock::new(),
			loaded: Mutex::new(None),
			pump_cancel,
			pump: Mutex::new(Some(pump)),
		}
	}

	pub fn config(&self) -> &Config {
		&self.config
	}

	pub fn relay(&self) -> &SignalRelay {
		&self.relay
	}

	/// The document currently loaded in the host.
	pub fn document(&self) -> Option<AssembledDocument> {
		self.loaded.lock().as_ref().map(|loaded| loaded.document.clone())
	}

	/// Rebuilds the preview from `buffers`.
	pub fn sync(&self, buffers: &[SourceBuffer]) -> Result<RebuildOutcome, HostError> {
		let document = assemble(buffers);
		let mut loaded = self.loaded.lock();
		if loaded.as_ref().is_some_and(|current| current.document.as_str() == document.as_str()) {
			tracing::trace!("session.sync.unchanged");
			return Ok(RebuildOutcome::Unchanged);
		}
		let generation = self.load(&document)?;
		*loaded = Some(Loaded { generation, document });
		Ok(RebuildOutcome::Reloaded { generation })
	}

	/// Reloads the current document under a new generation, even if unchanged.
	///
	/// Returns `None` when nothing has been loaded yet.
	pub fn force_reload(&self) -> Result<Option<Generation>, HostError> {
		let mut loaded = self.loaded.lock();
		let Some(current) = loaded.as_mut() else {
			return Ok(None);
		};
		current.generation = self.load(&current.document)?;
		Ok(Some(current.generation))
	}

	/// The relay switches generations only once the host has accepted the
	/// reload; a refused reload leaves both logs and the active run alone.
	fn load(&self, document: &AssembledDocument) -> Result<Generation, HostError> {
		let generation = self.clock.next();
		tracing::debug!(%generation, bytes = document.len(), "session.reload");
		self.host.reload_with(document.as_str(), generation, || self.relay.activate(generation))?;
		Ok(generation)
	}

	/// Resolves once `generation` has settled or been superseded.
	pub async fn wait_settled(&self, generation: Generation) -> RunOutcome {
		self.relay.wait_settled(generation).await
	}

	/// Errors raised by the loaded run, mapped onto its script buffer.
	///
	/// Entries from earlier generations are left out; their lines refer to a
	/// document that is no longer loaded.
	pub fn diagnostics(&self) -> Vec<Diagnostic> {
		let loaded = self.loaded.lock();
		let Some(loaded) = loaded.as_ref() else {
			return Vec::new();
		};
		let errors: Vec<_> = self.relay.errors().into_iter().filter(|entry| entry.generation == loaded.generation).collect();
		diagnostics(&loaded.document, &errors)
	}

	/// Runs one buffer through explicit execution off the async runtime.
	pub async fn execute(&self, code: &str, language: &str) -> ExecutionResult {
		let code = code.to_owned();
		let language = language.to_owned();
		let limits = self.config.host.clone();
		let timeout = self.config.execute.timeout();
		let task = tokio::task::spawn_blocking(move || execute_with_timeout(&code, &language, &limits, timeout));
		match task.await {
			Ok(result) => result,
			Err(error) => {
				tracing::error!(%error, "session.execute_join_failed");
				ExecutionResult {
					output: String::new(),
					error: Some(format!("execution task failed: {error}")),
				}
			}
		}
	}

	/// Stops the host and the relay pump. Logs stay readable.
	pub async fn shutdown(&self) {
		self.host.shutdown();
		self.pump_cancel.cancel();
		let pump = self.pump.lock().take();
		if let Some(pump) = pump
			&& let Err(error) = pump.await
		{
			tracing::warn!(%error, "session.pump_join_failed");
		}
	}
}

impl Drop for PreviewSession {
	fn drop(&mut self) {
		self.pump_cancel.cancel();
	}
}
