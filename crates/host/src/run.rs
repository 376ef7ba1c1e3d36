use livepane_bridge::{EventSender, Generation, RunOutcome};
use tokio_util::sync::CancellationToken;

use crate::limits::HostLimits;
use crate::realm::Realm;
use crate::scan::{Position, script_blocks};

/// Loads `document` into a fresh realm and runs it to completion.
///
/// Cancellation is checked between script blocks and between timer
/// callbacks; a block that is already running finishes or hits an engine
/// limit.
pub(crate) fn run_document(document: &str, generation: Generation, sink: EventSender, limits: &HostLimits, cancel: &CancellationToken) -> RunOutcome {
	let mut realm = match Realm::new(generation, sink, limits) {
		Ok(realm) => realm,
		Err(error) => {
			tracing::error!(%generation, %error, "preview.realm_setup_failed");
			return RunOutcome::Failed { reason: error.to_string() };
		}
	};

	let blocks = script_blocks(document);
	tracing::debug!(%generation, blocks = blocks.len(), "preview.run");

	let mut scripts = 0;
	let mut last_start = Position::START;
	for block in &blocks {
		if cancel.is_cancelled() {
			return RunOutcome::Abandoned;
		}
		last_start = block.code_start();
		if let Err(error) = realm.eval(block.source) {
			realm.report_uncaught(&error, block.start, last_start);
		}
		scripts += 1;
	}

	let mut timers = 0;
	while timers < limits.max_timer_callbacks {
		if cancel.is_cancelled() {
			return RunOutcome::Abandoned;
		}
		match realm.run_next_timer() {
			Ok(false) => break,
			Ok(true) => timers += 1,
			Err(error) => {
				timers += 1;
				realm.report_uncaught(&error, last_start, last_start);
			}
		}
	}
	if timers == limits.max_timer_callbacks {
		tracing::debug!(%generation, timers, "preview.timer_budget_exhausted");
	}

	RunOutcome::Completed { scripts, timers }
}
