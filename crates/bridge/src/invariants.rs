use std::sync::atomic::{AtomicBool, Ordering};

use serde_json::json;

use crate::{ConsoleLevel, Disposition, GenerationClock, HostEvent, RelayConfig, RelayedSignal, Retention, RunOutcome, SignalRelay};

fn console_post(generation: crate::Generation, level: &str, content: &str) -> HostEvent {
	HostEvent::Post {
		generation,
		data: json!({ "type": "console", "level": level, "content": content }),
	}
}

/// Must reject every event tagged with a generation other than the active one.
///
/// * Enforced in: `SignalRelay::accept`
/// * Failure symptom: output from a torn-down preview shows up after a reload.
#[cfg_attr(test, test)]
pub(crate) fn test_stale_generation_never_reaches_a_log() {
	let clock = GenerationClock::new();
	let relay = SignalRelay::default();
	let old = clock.next();
	let new = clock.next();

	relay.activate(old);
	assert_eq!(relay.accept(console_post(old, "log", "before")), Disposition::AppendedConsole);

	relay.activate(new);
	assert_eq!(relay.accept(console_post(old, "log", "late")), Disposition::Stale);
	assert_eq!(
		relay.accept(HostEvent::Settled {
			generation: old,
			outcome: RunOutcome::Abandoned,
		}),
		Disposition::Stale
	);

	let texts: Vec<_> = relay.console().into_iter().map(|entry| entry.signal.text().to_string()).collect();
	assert_eq!(texts, vec!["before".to_string()]);
	assert_eq!(relay.stats().stale, 2);
}

/// Must accept nothing before the first activation.
///
/// * Enforced in: `SignalRelay::accept` (`active` starts as `None`)
/// * Failure symptom: stray messages posted before any preview loaded are logged.
#[cfg_attr(test, test)]
pub(crate) fn test_inactive_relay_rejects_everything() {
	let relay = SignalRelay::default();
	let generation = GenerationClock::new().next();
	assert_eq!(relay.accept(console_post(generation, "log", "x")), Disposition::Stale);
	assert!(relay.console().is_empty());
}

/// Must append exactly one entry per accepted message, in arrival order,
/// with a sequence shared across both logs.
///
/// * Enforced in: `RelayState::append`
/// * Failure symptom: console and error timelines cannot be interleaved.
#[cfg_attr(test, test)]
pub(crate) fn test_sequence_is_shared_and_strictly_increasing() {
	let relay = SignalRelay::default();
	let generation = GenerationClock::new().next();
	relay.activate(generation);

	relay.accept(console_post(generation, "info", "one"));
	relay.accept(HostEvent::Post {
		generation,
		data: json!({ "type": "error", "content": "two", "line": 3, "column": 9 }),
	});
	relay.accept(console_post(generation, "warn", "three"));

	let merged = relay.since(0);
	let seqs: Vec<_> = merged.iter().map(|entry| entry.seq).collect();
	assert_eq!(seqs, vec![1, 2, 3]);
	assert_eq!(
		merged[1].signal,
		RelayedSignal::Error {
			text: "two".to_string(),
			line: 3,
			column: 9,
		}
	);
	assert_eq!(
		merged[2].signal,
		RelayedSignal::Console {
			level: ConsoleLevel::Warn,
			text: "three".to_string(),
		}
	);
}

/// Must keep logs across activations unless clearing is configured.
///
/// * Enforced in: `SignalRelay::activate`
/// * Failure symptom: history silently disappears on every keystroke, or
///   never clears when the user asked for per-run logs.
#[cfg_attr(test, test)]
pub(crate) fn test_reload_clearing_follows_config() {
	let clock = GenerationClock::new();

	let keep = SignalRelay::default();
	let first = clock.next();
	keep.activate(first);
	keep.accept(console_post(first, "log", "kept"));
	keep.activate(clock.next());
	assert_eq!(keep.console().len(), 1);

	let clear = SignalRelay::new(RelayConfig {
		clear_on_reload: true,
		..RelayConfig::default()
	});
	let second = clock.next();
	clear.activate(second);
	clear.accept(console_post(second, "log", "dropped"));
	clear.activate(clock.next());
	assert!(clear.console().is_empty());
}

/// Must evict oldest entries first and account for every eviction.
///
/// * Enforced in: `SignalLog::push`
/// * Failure symptom: unbounded memory growth, or silent loss of recent output.
#[cfg_attr(test, test)]
pub(crate) fn test_retention_evicts_oldest_and_counts() {
	let relay = SignalRelay::new(RelayConfig {
		console: Retention::from_max(Some(2)),
		..RelayConfig::default()
	});
	let generation = GenerationClock::new().next();
	relay.activate(generation);
	for text in ["a", "b", "c", "d"] {
		relay.accept(console_post(generation, "log", text));
	}

	let texts: Vec<_> = relay.console().into_iter().map(|entry| entry.signal.text().to_string()).collect();
	assert_eq!(texts, vec!["c".to_string(), "d".to_string()]);
	assert_eq!(relay.stats().console, 4);
	assert_eq!(relay.stats().console_evicted, 2);
}

/// Must never publish a status older than the state it was taken from.
///
/// * Enforced in: `SignalRelay::publish`
/// * Failure symptom: `RelayStatus::active` briefly steps back to a replaced
///   generation, and `wait_settled` watchers miss a reload.
#[cfg_attr(test, test)]
pub(crate) fn test_published_status_never_goes_backwards() {
	let clock = GenerationClock::new();
	let relay = SignalRelay::default();
	let stale = clock.next();
	let status = relay.subscribe();
	let done = AtomicBool::new(false);

	let behind = std::thread::scope(|scope| {
		scope.spawn(|| {
			while !done.load(Ordering::Relaxed) {
				relay.accept(console_post(stale, "log", "late"));
			}
		});
		let mut behind = 0;
		for _ in 0..2_000 {
			let generation = clock.next();
			relay.activate(generation);
			if status.borrow().active != Some(generation) {
				behind += 1;
			}
		}
		done.store(true, Ordering::Relaxed);
		behind
	});
	assert_eq!(behind, 0);
	assert!(relay.console().is_empty());
}
