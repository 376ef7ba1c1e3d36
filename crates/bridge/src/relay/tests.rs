use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;

use super::*;
use crate::generation::GenerationClock;
use crate::message::ConsoleLevel;

fn active_relay() -> (SignalRelay, Generation) {
	let relay = SignalRelay::default();
	let generation = GenerationClock::new().next();
	relay.activate(generation);
	(relay, generation)
}

fn post(generation: Generation, data: serde_json::Value) -> HostEvent {
	HostEvent::Post { generation, data }
}

#[test]
fn console_message_keeps_level_and_content() {
	let (relay, generation) = active_relay();
	let disposition = relay.accept(post(generation, json!({ "type": "console", "level": "warn", "content": "careful" })));

	assert_eq!(disposition, Disposition::AppendedConsole);
	assert_eq!(
		relay.console()[0].signal,
		RelayedSignal::Console {
			level: ConsoleLevel::Warn,
			text: "careful".to_string(),
		}
	);
	assert!(relay.errors().is_empty());
}

#[test]
fn console_message_without_level_defaults_to_log() {
	let (relay, generation) = active_relay();
	relay.accept(post(generation, json!({ "type": "console", "content": "legacy" })));

	assert_eq!(
		relay.console()[0].signal,
		RelayedSignal::Console {
			level: ConsoleLevel::Log,
			text: "legacy".to_string(),
		}
	);
}

#[test]
fn error_message_keeps_position() {
	let (relay, generation) = active_relay();
	let disposition = relay.accept(post(
		generation,
		json!({ "type": "error", "content": "Uncaught Error: boom", "line": 12, "column": 5 }),
	));

	assert_eq!(disposition, Disposition::AppendedError);
	let entry = &relay.errors()[0];
	assert_eq!(entry.generation, generation);
	assert_eq!(
		entry.signal,
		RelayedSignal::Error {
			text: "Uncaught Error: boom".to_string(),
			line: 12,
			column: 5,
		}
	);
}

#[test]
fn foreign_and_malformed_posts_are_ignored() {
	let (relay, generation) = active_relay();
	let foreign = [
		json!("just a string"),
		json!({ "type": "resize", "width": 10 }),
		json!({ "type": "console", "level": "trace", "content": "x" }),
		json!({ "type": "console", "level": "log" }),
		json!({ "type": "error", "content": "no position" }),
		json!({ "type": "error", "content": "x", "line": -1, "column": 1 }),
		serde_json::Value::Null,
	];
	for data in foreign {
		assert_eq!(relay.accept(post(generation, data)), Disposition::Malformed);
	}

	assert!(relay.console().is_empty());
	assert!(relay.errors().is_empty());
	assert_eq!(relay.stats().malformed, 7);
}

#[test]
fn duplicate_messages_are_not_deduplicated() {
	let (relay, generation) = active_relay();
	for _ in 0..3 {
		relay.accept(post(generation, json!({ "type": "console", "level": "log", "content": "same" })));
	}
	assert_eq!(relay.console().len(), 3);
}

#[test]
fn status_revision_advances_on_accept() {
	let (relay, generation) = active_relay();
	let before = relay.subscribe().borrow().revision;
	relay.accept(post(generation, json!({ "type": "console", "content": "x" })));
	let status = relay.subscribe().borrow().clone();
	assert!(status.revision > before);
	assert_eq!(status.last_seq, 1);
	assert_eq!(status.active, Some(generation));
}

#[tokio::test]
async fn pump_drains_channel_in_order() {
	let (relay, generation) = active_relay();
	let (tx, rx) = event_channel();
	let cancel = CancellationToken::new();
	let task = tokio::spawn(relay.clone().pump(rx, cancel.clone()));

	for n in 0..5 {
		tx.send(post(generation, json!({ "type": "console", "content": n.to_string() })))
			.expect("pump should be receiving");
	}
	tx.send(HostEvent::Settled {
		generation,
		outcome: RunOutcome::Completed { scripts: 1, timers: 0 },
	})
	.expect("pump should be receiving");

	let outcome = tokio::time::timeout(Duration::from_secs(5), relay.wait_settled(generation))
		.await
		.expect("run should settle");
	assert_eq!(outcome, RunOutcome::Completed { scripts: 1, timers: 0 });

	let texts: Vec<_> = relay.console().into_iter().map(|entry| entry.signal.text().to_string()).collect();
	assert_eq!(texts, vec!["0", "1", "2", "3", "4"]);

	cancel.cancel();
	task.await.expect("pump should exit cleanly");
}

#[tokio::test]
async fn wait_settled_reports_superseded_generation_as_abandoned() {
	let clock = GenerationClock::new();
	let relay = SignalRelay::default();
	let old = clock.next();
	relay.activate(old);
	relay.activate(clock.next());

	let outcome = tokio::time::timeout(Duration::from_secs(5), relay.wait_settled(old))
		.await
		.expect("superseded generation resolves immediately");
	assert_eq!(outcome, RunOutcome::Abandoned);
}

#[tokio::test]
async fn pump_exits_when_senders_drop() {
	let relay = SignalRelay::default();
	let (tx, rx) = event_channel();
	let task = tokio::spawn(relay.pump(rx, CancellationToken::new()));
	drop(tx);
	tokio::time::timeout(Duration::from_secs(5), task)
		.await
		.expect("pump should exit")
		.expect("pump should not panic");
}
