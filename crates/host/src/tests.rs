use std::time::Duration;

use livepane_bridge::{EventReceiver, Generation, GenerationClock, HostEvent, RunOutcome, event_channel};
use livepane_document::{LanguageTag, SourceBuffer, assemble};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

use super::*;

const SETTLE: Duration = Duration::from_secs(20);

fn document(html: &str, css: &str, js: &str) -> String {
	assemble(&[
		SourceBuffer::new("index", LanguageTag::Html, html),
		SourceBuffer::new("style", LanguageTag::Css, css),
		SourceBuffer::new("script", LanguageTag::Javascript, js),
	])
	.into_string()
}

/// Collects posts for `generation` until its run settles.
async fn drain(rx: &mut EventReceiver, generation: Generation) -> (Vec<Value>, RunOutcome) {
	let mut posts = Vec::new();
	loop {
		let event = tokio::time::timeout(SETTLE, rx.recv())
			.await
			.expect("run settled in time")
			.expect("host keeps the channel open");
		match event {
			HostEvent::Post { generation: g, data } if g == generation => posts.push(data),
			HostEvent::Settled { generation: g, outcome } if g == generation => return (posts, outcome),
			_ => {}
		}
	}
}

async fn run_once(document: String) -> (Vec<Value>, RunOutcome) {
	let (tx, mut rx) = event_channel();
	let host = IsolationHost::new(tx, HostLimits::default());
	let generation = GenerationClock::new().next();
	host.reload(document, generation).expect("engine thread spawns");
	drain(&mut rx, generation).await
}

#[tokio::test]
async fn console_log_posts_one_console_message() {
	let (posts, outcome) = run_once(document("<h1>Hi</h1>", "", "console.log('x')")).await;
	assert_eq!(posts, vec![json!({ "type": "console", "level": "log", "content": "x" })]);
	assert_eq!(outcome, RunOutcome::Completed { scripts: 2, timers: 0 });
}

#[tokio::test]
async fn console_levels_and_arguments_are_forwarded() {
	let (posts, _) = run_once(document("", "", "console.warn('a', 1, true); console.info(); console.error(null, 'b')")).await;
	assert_eq!(
		posts,
		vec![
			json!({ "type": "console", "level": "warn", "content": "a 1 true" }),
			json!({ "type": "console", "level": "info", "content": "" }),
			json!({ "type": "console", "level": "error", "content": " b" }),
		]
	);
}

#[tokio::test]
async fn uncaught_throw_posts_one_error_at_the_script_line() {
	let doc = assemble(&[SourceBuffer::new("script", LanguageTag::Javascript, "throw new Error('boom')")]);
	let script_line = doc.script_line();
	let (posts, _) = run_once(doc.into_string()).await;

	assert_eq!(posts.len(), 1);
	let error = &posts[0];
	assert_eq!(error["type"], "error");
	let content = error["content"].as_str().expect("content is a string");
	assert!(content.contains("boom"), "{content}");
	assert!(content.starts_with("Uncaught "), "{content}");
	assert_eq!(error["line"], json!(script_line));
	assert_eq!(error["column"], json!(1));
}

#[tokio::test]
async fn syntax_errors_point_into_the_script() {
	let doc = assemble(&[SourceBuffer::new("script", LanguageTag::Javascript, "let ok = 1;\nlet = = 2;")]);
	let script_line = doc.script_line();
	let (posts, _) = run_once(doc.into_string()).await;

	assert_eq!(posts.len(), 1);
	let line = posts[0]["line"].as_u64().expect("numeric line");
	assert!(line >= u64::from(script_line), "line {line} before script line {script_line}");
	assert!(line <= u64::from(script_line) + 1, "line {line} past the script");
}

#[tokio::test]
async fn errors_after_output_keep_arrival_order() {
	let (posts, _) = run_once(document("", "", "console.log('first');\nnull.boom;")).await;
	assert_eq!(posts.len(), 2);
	assert_eq!(posts[0]["type"], "console");
	assert_eq!(posts[1]["type"], "error");
}

#[tokio::test]
async fn timers_run_after_scripts_in_due_order() {
	let js = "setTimeout(function () { console.log('late') }, 50);\n\
	          setTimeout(function (word) { console.log(word) }, 10, 'early');\n\
	          var id = setTimeout(function () { console.log('never') }, 20);\n\
	          clearTimeout(id);\n\
	          console.log('sync');";
	let (posts, outcome) = run_once(document("", "", js)).await;
	let contents: Vec<_> = posts.iter().map(|post| post["content"].clone()).collect();
	assert_eq!(contents, vec![json!("sync"), json!("early"), json!("late")]);
	assert_eq!(outcome, RunOutcome::Completed { scripts: 2, timers: 2 });
}

#[tokio::test]
async fn intervals_stop_at_the_timer_budget() {
	let (tx, mut rx) = event_channel();
	let limits = HostLimits {
		max_timer_callbacks: 3,
		..HostLimits::default()
	};
	let host = IsolationHost::new(tx, limits);
	let generation = GenerationClock::new().next();
	host.reload(document("", "", "setInterval(function () { console.log('tick') }, 5);"), generation)
		.expect("engine thread spawns");
	let (posts, outcome) = drain(&mut rx, generation).await;
	assert_eq!(posts.len(), 3);
	assert_eq!(outcome, RunOutcome::Completed { scripts: 2, timers: 3 });
}

#[tokio::test]
async fn user_onerror_handler_replaces_the_shim_hook() {
	let js = "window.onerror = function () { return true; };\nthrow new Error('hidden');";
	let (posts, _) = run_once(document("", "", js)).await;
	assert!(posts.is_empty(), "{posts:?}");
}

#[tokio::test]
async fn uncloneable_messages_throw_in_the_sender() {
	let js = "try { window.parent.postMessage({ n: 1n }, '*'); } catch (e) { console.log(e instanceof TypeError); }";
	let (posts, _) = run_once(document("", "", js)).await;
	assert_eq!(posts, vec![json!({ "type": "console", "level": "log", "content": "true" })]);
}

#[tokio::test]
async fn raw_posts_are_forwarded_unvalidated() {
	let (posts, _) = run_once(document("", "", "parent.postMessage({ hello: 'world' }, '*'); self.parent.postMessage('text');")).await;
	assert_eq!(posts, vec![json!({ "hello": "world" }), json!("text")]);
}

#[tokio::test]
async fn runaway_loop_is_reported_and_run_still_settles() {
	let (tx, mut rx) = event_channel();
	let limits = HostLimits {
		loop_iteration_limit: 10_000,
		..HostLimits::default()
	};
	let host = IsolationHost::new(tx, limits);
	let generation = GenerationClock::new().next();
	host.reload(document("", "", "while (true) {}"), generation).expect("engine thread spawns");
	let (posts, outcome) = drain(&mut rx, generation).await;
	assert_eq!(posts.len(), 1);
	assert_eq!(posts[0]["type"], "error");
	assert!(matches!(outcome, RunOutcome::Completed { .. }));
}

#[tokio::test]
async fn reload_replaces_the_current_generation() {
	let (tx, mut rx) = event_channel();
	let host = IsolationHost::new(tx, HostLimits::default());
	let clock = GenerationClock::new();

	let first = clock.next();
	host.reload(document("", "", "console.log('one')"), first).expect("engine thread spawns");
	let second = clock.next();
	host.reload(document("", "", "console.log('two')"), second).expect("engine thread spawns");
	assert_eq!(host.current(), Some(second));

	let (posts, outcome) = drain(&mut rx, second).await;
	assert_eq!(posts, vec![json!({ "type": "console", "level": "log", "content": "two" })]);
	assert!(matches!(outcome, RunOutcome::Completed { .. }));
}

#[test]
fn shut_down_host_refuses_reloads() {
	let (tx, _rx) = event_channel();
	let host = IsolationHost::new(tx, HostLimits::default());
	host.shutdown();
	let err = host.reload("<script></script>", GenerationClock::new().next()).unwrap_err();
	assert!(matches!(err, HostError::ShutDown));
	assert_eq!(host.current(), None);
}

#[tokio::test]
async fn shim_calls_the_original_console_before_posting() {
	let recorder = "<script>var calls = []; console.log = function () { calls.push(Array.prototype.slice.call(arguments).join(' ')); };</script>";
	let user = "<script>console.log('x', 1); parent.postMessage({ forwarded: calls }, '*');</script>";
	let doc = format!("<html><head>{recorder}{}</head><body>{user}</body></html>", livepane_document::shim::shim_element());
	let (posts, _) = run_once(doc).await;
	assert_eq!(
		posts,
		vec![
			json!({ "type": "console", "level": "log", "content": "x 1" }),
			json!({ "forwarded": ["x 1"] }),
		]
	);
}

#[tokio::test]
async fn start_hook_runs_before_the_first_script() {
	let (tx, mut rx) = event_channel();
	let host = IsolationHost::new(tx, HostLimits::default());
	let generation = GenerationClock::new().next();
	let mut queued_at_start = None;
	host.reload_with(document("", "", "console.log('x')"), generation, || {
		queued_at_start = Some(rx.try_recv().is_err());
	})
	.expect("engine thread spawns");
	assert_eq!(queued_at_start, Some(true));

	let (posts, _) = drain(&mut rx, generation).await;
	assert_eq!(posts.len(), 1);
}

#[test]
fn shut_down_host_skips_the_start_hook() {
	let (tx, _rx) = event_channel();
	let host = IsolationHost::new(tx, HostLimits::default());
	host.shutdown();
	let mut started = false;
	let err = host
		.reload_with("<script></script>", GenerationClock::new().next(), || started = true)
		.unwrap_err();
	assert!(matches!(err, HostError::ShutDown));
	assert!(!started);
}
