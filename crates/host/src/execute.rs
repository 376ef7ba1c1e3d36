//! Explicit, one-shot execution of a single buffer.
//!
//! Unlike the preview, this path returns captured console text directly
//! instead of emitting signals. Each call gets its own engine context.

use std::panic::AssertUnwindSafe;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use boa_engine::{Context, JsError, JsValue, Source, js_string};
use livepane_document::LanguageTag;
use serde::Serialize;

use crate::limits::{ENGINE_THREAD_STACK, HostLimits};
use crate::realm::describe_error;

/// Console replacement installed before user code runs.
const CAPTURE_PRELUDE: &str = r#"(function (global) {
	var captured = [];
	function capture() {
		captured.push(Array.prototype.slice.call(arguments).join(" ") + "\n");
	}
	global.console = { log: capture, info: capture, warn: capture, error: capture, debug: capture };
	Object.defineProperty(global, "__livepaneCaptured", {
		enumerable: false,
		value: function () {
			return captured.join("");
		},
	});
})(globalThis);"#;

const READ_CAPTURED: &str = "__livepaneCaptured()";

/// Output of [`execute`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExecutionResult {
	/// Captured console text, or a fixed notice for non-script languages.
	pub output: String,
	/// Message of the thrown value, if the code threw.
	pub error: Option<String>,
}

impl ExecutionResult {
	fn notice(output: impl Into<String>) -> Self {
		Self {
			output: output.into(),
			error: None,
		}
	}

	fn failed(error: impl Into<String>) -> Self {
		Self {
			output: String::new(),
			error: Some(error.into()),
		}
	}
}

/// Runs `code` as `language` on the calling thread.
///
/// `language` is a tag name; unknown names produce a notice rather than an
/// error. Markup and stylesheets are only meaningful in the preview.
pub fn execute(code: &str, language: &str, limits: &HostLimits) -> ExecutionResult {
	let Ok(tag) = language.parse::<LanguageTag>() else {
		return ExecutionResult::notice(format!("Execution of {language} is not supported in this environment."));
	};
	match tag {
		LanguageTag::Html => ExecutionResult::notice("HTML execution is handled in the preview pane."),
		LanguageTag::Css => ExecutionResult::notice("CSS execution is handled in the preview pane."),
		LanguageTag::Javascript | LanguageTag::Typescript | LanguageTag::React => run_captured(code, limits),
	}
}

/// [`execute`] on a dedicated engine thread, giving up after `timeout`.
///
/// A timed-out thread is left to run into its engine limits; its result is
/// discarded.
pub fn execute_with_timeout(code: &str, language: &str, limits: &HostLimits, timeout: Duration) -> ExecutionResult {
	let (tx, rx) = mpsc::channel();
	let code = code.to_owned();
	let language = language.to_owned();
	let limits = limits.clone();
	let span = tracing::Span::current();

	let spawned = thread::Builder::new()
		.name("livepane-execute".into())
		.stack_size(ENGINE_THREAD_STACK)
		.spawn(move || {
			let _guard = span.enter();
			let result = std::panic::catch_unwind(AssertUnwindSafe(|| execute(&code, &language, &limits)))
				.unwrap_or_else(|_| ExecutionResult::failed("engine panicked during execution"));
			let _ = tx.send(result);
		});
	if let Err(error) = spawned {
		tracing::error!(%error, "execute.spawn_failed");
		return ExecutionResult::failed(format!("failed to start execution: {error}"));
	}

	match rx.recv_timeout(timeout) {
		Ok(result) => result,
		Err(mpsc::RecvTimeoutError::Timeout) => {
			tracing::warn!(timeout_ms = timeout.as_millis(), "execute.timed_out");
			ExecutionResult::failed(format!("execution timed out after {} ms", timeout.as_millis()))
		}
		Err(mpsc::RecvTimeoutError::Disconnected) => ExecutionResult::failed("execution thread exited without a result"),
	}
}

fn run_captured(code: &str, limits: &HostLimits) -> ExecutionResult {
	let mut context = Context::default();
	limits.apply(&mut context);
	if let Err(error) = context.eval(Source::from_bytes(CAPTURE_PRELUDE)) {
		return ExecutionResult::failed(error_message(&error, &mut context));
	}

	let wrapped = format!("(function () {{\n{code}\n}})();");
	let error = context.eval(Source::from_bytes(&wrapped)).err().map(|error| error_message(&error, &mut context));
	let output = context
		.eval(Source::from_bytes(READ_CAPTURED))
		.ok()
		.and_then(|text| text.as_string().map(|text| text.to_std_string_escaped()))
		.unwrap_or_default();

	tracing::debug!(bytes = output.len(), failed = error.is_some(), "execute.finished");
	ExecutionResult { output, error }
}

/// The thrown value's `message` for error objects, its string form otherwise.
fn error_message(error: &JsError, context: &mut Context) -> String {
	if let Some(native) = error.as_native() {
		let text = native.to_string();
		return match text.split_once(": ") {
			Some((_, message)) => message.to_owned(),
			None => text,
		};
	}
	let message = error
		.as_opaque()
		.and_then(JsValue::as_object)
		.and_then(|object| object.get(js_string!("message"), context).ok())
		.filter(|message| !message.is_undefined());
	match message {
		Some(message) => message
			.to_string(context)
			.map(|text| text.to_std_string_escaped())
			.unwrap_or_else(|_| describe_error(error, context)),
		None => describe_error(error, context),
	}
}
