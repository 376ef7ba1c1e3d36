//! Construction of one isolated engine context.
//!
//! The context sees a browser-shaped global surface and nothing else:
//!
//! * `window` and `self` alias the global object.
//! * `window.parent.postMessage(data, targetOrigin)` is the only way out.
//!   `data` is converted to JSON and sent, tagged with the context's
//!   generation; values that cannot be converted throw a `TypeError`.
//! * `console.{log,info,warn,error,debug}` write to the structured log under
//!   the `livepane::preview` target.
//! * `setTimeout`/`setInterval` and their `clear*` twins queue callbacks on a
//!   virtual clock drained after the last script block.

use boa_engine::object::ObjectInitializer;
use boa_engine::property::Attribute;
use boa_engine::{Context, JsArgs, JsError, JsNativeError, JsResult, JsString, JsValue, NativeFunction, Source, js_string};
use livepane_bridge::{ConsoleLevel, EventSender, Generation, HostEvent};

use crate::limits::HostLimits;
use crate::scan::{Position, syntax_error_position};

/// Timer queue living inside the context.
const TIMER_PRELUDE: &str = r#"(function (global) {
	var queue = [];
	var nextId = 1;
	var now = 0;
	function schedule(callback, delay, args, repeat) {
		var id = nextId++;
		var wait = Math.max(0, Number(delay) || 0);
		queue.push({ id: id, due: now + wait, callback: callback, args: args, every: repeat ? Math.max(wait, 1) : -1 });
		return id;
	}
	function cancel(id) {
		for (var i = 0; i < queue.length; i++) {
			if (queue[i].id === id) {
				queue.splice(i, 1);
				return;
			}
		}
	}
	global.setTimeout = function (callback, delay) {
		return schedule(callback, delay, Array.prototype.slice.call(arguments, 2), false);
	};
	global.setInterval = function (callback, delay) {
		return schedule(callback, delay, Array.prototype.slice.call(arguments, 2), true);
	};
	global.clearTimeout = cancel;
	global.clearInterval = cancel;
	Object.defineProperty(global, "__livepaneRunNextTimer", {
		enumerable: false,
		value: function () {
			if (queue.length === 0) {
				return false;
			}
			var index = 0;
			for (var i = 1; i < queue.length; i++) {
				if (queue[i].due < queue[index].due) {
					index = i;
				}
			}
			var timer = queue.splice(index, 1)[0];
			now = timer.due;
			if (timer.every >= 0) {
				timer.due = now + timer.every;
				queue.push(timer);
			}
			if (typeof timer.callback === "function") {
				timer.callback.apply(global, timer.args);
			} else {
				(0, eval)(String(timer.callback));
			}
			return true;
		},
	});
})(globalThis);"#;

const RUN_NEXT_TIMER: &str = "__livepaneRunNextTimer()";

/// Source URL reported to `window.onerror`.
const DOCUMENT_URL: &str = "about:srcdoc";

pub(crate) struct Realm {
	context: Context,
	generation: Generation,
}

impl Realm {
	pub(crate) fn new(generation: Generation, sink: EventSender, limits: &HostLimits) -> JsResult<Self> {
		let mut context = Context::default();
		limits.apply(&mut context);

		let global = context.global_object();
		context.register_global_property(js_string!("window"), global.clone(), Attribute::all())?;
		context.register_global_property(js_string!("self"), global, Attribute::all())?;

		register_console(&mut context, generation)?;
		register_parent(&mut context, generation, sink)?;
		context.eval(Source::from_bytes(TIMER_PRELUDE))?;

		Ok(Self { context, generation })
	}

	pub(crate) fn eval(&mut self, source: &str) -> JsResult<JsValue> {
		self.context.eval(Source::from_bytes(source))
	}

	/// Runs the earliest pending timer. `Ok(false)` once the queue is empty.
	pub(crate) fn run_next_timer(&mut self) -> JsResult<bool> {
		self.eval(RUN_NEXT_TIMER).map(|more| more.to_boolean())
	}

	/// Routes an uncaught error through `window.onerror`.
	///
	/// Syntax errors are positioned relative to `origin`, where the failing
	/// source begins; anything else is reported at `fallback`. Default
	/// surfacing (a WARN log) only happens when no handler claims the error
	/// by returning `true`.
	pub(crate) fn report_uncaught(&mut self, error: &JsError, origin: Position, fallback: Position) {
		let message = format!("Uncaught {}", describe_error(error, &mut self.context));
		let position = error
			.as_native()
			.and_then(|native| syntax_error_position(&native.to_string()))
			.map_or(fallback, |relative| origin.offset(relative));
		let error_value = error.as_opaque().cloned().unwrap_or_else(JsValue::undefined);

		let handled = match self.onerror() {
			Some(handler) => {
				let args = [
					JsValue::from(JsString::from(message.as_str())),
					JsValue::from(JsString::from(DOCUMENT_URL)),
					JsValue::from(position.line),
					JsValue::from(position.column),
					error_value,
				];
				match handler.call(&JsValue::undefined(), &args, &mut self.context) {
					Ok(result) => result.to_boolean(),
					Err(err) => {
						tracing::warn!(generation = %self.generation, error = %err, "preview.onerror_threw");
						false
					}
				}
			}
			None => false,
		};

		if !handled {
			tracing::warn!(
				target: "livepane::preview",
				generation = %self.generation,
				line = position.line,
				column = position.column,
				"{message}"
			);
		}
	}

	fn onerror(&mut self) -> Option<boa_engine::JsObject> {
		let global = self.context.global_object();
		let handler = global.get(js_string!("onerror"), &mut self.context).ok()?;
		handler.as_callable().cloned()
	}
}

/// Browser-style text for a thrown value, e.g. `Error: boom`.
pub(crate) fn describe_error(error: &JsError, context: &mut Context) -> String {
	match error.as_opaque() {
		Some(value) => value
			.to_string(context)
			.map(|text| text.to_std_string_escaped())
			.unwrap_or_else(|_| value.display().to_string()),
		None => error.to_string(),
	}
}

/// Joins console arguments the way `Array.prototype.join(" ")` would.
pub(crate) fn join_args(args: &[JsValue], context: &mut Context) -> JsResult<String> {
	let mut parts = Vec::with_capacity(args.len());
	for arg in args {
		if arg.is_null_or_undefined() {
			parts.push(String::new());
		} else {
			parts.push(arg.to_string(context)?.to_std_string_escaped());
		}
	}
	Ok(parts.join(" "))
}

fn console_method(level: ConsoleLevel, generation: Generation) -> NativeFunction {
	NativeFunction::from_copy_closure(move |_this, args, context| {
		let line = join_args(args, context)?;
		match level {
			ConsoleLevel::Log | ConsoleLevel::Info => {
				tracing::info!(target: "livepane::preview", %generation, %level, "{line}");
			}
			ConsoleLevel::Warn => tracing::warn!(target: "livepane::preview", %generation, "{line}"),
			ConsoleLevel::Error => tracing::error!(target: "livepane::preview", %generation, "{line}"),
		}
		Ok(JsValue::undefined())
	})
}

fn register_console(context: &mut Context, generation: Generation) -> JsResult<()> {
	let console = ObjectInitializer::new(context)
		.function(console_method(ConsoleLevel::Log, generation), js_string!("log"), 0)
		.function(console_method(ConsoleLevel::Info, generation), js_string!("info"), 0)
		.function(console_method(ConsoleLevel::Warn, generation), js_string!("warn"), 0)
		.function(console_method(ConsoleLevel::Error, generation), js_string!("error"), 0)
		.function(console_method(ConsoleLevel::Log, generation), js_string!("debug"), 0)
		.build();
	context.register_global_property(js_string!("console"), console, Attribute::all())
}

fn register_parent(context: &mut Context, generation: Generation, sink: EventSender) -> JsResult<()> {
	// SAFETY: the closure captures a channel sender and a plain generation
	// number. Neither holds garbage-collected engine values, so the
	// collector has nothing to trace through it.
	let post_message = unsafe {
		NativeFunction::from_closure(move |_this, args, context| {
			let data = args
				.get_or_undefined(0)
				.to_json(context)
				.map_err(|_| JsNativeError::typ().with_message("postMessage: message could not be cloned"))?;
			if sink.send(HostEvent::Post { generation, data }).is_err() {
				tracing::trace!(%generation, "preview.post_after_relay_closed");
			}
			Ok(JsValue::undefined())
		})
	};
	let parent = ObjectInitializer::new(context).function(post_message, js_string!("postMessage"), 2).build();
	context.register_global_property(js_string!("parent"), parent, Attribute::all())
}
