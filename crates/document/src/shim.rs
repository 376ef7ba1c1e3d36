//! Instrumentation shim injected as the first script of every preview document.
//!
//! The isolated context gives the shim exactly one outbound primitive,
//! `window.parent.postMessage`. The shim translates console calls and
//! uncaught errors into the channel contract:
//!
//! * `{ type: "console", level, content }` for `log`, `warn`, `error`, `info`
//! * `{ type: "error", content, line, column }` from `window.onerror`
//!
//! Wrapped console methods still call the original primitive first so the
//! host's own console output keeps working. The error hook returns `true`,
//! which marks the error as handled and suppresses default surfacing.

/// Console levels wrapped by the shim, in installation order.
pub const WRAPPED_LEVELS: [&str; 4] = ["log", "warn", "error", "info"];

/// Attribute marking the shim's script element.
pub const SHIM_MARKER: &str = "data-livepane-shim";

pub const SHIM_SCRIPT: &str = r#"(function () {
	var channel = window.parent;
	["log", "warn", "error", "info"].forEach(function (level) {
		var original = console[level];
		console[level] = function () {
			var args = Array.prototype.slice.call(arguments);
			if (typeof original === "function") {
				original.apply(console, args);
			}
			channel.postMessage({ type: "console", level: level, content: args.join(" ") }, "*");
		};
	});
	window.onerror = function (message, source, line, column, error) {
		channel.postMessage({ type: "error", content: String(message), line: line, column: column }, "*");
		return true;
	};
})();"#;

/// Returns the complete `<script>` element carrying the shim.
pub fn shim_element() -> String {
	format!("<script {SHIM_MARKER}>{SHIM_SCRIPT}</script>")
}
