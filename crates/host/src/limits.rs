use boa_engine::Context;
use boa_engine::vm::RuntimeLimits;
use serde::Deserialize;

/// Engine limits applied to every isolated context.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HostLimits {
	/// Iterations allowed per loop before the engine aborts the script.
	pub loop_iteration_limit: u64,
	/// Maximum JavaScript call depth.
	pub recursion_limit: usize,
	/// Engine value stack size, in slots.
	pub stack_size_limit: usize,
	/// Timer callbacks run after the last script block.
	pub max_timer_callbacks: usize,
}

impl Default for HostLimits {
	fn default() -> Self {
		Self {
			loop_iteration_limit: 1_000_000,
			recursion_limit: 256,
			stack_size_limit: 1024 * 1024,
			max_timer_callbacks: 1000,
		}
	}
}

impl HostLimits {
	pub(crate) fn apply(&self, context: &mut Context) {
		let mut limits = RuntimeLimits::default();
		limits.set_loop_iteration_limit(self.loop_iteration_limit);
		limits.set_recursion_limit(self.recursion_limit);
		limits.set_stack_size_limit(self.stack_size_limit);
		context.set_runtime_limits(limits);
	}
}

/// Native stack reserved for each engine thread.
pub(crate) const ENGINE_THREAD_STACK: usize = 16 * 1024 * 1024;
