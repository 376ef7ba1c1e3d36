//! Error types for the isolation host.

use livepane_bridge::Generation;
use thiserror::Error;

/// Failures the host reports to its caller.
///
/// Script errors never appear here; they stay inside the isolated context
/// and surface as signals or as [`ExecutionResult::error`](crate::ExecutionResult::error).
#[derive(Debug, Error)]
pub enum HostError {
	/// The OS refused to start an engine thread.
	#[error("failed to spawn engine thread for {generation}: {error}")]
	Spawn {
		/// Generation the thread was meant to run.
		generation: Generation,
		/// The underlying I/O error.
		error: std::io::Error,
	},

	/// The host was shut down and no longer accepts documents.
	#[error("isolation host is shut down")]
	ShutDown,
}

/// Result type for host operations.
pub type Result<T> = std::result::Result<T, HostError>;
