//! Isolated script host.
//!
//! Runs an assembled preview document in a fresh engine context on its own
//! thread. The context's only way to talk to the rest of the process is
//! `window.parent.postMessage`, which forwards JSON to the signal relay as a
//! generation-tagged [`HostEvent`](livepane_bridge::HostEvent).
//!
//! [`execute`] is the separate, synchronous path for running one buffer and
//! reading back its console output.

mod error;
mod execute;
mod host;
mod limits;
mod realm;
mod run;
mod scan;

pub use error::{HostError, Result};
pub use execute::{ExecutionResult, execute, execute_with_timeout};
pub use host::IsolationHost;
pub use limits::HostLimits;
pub use scan::Position;

#[cfg(test)]
mod tests;
