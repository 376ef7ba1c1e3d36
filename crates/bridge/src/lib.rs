//! Isolation boundary plumbing shared by the preview host and the editor.
//!
//! * [`message`]: the JSON contract posted by the instrumentation shim and
//!   the [`HostEvent`] envelope that tags each post with its generation.
//! * [`generation`]: the monotonic clock that tags reloads.
//! * [`signal`]: relayed signals and the retention-bounded logs holding them.
//! * [`relay`]: the single writer of both logs.

pub mod generation;
#[cfg(test)]
mod invariants;
pub mod message;
pub mod relay;
pub mod signal;

pub use generation::{Generation, GenerationClock};
pub use message::{ChannelMessage, ConsoleLevel, HostEvent, RunOutcome};
pub use relay::{Disposition, EventReceiver, EventSender, RelayConfig, RelayStats, RelayStatus, SignalRelay, event_channel};
pub use signal::{LogEntry, RelayedSignal, Retention, SignalLog};
