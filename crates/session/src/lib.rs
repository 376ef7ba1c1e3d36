//! Live preview session.
//!
//! Ties the isolation host to its signal relay and drives both from buffer
//! changes. Configuration and diagnostics sit on top.

pub mod config;
mod diagnostics;
mod session;

pub use config::{Config, ConfigError};
pub use diagnostics::{Diagnostic, diagnostics};
pub use session::{PreviewSession, RebuildOutcome};
