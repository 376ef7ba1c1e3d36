//! Preview document model.
//!
//! Owns the read-only view of editor buffers and turns a buffer set into one
//! self-contained preview document carrying the instrumentation shim.

mod assemble;
mod buffer;
pub mod file;
pub mod shim;
pub mod tidy;

pub use assemble::{AssembledDocument, Section, assemble};
pub use buffer::{BufferId, LanguageTag, SourceBuffer, UnknownLanguage};
