//! Vigil Protocol - parsing of inbound sensor payloads.
//!
//! Two independent parsers:
//! - `parser` - the command vocabulary (fall/stand). Total: every input
//!   maps to a `Command`, unmatched input to `Command::Unknown`.
//! - `telemetry` - a stricter full-pattern match for fixed-format
//!   temperature/humidity report lines, extracting typed numeric fields.
//!
//! Both are pure functions with no state and no I/O.

pub mod parser;
pub mod telemetry;

// Re-exports for convenience
pub use parser::{parse, MatchMode};
pub use telemetry::parse_telemetry;
