//! Vigil Core - Shared types for fall-alert ingestion
//!
//! This crate provides the domain types shared between the protocol
//! parser (vigil-protocol) and the daemon (vigild). It contains no I/O
//! and no async code; everything here is a plain value type.
//!
//! All code follows the panic-free policy: no `.unwrap()`, `.expect()`,
//! `panic!()`, `unreachable!()`, `todo!()`, or direct indexing `[i]`.

pub mod command;
pub mod intent;
pub mod message;
pub mod state;
pub mod telemetry;

// Re-exports for convenience
pub use command::Command;
pub use intent::Intent;
pub use message::{RawMessage, TransportKind};
pub use state::{AlertState, AnimationPhase, AnimationState, ConnectionState};
pub use telemetry::TelemetryReading;
