//! Vigil Daemon - fall-alert ingestion core
//!
//! This crate provides everything between the wire and the scene:
//! - `transport` - reconnecting MQTT broker and serial-line adapters
//! - `supervisor` - fixed-delay retry policy and connection-state reporting
//! - `queue` - bounded hand-off from reception loops to the tick loop
//! - `alert` - the timed fall/stand alert state machine
//! - `panel` - the warning-panel show/hide animation driver
//! - `driver` - the fixed-tick consumer loop tying the above together
//! - `actuator` - the outward seam to rendering/physics code
//! - `config` - TOML configuration surface
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐   ┌──────────────────┐
//! │  BrokerAdapter   │   │  SerialAdapter   │   (one reception loop each,
//! │  (rumqttc task)  │   │ (tokio-serial)   │    fixed-delay reconnect)
//! └────────┬─────────┘   └────────┬─────────┘
//!          │    RawMessage        │
//!          ▼                      ▼
//!        ┌──────────────────────────┐
//!        │   EventQueue (bounded,   │   never blocks producers;
//!        │   drop-newest overflow)  │   drained once per tick
//!        └────────────┬─────────────┘
//!                     ▼
//!        ┌──────────────────────────┐
//!        │   Driver (tick loop)     │──▶ line parser ──▶ AlertMachine
//!        │                          │                        │ intents
//!        │   PanelAnimator ◀────────┼────────────────────────┤
//!        │   SceneActuator ◀────────┼────────────────────────┘
//!        └──────────────────────────┘
//! ```
//!
//! All alert and animation state is owned by the driver task; the only
//! shared-memory boundaries are the event queue and the connection-state
//! watch channels.
//!
//! # Panic-Free Guarantees
//!
//! All production code in this crate follows the panic-free policy:
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - All fallible operations return `Result` or `Option`
//! - Channel operations handle closure gracefully

pub mod actuator;
pub mod alert;
pub mod config;
pub mod driver;
pub mod panel;
pub mod queue;
pub mod supervisor;
pub mod transport;
