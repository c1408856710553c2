//! Transport adapters: one reconnecting reception loop per wire.
//!
//! Two interchangeable implementations share one contract:
//! - `broker` - MQTT subscription over TCP (rumqttc)
//! - `serial` - newline-delimited serial port (tokio-serial)
//!
//! An adapter is spawned with a `QueuePusher` and runs until its
//! cancellation token fires. It owns its connection, its reconnect
//! schedule (via `ConnectionSupervisor`), and its `ConnectionState`;
//! everything observable from outside goes through the returned
//! `TransportHandle`.

pub mod broker;
pub mod serial;

use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use vigil_core::{ConnectionState, TransportKind};

pub use broker::{spawn_broker_adapter, BrokerPublisher};
pub use serial::spawn_serial_adapter;

/// How long `shutdown` waits for a reception loop to exit before
/// abandoning it.
pub const SHUTDOWN_JOIN_TIMEOUT: Duration = Duration::from_secs(1);

/// Transport-level errors.
///
/// Connection failures never surface here - they are retried forever
/// inside the reception loop. What remains is the publish path and the
/// shutdown join window.
#[derive(Debug, Error)]
pub enum TransportError {
    /// An outbound publish could not be handed to the broker client.
    #[error("publish to {topic} failed: {reason}")]
    PublishFailed { topic: String, reason: String },

    /// The reception loop did not exit within the join window. The task
    /// is abandoned; the process continues.
    #[error("{transport} reception loop did not stop within {timeout:?}")]
    ShutdownTimeout {
        transport: TransportKind,
        timeout: Duration,
    },
}

/// Handle to a running transport adapter.
///
/// Dropping the handle does NOT stop the adapter; call `shutdown`.
pub struct TransportHandle {
    kind: TransportKind,
    cancel: CancellationToken,
    state_rx: watch::Receiver<ConnectionState>,
    publisher: Option<BrokerPublisher>,
    task: JoinHandle<()>,
}

impl TransportHandle {
    pub(crate) fn new(
        kind: TransportKind,
        cancel: CancellationToken,
        state_rx: watch::Receiver<ConnectionState>,
        publisher: Option<BrokerPublisher>,
        task: JoinHandle<()>,
    ) -> Self {
        Self {
            kind,
            cancel,
            state_rx,
            publisher,
            task,
        }
    }

    /// Which transport this handle controls.
    pub fn kind(&self) -> TransportKind {
        self.kind
    }

    /// Non-blocking connection-state snapshot.
    pub fn state(&self) -> ConnectionState {
        self.state_rx.borrow().clone()
    }

    /// Observer handle for status displays; `changed()` wakes on every
    /// state transition.
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    /// The publish capability, present on the broker adapter only.
    pub fn publisher(&self) -> Option<BrokerPublisher> {
        self.publisher.clone()
    }

    /// Stops the reception loop and joins it with a bounded wait.
    ///
    /// On timeout the task is abandoned (the tokio task leaks until the
    /// runtime shuts down) and `ShutdownTimeout` is returned so the
    /// caller can log it; this is never fatal.
    pub async fn shutdown(self) -> Result<(), TransportError> {
        debug!(transport = %self.kind, "Shutting down transport adapter");
        self.cancel.cancel();

        match timeout(SHUTDOWN_JOIN_TIMEOUT, self.task).await {
            Ok(_) => {
                debug!(transport = %self.kind, "Transport adapter stopped");
                Ok(())
            }
            Err(_) => {
                warn!(
                    transport = %self.kind,
                    timeout_secs = SHUTDOWN_JOIN_TIMEOUT.as_secs_f32(),
                    "Transport adapter did not stop in time, abandoning"
                );
                Err(TransportError::ShutdownTimeout {
                    transport: self.kind,
                    timeout: SHUTDOWN_JOIN_TIMEOUT,
                })
            }
        }
    }
}
