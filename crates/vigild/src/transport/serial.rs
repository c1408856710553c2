//! Serial-line adapter.
//!
//! Opens the configured port (8-N-1), reads newline-delimited lines, and
//! forwards each non-empty line into the event queue. Reads run under a
//! short timeout so the cancellation token is observed promptly; the
//! partially read buffer survives timeouts, so slow senders do not lose
//! half a line. Open failures and read errors re-enter the open path
//! after the configured fixed delay, forever.

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::{sleep, timeout};
use tokio_serial::{DataBits, Parity, SerialStream, StopBits};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use vigil_core::{RawMessage, TransportKind};

use crate::config::SerialConfig;
use crate::queue::QueuePusher;
use crate::supervisor::{ConnectionSupervisor, FailureKind, RetryPolicy};

use super::TransportHandle;

/// Read timeout; doubles as the cancellation poll interval.
const READ_TIMEOUT: Duration = Duration::from_millis(100);

/// Spawns the serial reception loop and returns its handle.
pub fn spawn_serial_adapter(cfg: SerialConfig, queue: QueuePusher) -> TransportHandle {
    let cancel = CancellationToken::new();
    let policy = RetryPolicy {
        reconnect_delay: cfg.retry_delay(),
        init_retry_delay: cfg.retry_delay(),
    };
    let (supervisor, state_rx) = ConnectionSupervisor::new(TransportKind::Serial, policy);

    let task = tokio::spawn(run_reception_loop(cfg, supervisor, queue, cancel.clone()));

    TransportHandle::new(TransportKind::Serial, cancel, state_rx, None, task)
}

async fn run_reception_loop(
    cfg: SerialConfig,
    mut supervisor: ConnectionSupervisor,
    queue: QueuePusher,
    cancel: CancellationToken,
) {
    info!(port = %cfg.port, baud = cfg.baud_rate, "Serial adapter started");

    'reconnect: loop {
        if cancel.is_cancelled() {
            break;
        }
        supervisor.connecting();

        let stream = match open_port(&cfg) {
            Ok(stream) => stream,
            Err(e) => {
                warn!(port = %cfg.port, error = %e, "Failed to open serial port");
                let delay = supervisor.retry_after(FailureKind::InitFailure);
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break 'reconnect,
                    _ = sleep(delay) => continue 'reconnect,
                }
            }
        };

        supervisor.connected();
        let mut reader = BufReader::new(stream);
        let mut line = String::new();

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => break 'reconnect,

                result = timeout(READ_TIMEOUT, reader.read_line(&mut line)) => match result {
                    // Timeout: normal on an idle line. The partial buffer
                    // is kept; the next read appends to it.
                    Err(_) => {}

                    // EOF: the device went away (unplugged USB adapter).
                    Ok(Ok(0)) => {
                        warn!(port = %cfg.port, "Serial port closed by peer");
                        let delay = supervisor.retry_after(FailureKind::ConnectionLost);
                        tokio::select! {
                            biased;
                            _ = cancel.cancelled() => break 'reconnect,
                            _ = sleep(delay) => continue 'reconnect,
                        }
                    }

                    Ok(Ok(_)) => {
                        let trimmed = line.trim();
                        if trimmed.is_empty() {
                            debug!(port = %cfg.port, "Ignoring blank line");
                        } else {
                            debug!(port = %cfg.port, payload = %trimmed, "Line received");
                            queue.push(RawMessage::new(
                                cfg.port.clone(),
                                trimmed.to_string(),
                                TransportKind::Serial,
                            ));
                        }
                        line.clear();
                    }

                    Ok(Err(e)) => {
                        warn!(port = %cfg.port, error = %e, "Serial read error");
                        let delay = supervisor.retry_after(FailureKind::ConnectionLost);
                        tokio::select! {
                            biased;
                            _ = cancel.cancelled() => break 'reconnect,
                            _ = sleep(delay) => continue 'reconnect,
                        }
                    }
                }
            }
        }
    }

    // Dropping the stream closes the port handle.
    supervisor.disconnected();
    info!(port = %cfg.port, "Serial adapter stopped");
}

fn open_port(cfg: &SerialConfig) -> tokio_serial::Result<SerialStream> {
    let builder = tokio_serial::new(cfg.port.clone(), cfg.baud_rate)
        .data_bits(DataBits::Eight)
        .parity(Parity::None)
        .stop_bits(StopBits::One);

    SerialStream::open(&builder)
}
