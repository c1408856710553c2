//! Connection supervision: retry policy and state reporting.
//!
//! Both transport adapters share this policy object. The policy is
//! deliberately fixed-delay with no retry cap: the deployed sensors sit on
//! flaky home networks and the daemon must keep trying for as long as it
//! runs. Delays differ by failure kind (an established session dropping vs
//! never getting one), matching the deployed behavior.
//!
//! State is published through a `watch` channel: the adapter's own loop is
//! the only writer, observers take non-blocking snapshots.

use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use vigil_core::{ConnectionState, TransportKind};

/// What kind of failure is being retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The transport was never reached (connect, subscribe, or open failed).
    InitFailure,

    /// An established connection dropped.
    ConnectionLost,
}

/// Fixed-delay retry policy.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Delay after an established connection drops.
    pub reconnect_delay: Duration,

    /// Delay after a failure to establish a connection in the first place.
    pub init_retry_delay: Duration,
}

impl RetryPolicy {
    pub fn delay_for(&self, kind: FailureKind) -> Duration {
        match kind {
            FailureKind::InitFailure => self.init_retry_delay,
            FailureKind::ConnectionLost => self.reconnect_delay,
        }
    }
}

/// Per-adapter connection supervisor.
///
/// Owns the attempt counter and the state publisher. Not shared: each
/// reception loop holds its own supervisor and drives it from that loop
/// only, so `ConnectionState` has exactly one writer.
pub struct ConnectionSupervisor {
    transport: TransportKind,
    policy: RetryPolicy,
    attempt: u32,
    state_tx: watch::Sender<ConnectionState>,
}

impl ConnectionSupervisor {
    /// Creates a supervisor reporting `Disconnected`, plus the observer
    /// handle for status displays.
    pub fn new(
        transport: TransportKind,
        policy: RetryPolicy,
    ) -> (Self, watch::Receiver<ConnectionState>) {
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);
        (
            Self {
                transport,
                policy,
                attempt: 0,
                state_tx,
            },
            state_rx,
        )
    }

    /// Marks a connection attempt in flight.
    pub fn connecting(&mut self) {
        debug!(transport = %self.transport, "Connecting");
        self.publish(ConnectionState::Connecting);
    }

    /// Marks the connection established; resets the attempt counter.
    pub fn connected(&mut self) {
        if self.attempt > 0 {
            info!(
                transport = %self.transport,
                after_attempts = self.attempt,
                "Connection established"
            );
        } else {
            info!(transport = %self.transport, "Connection established");
        }
        self.attempt = 0;
        self.publish(ConnectionState::Connected);
    }

    /// Records a failure and returns how long to wait before retrying.
    ///
    /// The attempt counter grows without a cap; delays stay fixed.
    pub fn retry_after(&mut self, kind: FailureKind) -> Duration {
        self.attempt = self.attempt.saturating_add(1);
        let delay = self.policy.delay_for(kind);

        warn!(
            transport = %self.transport,
            attempt = self.attempt,
            retry_in_secs = delay.as_secs_f32(),
            "Connection failed, will retry"
        );

        self.publish(ConnectionState::Reconnecting {
            attempt: self.attempt,
            retry_in: delay,
        });
        delay
    }

    /// Marks a clean shutdown.
    pub fn disconnected(&mut self) {
        info!(transport = %self.transport, "Disconnected");
        self.publish(ConnectionState::Disconnected);
    }

    /// Current snapshot (mainly for the owning loop's own logging).
    pub fn state(&self) -> ConnectionState {
        self.state_tx.borrow().clone()
    }

    fn publish(&self, state: ConnectionState) {
        // Observers may all be gone; the loop keeps its own state anyway.
        let _ = self.state_tx.send(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> RetryPolicy {
        RetryPolicy {
            reconnect_delay: Duration::from_secs(5),
            init_retry_delay: Duration::from_secs(3),
        }
    }

    #[test]
    fn test_delay_per_failure_kind() {
        let p = policy();
        assert_eq!(p.delay_for(FailureKind::InitFailure), Duration::from_secs(3));
        assert_eq!(
            p.delay_for(FailureKind::ConnectionLost),
            Duration::from_secs(5)
        );
    }

    #[test]
    fn test_initial_state_disconnected() {
        let (sup, rx) = ConnectionSupervisor::new(TransportKind::Broker, policy());
        assert_eq!(*rx.borrow(), ConnectionState::Disconnected);
        assert_eq!(sup.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_retry_publishes_reconnecting_with_attempt() {
        let (mut sup, rx) = ConnectionSupervisor::new(TransportKind::Broker, policy());

        sup.connecting();
        assert_eq!(*rx.borrow(), ConnectionState::Connecting);

        let delay = sup.retry_after(FailureKind::InitFailure);
        assert_eq!(delay, Duration::from_secs(3));
        assert_eq!(
            *rx.borrow(),
            ConnectionState::Reconnecting {
                attempt: 1,
                retry_in: Duration::from_secs(3),
            }
        );

        let delay = sup.retry_after(FailureKind::InitFailure);
        assert_eq!(delay, Duration::from_secs(3));
        assert_eq!(
            *rx.borrow(),
            ConnectionState::Reconnecting {
                attempt: 2,
                retry_in: Duration::from_secs(3),
            }
        );
    }

    #[test]
    fn test_delay_stays_fixed_under_continued_failure() {
        let (mut sup, _rx) = ConnectionSupervisor::new(TransportKind::Serial, policy());

        // No cap and no growth: attempt 1 and attempt 1000 wait the same.
        for _ in 0..1000 {
            assert_eq!(
                sup.retry_after(FailureKind::ConnectionLost),
                Duration::from_secs(5)
            );
        }
        assert_eq!(
            sup.state(),
            ConnectionState::Reconnecting {
                attempt: 1000,
                retry_in: Duration::from_secs(5),
            }
        );
    }

    #[test]
    fn test_connected_resets_attempt_counter() {
        let (mut sup, rx) = ConnectionSupervisor::new(TransportKind::Broker, policy());

        sup.retry_after(FailureKind::InitFailure);
        sup.retry_after(FailureKind::InitFailure);
        sup.connected();
        assert_eq!(*rx.borrow(), ConnectionState::Connected);

        // Next failure starts counting from one again.
        sup.retry_after(FailureKind::ConnectionLost);
        assert_eq!(
            *rx.borrow(),
            ConnectionState::Reconnecting {
                attempt: 1,
                retry_in: Duration::from_secs(5),
            }
        );
    }

    #[test]
    fn test_publish_without_observers_does_not_panic() {
        let (mut sup, rx) = ConnectionSupervisor::new(TransportKind::Serial, policy());
        drop(rx);
        sup.connecting();
        sup.connected();
        sup.disconnected();
    }
}
