//! State types owned by the transport adapters, the alert state machine,
//! and the panel animator.
//!
//! Each type here has exactly one writer:
//! - `ConnectionState` is written only by its adapter's reception loop and
//!   published through a watch channel; observers get snapshots.
//! - `AlertState` transitions only on the consumer tick.
//! - `AnimationState` is updated once per tick by the panel animator.

use std::fmt;
use std::time::Duration;

// ============================================================================
// Connection State
// ============================================================================

/// Snapshot of a transport adapter's connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    /// No connection and none in progress (startup or after shutdown).
    Disconnected,

    /// A connection attempt is in flight.
    Connecting,

    /// Connected and receiving.
    Connected,

    /// Connection lost or never established; a retry is scheduled.
    Reconnecting {
        /// Consecutive failed attempts so far (1-based).
        attempt: u32,
        /// Delay until the next attempt.
        retry_in: Duration,
    },
}

impl ConnectionState {
    /// Returns true while the adapter can deliver messages.
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "disconnected"),
            Self::Connecting => write!(f, "connecting"),
            Self::Connected => write!(f, "connected"),
            Self::Reconnecting { attempt, retry_in } => {
                write!(f, "reconnecting (attempt {attempt}, retry in {:.1}s)", retry_in.as_secs_f32())
            }
        }
    }
}

// ============================================================================
// Alert State
// ============================================================================

/// State of the fall-alert episode machine.
///
/// Transitions are monotonic within an episode:
/// `Idle -> Alerting -> Recovering -> Idle`. A fall event during an
/// episode restarts the timer; it never opens a second episode.
///
/// `held_for` accumulates explicit tick deltas rather than recording a
/// wall-clock entry instant, so the machine is exact under a fixed tick
/// and needs no clock in tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertState {
    /// No active alert.
    Idle,

    /// A fall was detected; the alert is being displayed.
    Alerting {
        /// Time spent alerting so far.
        held_for: Duration,
    },

    /// The subject is transitioning back to the stand pose.
    Recovering {
        /// Time spent recovering so far.
        held_for: Duration,
    },
}

impl AlertState {
    /// Returns true while an episode is in progress.
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Idle)
    }
}

impl fmt::Display for AlertState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Alerting { held_for } => {
                write!(f, "alerting ({:.2}s)", held_for.as_secs_f32())
            }
            Self::Recovering { held_for } => {
                write!(f, "recovering ({:.2}s)", held_for.as_secs_f32())
            }
        }
    }
}

// ============================================================================
// Animation State
// ============================================================================

/// Phase of the warning-panel animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationPhase {
    /// Panel is not shown.
    Hidden,

    /// Grow animation in progress.
    Showing,

    /// Fully visible, hold timer running.
    Visible,

    /// Shrink animation in progress.
    Hiding,
}

impl fmt::Display for AnimationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hidden => write!(f, "hidden"),
            Self::Showing => write!(f, "showing"),
            Self::Visible => write!(f, "visible"),
            Self::Hiding => write!(f, "hiding"),
        }
    }
}

/// Snapshot of the panel animator, for status displays.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationState {
    /// Current phase.
    pub phase: AnimationPhase,

    /// Curve progress in [0, 1] for Showing/Hiding; 1.0 when Visible,
    /// 0.0 when Hidden.
    pub elapsed: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_state_is_connected() {
        assert!(ConnectionState::Connected.is_connected());
        assert!(!ConnectionState::Disconnected.is_connected());
        assert!(!ConnectionState::Connecting.is_connected());
        assert!(!ConnectionState::Reconnecting {
            attempt: 3,
            retry_in: Duration::from_secs(5)
        }
        .is_connected());
    }

    #[test]
    fn test_connection_state_display() {
        assert_eq!(ConnectionState::Connected.to_string(), "connected");
        let state = ConnectionState::Reconnecting {
            attempt: 2,
            retry_in: Duration::from_secs(5),
        };
        assert_eq!(state.to_string(), "reconnecting (attempt 2, retry in 5.0s)");
    }

    #[test]
    fn test_alert_state_is_active() {
        assert!(!AlertState::Idle.is_active());
        assert!(AlertState::Alerting {
            held_for: Duration::ZERO
        }
        .is_active());
        assert!(AlertState::Recovering {
            held_for: Duration::ZERO
        }
        .is_active());
    }

    #[test]
    fn test_alert_state_display() {
        assert_eq!(AlertState::Idle.to_string(), "idle");
        let state = AlertState::Alerting {
            held_for: Duration::from_millis(1500),
        };
        assert_eq!(state.to_string(), "alerting (1.50s)");
    }

    #[test]
    fn test_animation_phase_display() {
        assert_eq!(AnimationPhase::Hidden.to_string(), "hidden");
        assert_eq!(AnimationPhase::Showing.to_string(), "showing");
        assert_eq!(AnimationPhase::Visible.to_string(), "visible");
        assert_eq!(AnimationPhase::Hiding.to_string(), "hiding");
    }
}
