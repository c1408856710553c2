//! Side-effect requests emitted by the alert state machine.

use std::fmt;

/// A side effect requested by the alert state machine.
///
/// The machine never touches rendering or physics itself; it emits intents
/// and the tick-loop driver routes them to the panel animator and to the
/// scene actuator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Show the warning panel with the given message.
    ShowAlert(String),

    /// Hide the warning panel.
    HideAlert,

    /// Put the monitored subject into the fall pose.
    EnterFallPose,

    /// Restore the monitored subject to the stand pose.
    EnterStandPose,
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ShowAlert(text) => write!(f, "show alert: {text}"),
            Self::HideAlert => write!(f, "hide alert"),
            Self::EnterFallPose => write!(f, "enter fall pose"),
            Self::EnterStandPose => write!(f, "enter stand pose"),
        }
    }
}
