//! The command vocabulary recognized on the wire.

use std::fmt;

/// A parsed sensor command.
///
/// Produced by the line parser; consumed by the alert state machine.
/// Anything the parser does not recognize degrades to `Unknown` with the
/// original payload preserved for logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// The monitored person has fallen.
    Fall,

    /// The monitored person is standing (recovery).
    Stand,

    /// Unrecognized payload, carried verbatim.
    Unknown(String),
}

impl Command {
    /// Returns true for commands the alert state machine reacts to.
    pub fn is_recognized(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fall => write!(f, "fall"),
            Self::Stand => write!(f, "stand"),
            Self::Unknown(raw) => write!(f, "unknown ({raw})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_recognized() {
        assert!(Command::Fall.is_recognized());
        assert!(Command::Stand.is_recognized());
        assert!(!Command::Unknown("garbage".to_string()).is_recognized());
    }

    #[test]
    fn test_display() {
        assert_eq!(Command::Fall.to_string(), "fall");
        assert_eq!(Command::Stand.to_string(), "stand");
        assert_eq!(
            Command::Unknown("beep".to_string()).to_string(),
            "unknown (beep)"
        );
    }
}
