//! Raw inbound messages handed from a transport to the consumer loop.

use std::fmt;

use chrono::{DateTime, Utc};

/// Which wire transport produced a message.
///
/// The consumer uses this to select the matching strictness configured for
/// that transport; it is also carried into log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// MQTT broker subscription.
    Broker,

    /// Line-oriented serial port.
    Serial,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Broker => write!(f, "broker"),
            Self::Serial => write!(f, "serial"),
        }
    }
}

/// One complete inbound line or publish payload.
///
/// Created by a transport adapter's reception loop, queued, and consumed
/// exactly once by the tick-loop driver. Immutable after construction.
#[derive(Debug, Clone)]
pub struct RawMessage {
    /// Subscribe topic (broker) or port name (serial) the payload came from.
    pub source: String,

    /// Payload text, UTF-8 with lossy conversion, newline stripped.
    pub payload: String,

    /// When the reception loop saw the complete message.
    pub received_at: DateTime<Utc>,

    /// Which adapter produced it.
    pub origin: TransportKind,
}

impl RawMessage {
    /// Creates a message stamped with the current time.
    pub fn new(source: impl Into<String>, payload: impl Into<String>, origin: TransportKind) -> Self {
        Self {
            source: source.into(),
            payload: payload.into(),
            received_at: Utc::now(),
            origin,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_stamps_receive_time() {
        let before = Utc::now();
        let msg = RawMessage::new("ld6002/fall_status", "FALL", TransportKind::Broker);
        let after = Utc::now();

        assert!(msg.received_at >= before);
        assert!(msg.received_at <= after);
        assert_eq!(msg.source, "ld6002/fall_status");
        assert_eq!(msg.payload, "FALL");
        assert_eq!(msg.origin, TransportKind::Broker);
    }

    #[test]
    fn test_transport_kind_display() {
        assert_eq!(TransportKind::Broker.to_string(), "broker");
        assert_eq!(TransportKind::Serial.to_string(), "serial");
    }
}
