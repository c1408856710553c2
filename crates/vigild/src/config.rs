//! Daemon configuration.
//!
//! Loaded from a TOML file; every field has a default matching the
//! reference deployment, so an empty file (or no file at all) yields a
//! working configuration. The config path comes from, in order: the CLI
//! flag, the `VIGIL_CONFIG` environment variable, or
//! `/etc/vigil/vigil.toml`.

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use vigil_protocol::MatchMode;

/// Environment variable overriding the config file path.
pub const CONFIG_ENV_VAR: &str = "VIGIL_CONFIG";

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("failed to read config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML or has unknown/mistyped fields.
    #[error("failed to parse config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// A field value is out of range.
    #[error("invalid config: {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: String,
    },
}

// ============================================================================
// Sections
// ============================================================================

/// MQTT quality-of-service level, configurable per deployment.
///
/// Alert topics run at-least-once; plain telemetry feeds usually run
/// at-most-once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QosLevel {
    AtMostOnce,
    AtLeastOnce,
    ExactlyOnce,
}

/// MQTT broker transport settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BrokerConfig {
    /// Whether the broker adapter is spawned at all.
    pub enabled: bool,

    /// Broker host name or IP.
    pub address: String,

    /// Broker TCP port.
    pub port: u16,

    /// Client identifier; the process id is appended so restarts and
    /// side-by-side instances never collide on the broker.
    pub client_id: String,

    /// Topic carrying fall/stand events.
    pub subscribe_topic: String,

    /// Optional topic for outbound publishes; empty disables publishing.
    pub publish_topic: String,

    /// Subscribe QoS.
    pub qos: QosLevel,

    /// Matching strictness for payloads arriving on this transport.
    pub match_mode: MatchMode,

    /// Delay before retrying after an established session drops.
    pub reconnect_delay_secs: f32,

    /// Delay before retrying after a connect/subscribe failure.
    pub init_retry_delay_secs: f32,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            address: "broker.emqx.io".to_string(),
            port: 1883,
            client_id: "vigil-alert".to_string(),
            subscribe_topic: "ld6002/fall_status".to_string(),
            publish_topic: String::new(),
            qos: QosLevel::AtLeastOnce,
            match_mode: MatchMode::Substring,
            reconnect_delay_secs: 5.0,
            init_retry_delay_secs: 3.0,
        }
    }
}

impl BrokerConfig {
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs_f32(self.reconnect_delay_secs)
    }

    pub fn init_retry_delay(&self) -> Duration {
        Duration::from_secs_f32(self.init_retry_delay_secs)
    }

    /// Publish topic, if configured.
    pub fn publish_topic(&self) -> Option<&str> {
        if self.publish_topic.is_empty() {
            None
        } else {
            Some(&self.publish_topic)
        }
    }
}

/// Serial transport settings (8-N-1 framing, newline-delimited).
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SerialConfig {
    /// Whether the serial adapter is spawned at all.
    pub enabled: bool,

    /// Port name, e.g. `/dev/ttyUSB0` or `COM6`.
    pub port: String,

    /// Baud rate.
    pub baud_rate: u32,

    /// Matching strictness for lines arriving on this transport.
    pub match_mode: MatchMode,

    /// Delay before retrying after an open failure or read error.
    pub retry_delay_secs: f32,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: "/dev/ttyUSB0".to_string(),
            baud_rate: 9600,
            match_mode: MatchMode::ExactToken,
            retry_delay_secs: 3.0,
        }
    }
}

impl SerialConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs_f32(self.retry_delay_secs)
    }
}

/// Alert timing and presentation settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AlertConfig {
    /// Text shown on the warning panel.
    pub message: String,

    /// How long the alert is displayed before auto-recovery.
    pub display_duration_secs: f32,

    /// How long the pose transition back to standing takes.
    pub fall_duration_secs: f32,

    /// Multiplier applied to the panel grow/shrink curves.
    pub animation_speed: f32,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            message: "警告，有人跌倒！".to_string(),
            display_duration_secs: 5.0,
            fall_duration_secs: 0.2,
            animation_speed: 2.0,
        }
    }
}

impl AlertConfig {
    pub fn display_duration(&self) -> Duration {
        Duration::from_secs_f32(self.display_duration_secs)
    }

    pub fn fall_duration(&self) -> Duration {
        Duration::from_secs_f32(self.fall_duration_secs)
    }
}

/// Consumer-loop settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TickConfig {
    /// Consumer ticks per second.
    pub rate_hz: u32,

    /// Event queue capacity (messages retained across one tick).
    pub queue_capacity: usize,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            rate_hz: 60,
            queue_capacity: 256,
        }
    }
}

impl TickConfig {
    /// Duration of one tick.
    pub fn period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.rate_hz.max(1)))
    }
}

// ============================================================================
// Root
// ============================================================================

/// Complete daemon configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DaemonConfig {
    pub broker: BrokerConfig,
    pub serial: SerialConfig,
    pub alert: AlertConfig,
    pub tick: TickConfig,
}

impl DaemonConfig {
    /// Loads configuration from the given path, the `VIGIL_CONFIG`
    /// environment variable, or the default location, in that order.
    ///
    /// A missing file is not an error: defaults apply.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match env::var(CONFIG_ENV_VAR) {
                Ok(p) => PathBuf::from(p),
                Err(_) => {
                    let default = Self::default_path();
                    if !default.exists() {
                        let config = Self::default();
                        config.validate()?;
                        return Ok(config);
                    }
                    default
                }
            },
        };

        let config = Self::load_file(&path)?;
        config.validate()?;
        Ok(config)
    }

    /// Default config file location.
    pub fn default_path() -> PathBuf {
        PathBuf::from("/etc/vigil/vigil.toml")
    }

    fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Checks field ranges and cross-field requirements.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.broker.enabled && !self.serial.enabled {
            return Err(ConfigError::Invalid {
                field: "broker.enabled / serial.enabled",
                reason: "at least one transport must be enabled".to_string(),
            });
        }
        if self.broker.enabled && self.broker.address.is_empty() {
            return Err(ConfigError::Invalid {
                field: "broker.address",
                reason: "must not be empty".to_string(),
            });
        }
        if self.broker.enabled && self.broker.subscribe_topic.is_empty() {
            return Err(ConfigError::Invalid {
                field: "broker.subscribe_topic",
                reason: "must not be empty".to_string(),
            });
        }
        if self.serial.enabled && self.serial.port.is_empty() {
            return Err(ConfigError::Invalid {
                field: "serial.port",
                reason: "must not be empty".to_string(),
            });
        }
        if self.serial.enabled && self.serial.baud_rate == 0 {
            return Err(ConfigError::Invalid {
                field: "serial.baud_rate",
                reason: "must be nonzero".to_string(),
            });
        }
        if self.alert.display_duration_secs <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "alert.display_duration_secs",
                reason: "must be positive".to_string(),
            });
        }
        if self.alert.fall_duration_secs <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "alert.fall_duration_secs",
                reason: "must be positive".to_string(),
            });
        }
        if self.alert.animation_speed <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "alert.animation_speed",
                reason: "must be positive".to_string(),
            });
        }
        if self.tick.rate_hz == 0 || self.tick.rate_hz > 240 {
            return Err(ConfigError::Invalid {
                field: "tick.rate_hz",
                reason: format!("{} is outside 1..=240", self.tick.rate_hz),
            });
        }
        if self.tick.queue_capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "tick.queue_capacity",
                reason: "must be nonzero".to_string(),
            });
        }
        Ok(())
    }
}
