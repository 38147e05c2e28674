//! Configuration for [`NetworkSession`] behavior.
//!
//! [`SessionConfig`] controls connect retry behavior, liveness probing, and
//! event queue sizing. The defaults match the reference deployment: 5 connect
//! attempts 1000 ms apart inside a 10 s window, a ping every 5 s with a 2 s
//! pong timeout, and a 100-event queue.
//!
//! [`NetworkSession`]: crate::NetworkSession

use web_time::Duration;

use crate::error::DriftlineError;

/// Default number of connect requests sent before giving up.
pub(crate) const DEFAULT_RECONNECTION_ATTEMPTS: u32 = 5;
/// Default delay between connect request retries.
pub(crate) const DEFAULT_RECONNECTION_DELAY: Duration = Duration::from_millis(1000);
/// Default overall connect timeout.
pub(crate) const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(10000);
/// Default interval between liveness pings.
pub(crate) const DEFAULT_PING_INTERVAL: Duration = Duration::from_millis(5000);
/// Default time to wait for a pong before reporting an interruption.
pub(crate) const DEFAULT_PING_TIMEOUT: Duration = Duration::from_millis(2000);
/// Default event queue size. Events older than this threshold are dropped if
/// not polled.
pub(crate) const DEFAULT_EVENT_QUEUE_SIZE: usize = 100;

/// Configuration for the session's connection and liveness behavior.
///
/// # Forward Compatibility
///
/// New fields may be added to this struct in future versions. To ensure your
/// code continues to compile, always use the `..SessionConfig::default()`
/// pattern when constructing instances.
///
/// # Example
///
/// ```
/// use driftline::SessionConfig;
/// use web_time::Duration;
///
/// // For flaky connections, retry longer before giving up
/// let config = SessionConfig {
///     reconnection_attempts: 10,
///     connect_timeout: Duration::from_secs(20),
///     ..SessionConfig::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "SessionConfig has no effect unless passed to SessionBuilder::with_config()"]
pub struct SessionConfig {
    /// Number of connect requests sent before the handshake is abandoned and
    /// a `ConnectFailed` event is emitted.
    ///
    /// Default: 5
    pub reconnection_attempts: u32,

    /// Delay between connect request retries during the handshake.
    ///
    /// Default: 1000ms
    pub reconnection_delay: Duration,

    /// Overall handshake deadline. If the server has not acknowledged within
    /// this window, the handshake fails regardless of remaining attempts.
    ///
    /// Default: 10000ms
    pub connect_timeout: Duration,

    /// Interval between liveness pings while connected.
    ///
    /// Default: 5000ms
    pub ping_interval: Duration,

    /// Time to wait for a pong before emitting a `NetworkInterrupted` event.
    ///
    /// Default: 2000ms
    pub ping_timeout: Duration,

    /// Maximum number of events to queue before oldest are dropped.
    ///
    /// Default: 100
    pub event_queue_size: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            reconnection_attempts: DEFAULT_RECONNECTION_ATTEMPTS,
            reconnection_delay: DEFAULT_RECONNECTION_DELAY,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            ping_interval: DEFAULT_PING_INTERVAL,
            ping_timeout: DEFAULT_PING_TIMEOUT,
            event_queue_size: DEFAULT_EVENT_QUEUE_SIZE,
        }
    }
}

impl SessionConfig {
    /// Creates a new `SessionConfig` with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration preset for local network / LAN play.
    ///
    /// Uses short retries and an aggressive ping cadence for fast failure
    /// detection.
    pub fn lan() -> Self {
        Self {
            reconnection_attempts: 3,
            reconnection_delay: Duration::from_millis(250),
            connect_timeout: Duration::from_millis(3000),
            ping_interval: Duration::from_millis(1000),
            ping_timeout: Duration::from_millis(500),
            event_queue_size: DEFAULT_EVENT_QUEUE_SIZE,
        }
    }

    /// Configuration preset for mobile/cellular networks.
    ///
    /// Mobile networks have high variability and intermittent connectivity
    /// during WiFi/cellular handoffs; this preset retries longer and tolerates
    /// slower pongs.
    pub fn mobile() -> Self {
        Self {
            reconnection_attempts: 10,
            reconnection_delay: Duration::from_millis(1500),
            connect_timeout: Duration::from_millis(20000),
            ping_interval: Duration::from_millis(5000),
            ping_timeout: Duration::from_millis(4000),
            event_queue_size: 200,
        }
    }

    /// Configuration preset for competitive play.
    ///
    /// Fails fast on connect and probes liveness frequently; assumes good
    /// network conditions.
    pub fn competitive() -> Self {
        Self {
            reconnection_attempts: 3,
            reconnection_delay: Duration::from_millis(500),
            connect_timeout: Duration::from_millis(5000),
            ping_interval: Duration::from_millis(2000),
            ping_timeout: Duration::from_millis(1000),
            event_queue_size: DEFAULT_EVENT_QUEUE_SIZE,
        }
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`DriftlineError::ConfigOutOfRange`] if any value is out of
    /// range.
    pub fn validate(&self) -> Result<(), DriftlineError> {
        // reconnection_attempts: 1 to 100
        if self.reconnection_attempts < 1 || self.reconnection_attempts > 100 {
            return Err(DriftlineError::ConfigOutOfRange {
                field: "reconnection_attempts",
                min: 1,
                max: 100,
                actual: u64::from(self.reconnection_attempts),
            });
        }

        // reconnection_delay: 1ms to 60000ms
        Self::validate_duration("reconnection_delay", self.reconnection_delay, 1, 60000)?;
        // connect_timeout: 100ms to 300000ms (5 minutes)
        Self::validate_duration("connect_timeout", self.connect_timeout, 100, 300000)?;
        // ping_interval: 100ms to 60000ms
        Self::validate_duration("ping_interval", self.ping_interval, 100, 60000)?;
        // ping_timeout: 1ms to 60000ms
        Self::validate_duration("ping_timeout", self.ping_timeout, 1, 60000)?;

        // event_queue_size: 1 to 65536
        if self.event_queue_size < 1 || self.event_queue_size > 65536 {
            return Err(DriftlineError::ConfigOutOfRange {
                field: "event_queue_size",
                min: 1,
                max: 65536,
                actual: self.event_queue_size as u64,
            });
        }

        Ok(())
    }

    fn validate_duration(
        field: &'static str,
        value: Duration,
        min_ms: u64,
        max_ms: u64,
    ) -> Result<(), DriftlineError> {
        let actual = value.as_millis() as u64;
        if actual < min_ms || actual > max_ms {
            return Err(DriftlineError::ConfigOutOfRange {
                field,
                min: min_ms,
                max: max_ms,
                actual,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn config_default_values() {
        let config = SessionConfig::default();
        assert_eq!(config.reconnection_attempts, 5);
        assert_eq!(config.reconnection_delay, Duration::from_millis(1000));
        assert_eq!(config.connect_timeout, Duration::from_millis(10000));
        assert_eq!(config.ping_interval, Duration::from_millis(5000));
        assert_eq!(config.ping_timeout, Duration::from_millis(2000));
        assert_eq!(config.event_queue_size, 100);
    }

    #[test]
    fn config_new_equals_default() {
        assert_eq!(SessionConfig::new(), SessionConfig::default());
    }

    #[test]
    fn config_presets_are_valid_and_distinct() {
        let presets = [
            SessionConfig::default(),
            SessionConfig::lan(),
            SessionConfig::mobile(),
            SessionConfig::competitive(),
        ];
        for config in &presets {
            assert!(config.validate().is_ok());
        }
        for (i, a) in presets.iter().enumerate() {
            for (j, b) in presets.iter().enumerate() {
                if i != j {
                    assert_ne!(a, b, "presets at index {} and {} should differ", i, j);
                }
            }
        }
    }

    #[test]
    fn validate_rejects_zero_attempts() {
        let config = SessionConfig {
            reconnection_attempts: 0,
            ..SessionConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            DriftlineError::ConfigOutOfRange {
                field: "reconnection_attempts",
                ..
            }
        ));
    }

    #[test]
    fn validate_rejects_out_of_range_durations() {
        let config = SessionConfig {
            reconnection_delay: Duration::from_millis(0),
            ..SessionConfig::default()
        };
        assert!(config.validate().is_err());

        let config = SessionConfig {
            connect_timeout: Duration::from_secs(3600),
            ..SessionConfig::default()
        };
        assert!(config.validate().is_err());

        let config = SessionConfig {
            ping_interval: Duration::from_millis(10),
            ..SessionConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_event_queue() {
        let config = SessionConfig {
            event_queue_size: 0,
            ..SessionConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_accepts_boundaries() {
        let config = SessionConfig {
            reconnection_attempts: 100,
            reconnection_delay: Duration::from_millis(1),
            connect_timeout: Duration::from_millis(100),
            ping_interval: Duration::from_millis(100),
            ping_timeout: Duration::from_millis(1),
            event_queue_size: 1,
        };
        assert!(config.validate().is_ok());
    }
}
