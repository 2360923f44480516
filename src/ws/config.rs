//! WebSocket session configuration.

use std::time::Duration;

/// Fraction of the backoff added as random jitter, at most.
const MAX_JITTER_FRACTION: f64 = 0.25;

/// Configuration for WebSocket sessions.
#[derive(Debug, Clone)]
pub struct WsConfig {
    /// Interval between client heartbeat pings.
    pub ping_interval: Duration,
    /// Reconnect automatically after an unexpected disconnect.
    pub auto_reconnect: bool,
    /// Initial backoff duration for reconnection.
    pub initial_backoff: Duration,
    /// Maximum backoff duration for reconnection.
    pub max_backoff: Duration,
    /// Maximum number of reconnection attempts (None = infinite).
    pub max_reconnect_attempts: Option<u32>,
}

impl Default for WsConfig {
    fn default() -> Self {
        Self {
            ping_interval: Duration::from_secs(30),
            auto_reconnect: false,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(60),
            max_reconnect_attempts: None,
        }
    }
}

impl WsConfig {
    /// Create a new configuration builder.
    pub fn builder() -> WsConfigBuilder {
        WsConfigBuilder::new()
    }

    /// Backoff before reconnect attempt `attempt` (zero based), without jitter.
    ///
    /// `min(initial * 2^attempt, max)`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let base = self.initial_backoff.as_millis() as u64;
        let max = self.max_backoff.as_millis() as u64;
        let multiplier = 2u64.saturating_pow(attempt);
        Duration::from_millis(base.saturating_mul(multiplier).min(max))
    }

    /// Backoff for `attempt` plus up to 25% random jitter.
    pub fn backoff_with_jitter(&self, attempt: u32) -> Duration {
        let backoff = self.backoff(attempt);
        let jitter = backoff.mul_f64(rand::random::<f64>() * MAX_JITTER_FRACTION);
        backoff + jitter
    }

    /// Check if another reconnect attempt is allowed after `attempts` tries.
    pub fn should_reconnect(&self, attempts: u32) -> bool {
        self.auto_reconnect
            && match self.max_reconnect_attempts {
                Some(max) => attempts < max,
                None => true,
            }
    }
}

/// Builder for [`WsConfig`].
#[derive(Debug, Clone, Default)]
pub struct WsConfigBuilder {
    config: WsConfig,
}

impl WsConfigBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: WsConfig::default(),
        }
    }

    /// Set ping interval.
    pub fn ping_interval(mut self, interval: Duration) -> Self {
        self.config.ping_interval = interval;
        self
    }

    /// Enable or disable automatic reconnection.
    pub fn auto_reconnect(mut self, enabled: bool) -> Self {
        self.config.auto_reconnect = enabled;
        self
    }

    /// Set the reconnection backoff parameters.
    pub fn reconnect_backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.config.initial_backoff = initial;
        self.config.max_backoff = max;
        self
    }

    /// Set maximum reconnection attempts.
    pub fn max_reconnect_attempts(mut self, attempts: u32) -> Self {
        self.config.max_reconnect_attempts = Some(attempts);
        self
    }

    /// Build the configuration.
    pub fn build(self) -> WsConfig {
        self.config
    }
}
