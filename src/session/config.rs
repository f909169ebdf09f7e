//! Session configuration.

use std::time::Duration;

use crate::channel::RetryPolicy;
use crate::core::{
    DEFAULT_CLIENT_SERIAL, DEFAULT_CONFIRMATION_TIMEOUT, DEFAULT_CONNECT_ATTEMPTS,
    DEFAULT_CONNECT_RETRY_DELAY, RT_MODE_SERVICE_VERSION,
};

/// Session configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Attempts made to open the channel on `connect`.
    pub connect_attempts: u32,

    /// Pause between channel open attempts.
    pub connect_retry_delay: Duration,

    /// How long `press_button` waits for the pump's confirmation.
    pub confirmation_timeout: Duration,

    /// Serial number announced with `CtrlConnect`.
    pub client_serial: u32,

    /// RT mode service version requested on activation (major, minor).
    pub rt_service_version: (u8, u8),
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            connect_attempts: DEFAULT_CONNECT_ATTEMPTS,
            connect_retry_delay: DEFAULT_CONNECT_RETRY_DELAY,
            confirmation_timeout: DEFAULT_CONFIRMATION_TIMEOUT,
            client_serial: DEFAULT_CLIENT_SERIAL,
            rt_service_version: RT_MODE_SERVICE_VERSION,
        }
    }
}

impl SessionConfig {
    /// Retry policy for opening the channel.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.connect_attempts, self.connect_retry_delay)
    }
}

/// Builder for [`SessionConfig`].
#[derive(Debug, Default)]
pub struct SessionConfigBuilder {
    config: SessionConfig,
}

impl SessionConfigBuilder {
    /// Create a builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of channel open attempts.
    pub fn connect_attempts(mut self, attempts: u32) -> Self {
        self.config.connect_attempts = attempts;
        self
    }

    /// Set the pause between channel open attempts.
    pub fn connect_retry_delay(mut self, delay: Duration) -> Self {
        self.config.connect_retry_delay = delay;
        self
    }

    /// Set the button confirmation timeout.
    pub fn confirmation_timeout(mut self, timeout: Duration) -> Self {
        self.config.confirmation_timeout = timeout;
        self
    }

    /// Set the client serial.
    pub fn client_serial(mut self, serial: u32) -> Self {
        self.config.client_serial = serial;
        self
    }

    /// Set the requested RT mode service version.
    pub fn rt_service_version(mut self, major: u8, minor: u8) -> Self {
        self.config.rt_service_version = (major, minor);
        self
    }

    /// Build the configuration.
    pub fn build(self) -> SessionConfig {
        self.config
    }
}
