//! Controller configuration.

use std::time::Duration;

use tapscan_core::constants::{DEFAULT_COMMAND_BUFFER, DEFAULT_HISTORY_SIZE};
use tapscan_core::{Error, Result, TechnologyKind};

/// Configuration for a [`ScanController`](crate::ScanController).
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use tapscan_controller::ControllerConfig;
/// use tapscan_core::TechnologyKind;
///
/// let config = ControllerConfig::default()
///     .with_technology(TechnologyKind::NfcA)
///     .with_attempt_timeout(Duration::from_secs(30));
///
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Technology requested when reserving the radio.
    pub technology: TechnologyKind,

    /// Optional bound on a single attempt. Expiry acts as a `cancel`.
    ///
    /// `None` waits indefinitely; the presenter's `cancel` is then the only
    /// bound on attempt duration.
    pub attempt_timeout: Option<Duration>,

    /// Depth of the command channel.
    pub command_buffer: usize,

    /// Number of phase transitions kept in history.
    pub history_size: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            technology: TechnologyKind::IsoDep,
            attempt_timeout: None,
            command_buffer: DEFAULT_COMMAND_BUFFER,
            history_size: DEFAULT_HISTORY_SIZE,
        }
    }
}

impl ControllerConfig {
    /// Set the requested technology.
    pub fn with_technology(mut self, technology: TechnologyKind) -> Self {
        self.technology = technology;
        self
    }

    /// Bound every attempt by `timeout`.
    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = Some(timeout);
        self
    }

    /// Set the command channel depth.
    pub fn with_command_buffer(mut self, command_buffer: usize) -> Self {
        self.command_buffer = command_buffer;
        self
    }

    /// Set the transition history size.
    pub fn with_history_size(mut self, history_size: usize) -> Self {
        self.history_size = history_size;
        self
    }

    /// Check the configuration for values the controller cannot run with.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the timeout, command buffer or history
    /// size is zero.
    pub fn validate(&self) -> Result<()> {
        if self.attempt_timeout.is_some_and(|timeout| timeout.is_zero()) {
            return Err(Error::Config(
                "attempt_timeout must be greater than zero".to_string(),
            ));
        }
        if self.command_buffer == 0 {
            return Err(Error::Config(
                "command_buffer must be greater than zero".to_string(),
            ));
        }
        if self.history_size == 0 {
            return Err(Error::Config(
                "history_size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
