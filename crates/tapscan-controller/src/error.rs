//! Failure taxonomy of the scan lifecycle.
//!
//! Only capability, acquisition and parse failures are visible outside the
//! controller, and only through the published [`ScanState`]:
//!
//! | Kind | Recoverable | Surfaced as |
//! |---|---|---|
//! | `Capability` | no | `Unsupported` phase |
//! | `Acquisition` | yes | `Failed` + error display string |
//! | `Parse` | yes | `Failed` + `"Unreadable tag"` |
//! | `Release` | n/a | logged only |
//!
//! [`ScanState`]: tapscan_core::ScanState

use tapscan_core::constants::UNREADABLE_TAG_REASON;
use tapscan_hardware::HardwareError;

use crate::parser::ParseError;

/// Errors produced while running the scan lifecycle.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// The device lacks, or failed to initialize, contactless hardware.
    #[error("Contactless hardware unavailable: {reason}")]
    Capability { reason: String },

    /// Exclusive access could not be obtained or the wait failed.
    #[error("Scan failed: {0}")]
    Acquisition(#[source] HardwareError),

    /// The raw tag record could not be interpreted.
    #[error("Unreadable tag: {0}")]
    Parse(#[from] ParseError),

    /// Releasing exclusive access failed.
    #[error("Release failed: {0}")]
    Release(#[source] HardwareError),
}

impl ScanError {
    /// Create a new capability error.
    pub fn capability(reason: impl Into<String>) -> Self {
        Self::Capability {
            reason: reason.into(),
        }
    }

    /// Reason shown to presenters in the `Failed` phase.
    ///
    /// Returns `None` for kinds that never reach `Failed`.
    pub fn failure_reason(&self) -> Option<String> {
        match self {
            Self::Acquisition(_) => Some(self.to_string()),
            Self::Parse(_) => Some(UNREADABLE_TAG_REASON.to_string()),
            Self::Capability { .. } | Self::Release(_) => None,
        }
    }
}
