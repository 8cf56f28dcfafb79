//! Contactless capability detection.
//!
//! Detection fails closed: a probe error or an initialization failure both
//! report the device as unsupported.

use tapscan_hardware::NfcHardware;
use tracing::{info, warn};

use crate::error::ScanError;

/// Outcome of probing the radio.
#[derive(Debug)]
pub enum SupportStatus {
    /// Radio present and session initialized.
    Supported,

    /// Scanning is not possible on this device.
    Unsupported(ScanError),
}

impl SupportStatus {
    pub fn is_supported(&self) -> bool {
        matches!(self, SupportStatus::Supported)
    }
}

/// Probe the radio and initialize its session.
///
/// The session is initialized only if the probe reports hardware present.
pub async fn detect<H: NfcHardware>(hardware: &mut H) -> SupportStatus {
    match hardware.is_supported().await {
        Ok(true) => {}
        Ok(false) => {
            warn!("No contactless hardware present");
            return SupportStatus::Unsupported(ScanError::capability(
                "no contactless hardware present",
            ));
        }
        Err(e) => {
            warn!(error = %e, "Capability probe failed");
            return SupportStatus::Unsupported(ScanError::capability(format!(
                "capability probe failed: {e}"
            )));
        }
    }

    if let Err(e) = hardware.initialize_session().await {
        warn!(error = %e, "Radio session initialization failed");
        return SupportStatus::Unsupported(ScanError::capability(format!(
            "session initialization failed: {e}"
        )));
    }

    info!("Contactless hardware ready");
    SupportStatus::Supported
}
