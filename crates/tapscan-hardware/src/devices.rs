//! Enum wrapper for radio driver dispatch.
//!
//! Native `async fn` in traits (RPITIT) is not object-safe, so we cannot use
//! `Box<dyn NfcHardware>`. [`AnyNfcHardware`] provides concrete type dispatch
//! at compile time instead, with hardware drivers gated behind feature flags.
//!
//! # Examples
//!
//! ```
//! use tapscan_hardware::devices::AnyNfcHardware;
//! use tapscan_hardware::mock::MockNfc;
//!
//! let (radio, _handle) = MockNfc::new();
//! let any_radio = AnyNfcHardware::Mock(radio);
//! assert_eq!(any_radio.name(), "Mock NFC Radio");
//! ```

use tapscan_core::TechnologyKind;

use crate::mock::MockNfc;
#[cfg(feature = "hardware-pcsc")]
use crate::pcsc::PcscNfc;
use crate::traits::NfcHardware;
use crate::types::RawTagRecord;
use crate::Result;

/// Enum wrapper for contactless radio dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyNfcHardware {
    /// Mock radio for development and testing.
    Mock(MockNfc),

    /// PC/SC contactless reader.
    #[cfg(feature = "hardware-pcsc")]
    Pcsc(PcscNfc),
}

impl AnyNfcHardware {
    /// Human-readable driver name, for logs.
    pub fn name(&self) -> &str {
        match self {
            Self::Mock(device) => device.name(),
            #[cfg(feature = "hardware-pcsc")]
            Self::Pcsc(_) => "PC/SC reader",
        }
    }
}

impl From<MockNfc> for AnyNfcHardware {
    fn from(device: MockNfc) -> Self {
        Self::Mock(device)
    }
}

#[cfg(feature = "hardware-pcsc")]
impl From<PcscNfc> for AnyNfcHardware {
    fn from(device: PcscNfc) -> Self {
        Self::Pcsc(device)
    }
}

impl NfcHardware for AnyNfcHardware {
    async fn is_supported(&mut self) -> Result<bool> {
        match self {
            Self::Mock(device) => device.is_supported().await,
            #[cfg(feature = "hardware-pcsc")]
            Self::Pcsc(device) => device.is_supported().await,
        }
    }

    async fn initialize_session(&mut self) -> Result<()> {
        match self {
            Self::Mock(device) => device.initialize_session().await,
            #[cfg(feature = "hardware-pcsc")]
            Self::Pcsc(device) => device.initialize_session().await,
        }
    }

    async fn request_exclusive_access(&mut self, technology: TechnologyKind) -> Result<()> {
        match self {
            Self::Mock(device) => device.request_exclusive_access(technology).await,
            #[cfg(feature = "hardware-pcsc")]
            Self::Pcsc(device) => device.request_exclusive_access(technology).await,
        }
    }

    async fn read_raw_tag(&mut self) -> Result<Option<RawTagRecord>> {
        match self {
            Self::Mock(device) => device.read_raw_tag().await,
            #[cfg(feature = "hardware-pcsc")]
            Self::Pcsc(device) => device.read_raw_tag().await,
        }
    }

    async fn release_exclusive_access(&mut self) -> Result<()> {
        match self {
            Self::Mock(device) => device.release_exclusive_access().await,
            #[cfg(feature = "hardware-pcsc")]
            Self::Pcsc(device) => device.release_exclusive_access().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_any_nfc_hardware_dispatch() {
        let (radio, handle) = MockNfc::new();
        let mut any_radio = AnyNfcHardware::from(radio);

        assert!(any_radio.is_supported().await.unwrap());
        any_radio.initialize_session().await.unwrap();

        handle
            .present_tag(RawTagRecord::new().with_id("04A1B2C3"))
            .await
            .unwrap();
        any_radio
            .request_exclusive_access(TechnologyKind::NfcA)
            .await
            .unwrap();
        let raw = any_radio.read_raw_tag().await.unwrap();
        any_radio.release_exclusive_access().await.unwrap();

        assert_eq!(raw.unwrap().id.as_deref(), Some("04A1B2C3"));
        let stats = handle.stats();
        assert_eq!(stats.support_probes, 1);
        assert_eq!(stats.initializations, 1);
        assert_eq!(stats.releases, 1);
    }
}
