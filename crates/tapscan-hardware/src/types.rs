//! Data crossing the driver boundary.
//!
//! Contactless drivers report tags as loosely-typed records: depending on the
//! physical tag any field may be missing. [`RawTagRecord`] keeps every field
//! optional so that normalization happens in one place (the tag parser)
//! instead of at every call site.

use serde::{Deserialize, Serialize};
use tapscan_core::TechnologyKind;

/// Tag record as reported by the radio driver.
///
/// Read once by the tag parser and never retained.
///
/// # Examples
///
/// ```
/// use tapscan_hardware::types::RawTagRecord;
/// use tapscan_core::TechnologyKind;
///
/// let raw = RawTagRecord::new()
///     .with_uid(&[0x04, 0xA1, 0xB2, 0xC3])
///     .with_technology(TechnologyKind::NfcA)
///     .with_tag_type("ISO14443");
///
/// assert_eq!(raw.id.as_deref(), Some("04A1B2C3"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTagRecord {
    /// Identifier as an uppercase hex string, as given by the hardware.
    pub id: Option<String>,

    /// Supported technology names, in driver order (may contain duplicates).
    pub tech_types: Option<Vec<String>>,

    /// Driver-specific type label (e.g. `"ISO14443"`).
    pub tag_type: Option<String>,
}

impl RawTagRecord {
    /// Create an empty record (every field absent).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the identifier string.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the identifier from raw UID bytes.
    pub fn with_uid(self, uid: &[u8]) -> Self {
        self.with_id(uid_hex(uid))
    }

    /// Append a supported technology.
    pub fn with_technology(mut self, technology: TechnologyKind) -> Self {
        self.tech_types
            .get_or_insert_with(Vec::new)
            .push(technology.as_str().to_string());
        self
    }

    /// Replace the technology list with driver-reported names.
    pub fn with_tech_types<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tech_types = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Set the type label.
    pub fn with_tag_type(mut self, tag_type: impl Into<String>) -> Self {
        self.tag_type = Some(tag_type.into());
        self
    }
}

/// Format UID bytes as an uppercase hex string without separators.
///
/// # Examples
///
/// ```
/// use tapscan_hardware::types::uid_hex;
///
/// assert_eq!(uid_hex(&[0x04, 0xab, 0xcd, 0xef]), "04ABCDEF");
/// ```
pub fn uid_hex(uid: &[u8]) -> String {
    uid.iter().map(|b| format!("{:02X}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_record() {
        let raw = RawTagRecord::new();
        assert_eq!(raw.id, None);
        assert_eq!(raw.tech_types, None);
        assert_eq!(raw.tag_type, None);
    }

    #[test]
    fn test_record_builder() {
        let raw = RawTagRecord::new()
            .with_uid(&[0x04, 0xA1, 0xB2, 0xC3])
            .with_technology(TechnologyKind::NfcA)
            .with_technology(TechnologyKind::IsoDep)
            .with_tag_type("ISO14443");

        assert_eq!(raw.id.as_deref(), Some("04A1B2C3"));
        assert_eq!(
            raw.tech_types,
            Some(vec!["NfcA".to_string(), "IsoDep".to_string()])
        );
        assert_eq!(raw.tag_type.as_deref(), Some("ISO14443"));
    }

    #[test]
    fn test_tech_types_replace() {
        let raw = RawTagRecord::new()
            .with_technology(TechnologyKind::NfcA)
            .with_tech_types(["android.nfc.tech.IsoDep"]);
        assert_eq!(
            raw.tech_types,
            Some(vec!["android.nfc.tech.IsoDep".to_string()])
        );
    }

    #[test]
    fn test_uid_hex() {
        assert_eq!(uid_hex(&[]), "");
        assert_eq!(uid_hex(&[0x00, 0x0F]), "000F");
    }

    #[test]
    fn test_record_serialization() {
        let raw = RawTagRecord::new().with_id("04A1B2C3");
        let json = serde_json::to_string(&raw).unwrap();
        let back: RawTagRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(raw, back);
    }
}
