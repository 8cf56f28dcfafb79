//! Raw tag record to display summary.
//!
//! Parsing is pure: the same record and timestamp always yield the same
//! summary. Absent fields fall back to defaults; only an identifier that is
//! present but not hexadecimal is rejected.

use chrono::{DateTime, Utc};
use tapscan_core::CardSummary;
use tapscan_core::constants::{MASK_GROUP, MASK_VISIBLE_CHARS, MASKED_PREFIX, UNKNOWN_LABEL};
use tapscan_hardware::RawTagRecord;

/// Why a raw tag record could not be turned into a summary.
///
/// Messages never include the identifier itself.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// The driver reported a tag but returned no data for it.
    #[error("driver returned no tag data")]
    MissingRecord,

    /// The identifier contains non-hexadecimal characters.
    #[error("tag identifier is not hexadecimal")]
    MalformedIdentifier,
}

/// Redact an identifier down to its last four characters.
///
/// Identifiers shorter than four characters, and absent ones, are replaced
/// entirely so nothing leaks.
///
/// # Examples
///
/// ```
/// use tapscan_controller::parser::mask_identifier;
///
/// assert_eq!(mask_identifier(Some("04A1B2C3")), "**** **** **** B2C3");
/// assert_eq!(mask_identifier(Some("A1B")), "****");
/// assert_eq!(mask_identifier(None), "****");
/// ```
pub fn mask_identifier(id: Option<&str>) -> String {
    let Some(id) = id else {
        return MASK_GROUP.to_string();
    };

    let len = id.chars().count();
    if len < MASK_VISIBLE_CHARS {
        return MASK_GROUP.to_string();
    }

    let visible: String = id.chars().skip(len - MASK_VISIBLE_CHARS).collect();
    format!("{MASKED_PREFIX}{visible}")
}

/// Build a [`CardSummary`] from a raw record read at `scanned_at`.
///
/// # Errors
///
/// Returns [`ParseError::MalformedIdentifier`] if the identifier is present
/// and non-blank but not hexadecimal.
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use tapscan_controller::parser::parse;
/// use tapscan_hardware::RawTagRecord;
///
/// let raw = RawTagRecord::new().with_id("04A1B2C3").with_tag_type("ISO14443");
/// let summary = parse(&raw, Utc::now()).unwrap();
///
/// assert_eq!(summary.masked_number, "**** **** **** B2C3");
/// assert_eq!(summary.tag_type, "ISO14443");
/// assert!(summary.technologies.is_empty());
/// ```
pub fn parse(raw: &RawTagRecord, scanned_at: DateTime<Utc>) -> Result<CardSummary, ParseError> {
    let id = normalize_identifier(raw.id.as_deref())?;

    let tag_type = raw
        .tag_type
        .as_deref()
        .map(str::trim)
        .filter(|label| !label.is_empty())
        .unwrap_or(UNKNOWN_LABEL)
        .to_string();

    Ok(CardSummary {
        masked_number: mask_identifier(id),
        tag_id: id.unwrap_or(UNKNOWN_LABEL).to_string(),
        tag_type,
        technologies: normalize_technologies(raw.tech_types.as_deref()),
        scanned_at,
    })
}

/// Trim the identifier; blank counts as absent.
fn normalize_identifier(id: Option<&str>) -> Result<Option<&str>, ParseError> {
    let Some(id) = id.map(str::trim).filter(|id| !id.is_empty()) else {
        return Ok(None);
    };

    if !id.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ParseError::MalformedIdentifier);
    }
    Ok(Some(id))
}

fn normalize_technologies(techs: Option<&[String]>) -> Vec<String> {
    let mut unique: Vec<String> = Vec::new();
    for tech in techs.unwrap_or_default() {
        let tech = tech.trim();
        if tech.is_empty() || unique.iter().any(|seen| seen == tech) {
            continue;
        }
        unique.push(tech.to_string());
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    fn read_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, 9, 26, 53).unwrap()
    }

    #[rstest]
    #[case(Some("04A1B2C3"), "**** **** **** B2C3")]
    #[case(Some("B2C3"), "**** **** **** B2C3")]
    #[case(Some("A1B"), "****")]
    #[case(Some(""), "****")]
    #[case(None, "****")]
    fn test_mask_identifier(#[case] id: Option<&str>, #[case] expected: &str) {
        assert_eq!(mask_identifier(id), expected);
    }

    #[test]
    fn test_mask_counts_characters_not_bytes() {
        assert_eq!(mask_identifier(Some("ééééAB")), "**** **** **** ééAB");
    }

    #[test]
    fn test_parse_full_record() {
        let raw = RawTagRecord::new()
            .with_id("04A1B2C3")
            .with_tag_type("ISO14443")
            .with_tech_types(["NfcA", "IsoDep"]);

        let summary = parse(&raw, read_time()).unwrap();

        assert_eq!(summary.masked_number, "**** **** **** B2C3");
        assert_eq!(summary.tag_id, "04A1B2C3");
        assert_eq!(summary.tag_type, "ISO14443");
        assert_eq!(summary.technologies, vec!["NfcA", "IsoDep"]);
        assert_eq!(summary.scanned_at, read_time());
    }

    #[test]
    fn test_parse_empty_record_uses_defaults() {
        let summary = parse(&RawTagRecord::default(), read_time()).unwrap();

        assert_eq!(summary.masked_number, "****");
        assert_eq!(summary.tag_id, "Unknown");
        assert_eq!(summary.tag_type, "Unknown");
        assert!(summary.technologies.is_empty());
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    fn test_blank_type_is_unknown(#[case] label: &str) {
        let raw = RawTagRecord::new().with_id("04A1B2C3").with_tag_type(label);
        assert_eq!(parse(&raw, read_time()).unwrap().tag_type, "Unknown");
    }

    #[test]
    fn test_identifier_is_trimmed() {
        let raw = RawTagRecord::new().with_id("  04a1b2c3\n");
        let summary = parse(&raw, read_time()).unwrap();

        assert_eq!(summary.tag_id, "04a1b2c3");
        assert_eq!(summary.masked_number, "**** **** **** b2c3");
    }

    #[test]
    fn test_blank_identifier_is_absent() {
        let raw = RawTagRecord::new().with_id("  ");
        let summary = parse(&raw, read_time()).unwrap();
        assert_eq!(summary.tag_id, "Unknown");
        assert_eq!(summary.masked_number, "****");
    }

    #[rstest]
    #[case("04A1-B2C3")]
    #[case("not a uid")]
    #[case("04 A1 B2 C3")]
    #[case("04:A1:B2:C3")]
    fn test_malformed_identifier(#[case] id: &str) {
        let raw = RawTagRecord::new().with_id(id);
        assert_eq!(
            parse(&raw, read_time()),
            Err(ParseError::MalformedIdentifier)
        );
    }

    #[test]
    fn test_technologies_deduplicated_in_order() {
        let raw = RawTagRecord::new().with_tech_types([
            "IsoDep",
            "NfcA",
            " ",
            "IsoDep",
            " NfcA ",
            "Ndef",
        ]);

        let summary = parse(&raw, read_time()).unwrap();
        assert_eq!(summary.technologies, vec!["IsoDep", "NfcA", "Ndef"]);
    }

    #[test]
    fn test_parse_is_pure() {
        let raw = RawTagRecord::new().with_uid(&[0x04, 0xA1, 0xB2, 0xC3]);
        assert_eq!(parse(&raw, read_time()), parse(&raw, read_time()));
    }

    #[test]
    fn test_error_messages_do_not_leak_identifier() {
        let message = ParseError::MalformedIdentifier.to_string();
        assert!(!message.contains("04A1"));
    }
}
