use crate::{Result, error::Error};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Discrete phase of the scan lifecycle.
///
/// # Valid Transitions
///
/// - Uninitialized → CheckingSupport → Unsupported | Idle
/// - Idle → Scanning → Success | Failed | Idle
/// - Success | Failed → Scanning
///
/// Teardown forces any phase back to `Uninitialized`; that transition is not
/// part of [`can_transition_to`](ScanPhase::can_transition_to) because it is
/// never refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanPhase {
    /// Controller not running (before creation or after teardown).
    Uninitialized,

    /// Capability probe in progress.
    CheckingSupport,

    /// Device lacks usable contactless hardware. Terminal.
    Unsupported,

    /// Ready to start an attempt.
    Idle,

    /// Exclusive radio access requested, waiting for a tag.
    Scanning,

    /// A tag was read and summarized.
    Success,

    /// The last attempt failed.
    Failed,
}

impl fmt::Display for ScanPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let phase = match self {
            ScanPhase::Uninitialized => "Uninitialized",
            ScanPhase::CheckingSupport => "CheckingSupport",
            ScanPhase::Unsupported => "Unsupported",
            ScanPhase::Idle => "Idle",
            ScanPhase::Scanning => "Scanning",
            ScanPhase::Success => "Success",
            ScanPhase::Failed => "Failed",
        };
        write!(f, "{phase}")
    }
}

impl ScanPhase {
    /// Check if moving from this phase to `target` is a legal lifecycle step.
    ///
    /// # Examples
    ///
    /// ```
    /// use tapscan_core::ScanPhase;
    ///
    /// assert!(ScanPhase::Idle.can_transition_to(&ScanPhase::Scanning));
    /// assert!(!ScanPhase::Idle.can_transition_to(&ScanPhase::Success));
    /// ```
    pub fn can_transition_to(&self, target: &ScanPhase) -> bool {
        matches!(
            (self, target),
            (ScanPhase::Uninitialized, ScanPhase::CheckingSupport)
                | (ScanPhase::CheckingSupport, ScanPhase::Unsupported | ScanPhase::Idle)
                | (ScanPhase::Idle, ScanPhase::Scanning)
                | (ScanPhase::Scanning, ScanPhase::Success | ScanPhase::Failed | ScanPhase::Idle)
                | (ScanPhase::Success, ScanPhase::Scanning)
                | (ScanPhase::Failed, ScanPhase::Scanning)
        )
    }

    /// Whether a `start` command can begin a new attempt from this phase.
    #[must_use]
    pub fn accepts_start(&self) -> bool {
        self.can_transition_to(&ScanPhase::Scanning)
    }

    /// Whether the phase can never be left except through teardown.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, ScanPhase::Unsupported)
    }
}

/// Contactless technology requested when reserving the radio.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TechnologyKind {
    /// ISO 14443-3A.
    NfcA,
    /// ISO 14443-3B.
    NfcB,
    /// JIS 6319-4 (FeliCa).
    NfcF,
    /// ISO 15693.
    NfcV,
    /// ISO 14443-4 (payment cards, passports).
    #[default]
    IsoDep,
    /// NDEF formatted tags.
    Ndef,
    /// Mifare Classic.
    MifareClassic,
    /// Mifare Ultralight.
    MifareUltralight,
}

impl TechnologyKind {
    /// All known technologies, in declaration order.
    pub const ALL: [TechnologyKind; 8] = [
        TechnologyKind::NfcA,
        TechnologyKind::NfcB,
        TechnologyKind::NfcF,
        TechnologyKind::NfcV,
        TechnologyKind::IsoDep,
        TechnologyKind::Ndef,
        TechnologyKind::MifareClassic,
        TechnologyKind::MifareUltralight,
    ];

    /// Name as reported by contactless drivers (e.g. `"IsoDep"`).
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            TechnologyKind::NfcA => "NfcA",
            TechnologyKind::NfcB => "NfcB",
            TechnologyKind::NfcF => "NfcF",
            TechnologyKind::NfcV => "NfcV",
            TechnologyKind::IsoDep => "IsoDep",
            TechnologyKind::Ndef => "Ndef",
            TechnologyKind::MifareClassic => "MifareClassic",
            TechnologyKind::MifareUltralight => "MifareUltralight",
        }
    }
}

impl fmt::Display for TechnologyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TechnologyKind {
    type Err = Error;

    /// Parse a technology name, ignoring case, separators and an optional
    /// `android.nfc.tech.` package prefix.
    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim();
        let name = name.strip_prefix("android.nfc.tech.").unwrap_or(name);
        let normalized: String = name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();

        TechnologyKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().to_ascii_lowercase() == normalized)
            .ok_or_else(|| Error::UnknownTechnology(s.to_string()))
    }
}

/// Identifier of a single scan attempt, used to correlate log records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttemptId(Uuid);

impl AttemptId {
    /// Generate a new random attempt ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the underlying UUID.
    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for AttemptId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// Sanitized summary of a successfully read tag.
///
/// Produced once per successful scan and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardSummary {
    /// Identifier redacted to `**** **** **** XXXX`, or `****`.
    pub masked_number: String,

    /// Hardware identifier with surrounding whitespace trimmed, or
    /// `"Unknown"`. Always bare hex digits in the reported case; identifiers
    /// with separators fail to parse instead.
    pub tag_id: String,

    /// Human-readable tag type label, or `"Unknown"`.
    pub tag_type: String,

    /// Supported technologies in reported order, without duplicates.
    pub technologies: Vec<String>,

    /// When the tag was read (not when it was displayed).
    pub scanned_at: DateTime<Utc>,
}

/// Observable state of a scan controller.
///
/// The constructors are the only way to build a state, which keeps
/// `result` present exactly in [`ScanPhase::Success`] and `error` present
/// exactly in [`ScanPhase::Failed`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanState {
    phase: ScanPhase,
    error: Option<String>,
    result: Option<CardSummary>,
}

impl ScanState {
    fn bare(phase: ScanPhase) -> Self {
        Self {
            phase,
            error: None,
            result: None,
        }
    }

    #[must_use]
    pub fn uninitialized() -> Self {
        Self::bare(ScanPhase::Uninitialized)
    }

    #[must_use]
    pub fn checking_support() -> Self {
        Self::bare(ScanPhase::CheckingSupport)
    }

    #[must_use]
    pub fn unsupported() -> Self {
        Self::bare(ScanPhase::Unsupported)
    }

    #[must_use]
    pub fn idle() -> Self {
        Self::bare(ScanPhase::Idle)
    }

    #[must_use]
    pub fn scanning() -> Self {
        Self::bare(ScanPhase::Scanning)
    }

    /// State after a tag was read and summarized.
    #[must_use]
    pub fn success(summary: CardSummary) -> Self {
        Self {
            phase: ScanPhase::Success,
            error: None,
            result: Some(summary),
        }
    }

    /// State after an attempt failed with a human-readable reason.
    #[must_use]
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            phase: ScanPhase::Failed,
            error: Some(reason.into()),
            result: None,
        }
    }

    #[must_use]
    pub fn phase(&self) -> ScanPhase {
        self.phase
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    #[must_use]
    pub fn result(&self) -> Option<&CardSummary> {
        self.result.as_ref()
    }
}

impl Default for ScanState {
    fn default() -> Self {
        Self::uninitialized()
    }
}

impl fmt::Display for ScanState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.error, &self.result) {
            (Some(reason), _) => write!(f, "{} ({reason})", self.phase),
            (_, Some(summary)) => write!(f, "{} ({})", self.phase, summary.masked_number),
            _ => write!(f, "{}", self.phase),
        }
    }
}
