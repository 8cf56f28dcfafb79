//! Core constants shared by the scan lifecycle crates.
//!
//! Display-format constants define the sanitized card summary shown to users,
//! lifecycle constants size the controller's internal buffers.
//!
//! # Masked Number Format
//!
//! ```text
//! **** **** **** B2C3
//! └──── prefix ───┘└┬┘
//!                   last four identifier characters
//! ```
//!
//! When fewer than [`MASK_VISIBLE_CHARS`] characters are available the whole
//! value collapses to [`MASK_GROUP`], so short identifiers never leak.

// ============================================================================
// Masking
// ============================================================================

/// Placeholder for a redacted group of four characters.
pub const MASK_GROUP: &str = "****";

/// Fixed prefix preceding the visible tail of a masked identifier.
pub const MASKED_PREFIX: &str = "**** **** **** ";

/// Number of trailing identifier characters left visible after masking.
pub const MASK_VISIBLE_CHARS: usize = 4;

// ============================================================================
// Summary defaults
// ============================================================================

/// Label used for absent tag identifiers and type labels.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Failure reason shown when a tag was detected but could not be interpreted.
pub const UNREADABLE_TAG_REASON: &str = "Unreadable tag";

// ============================================================================
// Lifecycle
// ============================================================================

/// Maximum number of phase transitions kept in the controller history.
///
/// A full scan cycle is three transitions (`Idle → Scanning → Success → ...`),
/// so the default keeps the last thirty or so attempts around for debugging.
pub const DEFAULT_HISTORY_SIZE: usize = 100;

/// Depth of the command channel between presenters and the controller.
pub const DEFAULT_COMMAND_BUFFER: usize = 16;

/// Capacity of the phase-transition broadcast channel.
pub const TRANSITION_CHANNEL_CAPACITY: usize = 64;
