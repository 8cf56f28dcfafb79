//! Contactless tag scan lifecycle.
//!
//! This crate turns an [`NfcHardware`] radio into a single-owner scan
//! controller:
//!
//! - [`detector`]: decides once whether the device can scan at all.
//! - [`controller`]: the actor that runs start, cancel, retry and teardown,
//!   and always returns exclusive radio access.
//! - [`parser`]: pure mapping from raw tag data to a masked [`CardSummary`].
//! - [`state_machine`]: the legal phase graph with a bounded history.
//!
//! Presenters observe a [`ScanState`] through [`ScanController::subscribe`]
//! and never touch the radio directly.
//!
//! [`NfcHardware`]: tapscan_hardware::NfcHardware
//! [`CardSummary`]: tapscan_core::CardSummary
//! [`ScanState`]: tapscan_core::ScanState

pub mod config;
pub mod controller;
pub mod detector;
pub mod error;
pub mod parser;
pub mod state_machine;

pub use config::ControllerConfig;
pub use controller::{ScanController, StartOutcome};
pub use detector::{SupportStatus, detect};
pub use error::ScanError;
pub use parser::{ParseError, mask_identifier, parse};
pub use state_machine::{PhaseTransition, StateMachine};
