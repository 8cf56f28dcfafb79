//! Mock device implementations for testing and development.
//!
//! This module provides simulated device implementations that can be controlled
//! programmatically without requiring physical hardware.

pub mod nfc;

// Re-export commonly used types
pub use nfc::{MockNfc, MockNfcBuilder, MockNfcHandle, MockNfcStats, MockSupport};
