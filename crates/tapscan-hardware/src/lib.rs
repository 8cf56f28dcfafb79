//! Contactless radio abstraction layer for tapscan.
//!
//! This crate defines the [`NfcHardware`] trait consumed by the scan
//! controller, the loosely-typed [`RawTagRecord`] drivers report, and the
//! available drivers:
//!
//! - [`mock::MockNfc`]: scriptable in-memory radio for tests and demos.
//! - `pcsc::PcscNfc` (feature `hardware-pcsc`): desktop contactless readers
//!   over PC/SC.
//!
//! # Design Philosophy
//!
//! - **Async-first**: All I/O operations are asynchronous; trait methods
//!   return `Send` futures so drivers can live inside spawned Tokio tasks.
//! - **Owned handles**: A driver is a plain value moved into its owner. There
//!   is no global session, so one owner means one exclusive access window.
//! - **Abort by drop**: Dropping a pending access request aborts it.
//! - **Error-aware**: All operations return `Result<T>` with a
//!   [`HardwareError`] describing the failure.
//!
//! # Example
//!
//! ```no_run
//! use tapscan_hardware::traits::NfcHardware;
//! use tapscan_hardware::error::Result;
//!
//! async fn probe<H: NfcHardware>(radio: &mut H) -> Result<bool> {
//!     if !radio.is_supported().await? {
//!         return Ok(false);
//!     }
//!     radio.initialize_session().await?;
//!     Ok(true)
//! }
//! ```

pub mod devices;
pub mod error;
pub mod mock;
#[cfg(feature = "hardware-pcsc")]
pub mod pcsc;
pub mod traits;
pub mod types;

// Re-export commonly used types for convenience
pub use devices::AnyNfcHardware;
pub use error::{HardwareError, Result};
pub use traits::NfcHardware;
pub use types::{RawTagRecord, uid_hex};
