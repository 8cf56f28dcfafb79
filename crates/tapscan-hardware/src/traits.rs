//! Contactless radio driver trait.
//!
//! [`NfcHardware`] is the only dependency of the scan controller. It models a
//! radio that can be probed once, initialized once, and then reserved for one
//! read attempt at a time.
//!
//! Methods are declared as `fn ... -> impl Future<Output = _> + Send` so that
//! generic callers can move a driver into a spawned Tokio task. Implementors
//! still write plain `async fn`.

use std::future::Future;

use tapscan_core::TechnologyKind;

use crate::error::Result;
use crate::types::RawTagRecord;

/// Contactless radio abstraction.
///
/// # Exclusive Access
///
/// `request_exclusive_access` suspends until a tag supporting the requested
/// technology enters the field. Dropping the returned future aborts the
/// request; implementations must leave the radio unreserved in that case.
/// Every call must eventually be matched by a `release_exclusive_access`,
/// which is always safe to call, even when access was never granted.
///
/// # Object Safety and Dynamic Dispatch
///
/// **NOTE**: This trait is NOT object-safe because its methods return
/// `impl Future`. Use generic type parameters, or the enum wrapper
/// [`AnyNfcHardware`](crate::devices::AnyNfcHardware) for dynamic dispatch.
///
/// # Examples
///
/// ```no_run
/// use tapscan_core::TechnologyKind;
/// use tapscan_hardware::traits::NfcHardware;
/// use tapscan_hardware::types::RawTagRecord;
/// use tapscan_hardware::error::Result;
///
/// async fn read_once<H: NfcHardware>(radio: &mut H) -> Result<Option<RawTagRecord>> {
///     radio.request_exclusive_access(TechnologyKind::IsoDep).await?;
///     let raw = radio.read_raw_tag().await;
///     radio.release_exclusive_access().await.ok();
///     raw
/// }
/// ```
pub trait NfcHardware: Send {
    /// Check whether the device has a usable contactless radio.
    ///
    /// # Errors
    ///
    /// Returns an error if the capability query itself fails. Callers treat
    /// that the same as `Ok(false)`.
    fn is_supported(&mut self) -> impl Future<Output = Result<bool>> + Send;

    /// Perform one-time setup of the radio subsystem.
    ///
    /// Called at most once per driver instance, after a successful probe.
    ///
    /// # Errors
    ///
    /// Returns an error if the radio cannot be brought up.
    fn initialize_session(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Reserve the radio and wait for a compatible tag.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Access is already held or cannot be granted
    /// - The wait fails at the hardware layer
    /// - The device is disconnected
    fn request_exclusive_access(
        &mut self,
        technology: TechnologyKind,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Read the tag that satisfied the last access request.
    ///
    /// Returns `Ok(None)` when the driver reports a tag without any data.
    ///
    /// # Errors
    ///
    /// Returns an error if exclusive access is not held or the read fails.
    fn read_raw_tag(&mut self) -> impl Future<Output = Result<Option<RawTagRecord>>> + Send;

    /// Release exclusive access.
    ///
    /// # Errors
    ///
    /// Returns an error if cleanup fails. Such errors are non-fatal.
    fn release_exclusive_access(&mut self) -> impl Future<Output = Result<()>> + Send;
}
