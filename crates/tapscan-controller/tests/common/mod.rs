//! Common test utilities for controller integration tests.
//!
//! Helpers fall into two groups:
//!
//! 1. **Setup helpers** (`spawn_*`) spawn a controller over a mock radio and
//!    wait until support detection has finished.
//! 2. **Assertion helpers** (`assert_*`) check the access invariant and the
//!    shape of published states.
//!
//! Every wait is bounded by [`WAIT_LIMIT`] so a broken lifecycle fails the
//! test instead of hanging it.

#![allow(dead_code)]

use std::time::Duration;

use tapscan_controller::{ControllerConfig, ScanController};
use tapscan_core::{ScanPhase, ScanState};
use tapscan_hardware::RawTagRecord;
use tapscan_hardware::mock::{MockNfc, MockNfcBuilder, MockNfcHandle};

/// Upper bound on any single wait in these tests.
pub const WAIT_LIMIT: Duration = Duration::from_secs(2);

/// Identifier of the standard test tag.
pub const TEST_UID: &str = "04A1B2C3";

/// Masked form of [`TEST_UID`].
pub const TEST_UID_MASKED: &str = "**** **** **** B2C3";

/// Spawn a controller over a default mock radio and wait for `Idle`.
pub async fn spawn_ready() -> (ScanController, MockNfcHandle) {
    spawn_with(MockNfc::builder(), ControllerConfig::default()).await
}

/// Spawn a controller and wait until support detection settles.
pub async fn spawn_with(
    radio: MockNfcBuilder,
    config: ControllerConfig,
) -> (ScanController, MockNfcHandle) {
    let (radio, handle) = radio.build();
    let controller = ScanController::spawn(radio, config).expect("valid test config");
    wait_until(&controller, |s| {
        matches!(s.phase(), ScanPhase::Idle | ScanPhase::Unsupported)
    })
    .await;
    (controller, handle)
}

/// Wait for the controller to reach `phase`.
pub async fn wait_for_phase(controller: &ScanController, phase: ScanPhase) -> ScanState {
    wait_until(controller, |s| s.phase() == phase).await
}

/// Wait for a state matching `predicate`, panicking after [`WAIT_LIMIT`].
pub async fn wait_until<F>(controller: &ScanController, predicate: F) -> ScanState
where
    F: FnMut(&ScanState) -> bool,
{
    tokio::time::timeout(WAIT_LIMIT, controller.wait_for(predicate))
        .await
        .unwrap_or_else(|_| panic!("timed out waiting; last state: {}", controller.state()))
}

/// The standard test tag: identifier only, ISO14443 type label.
pub fn test_tag() -> RawTagRecord {
    RawTagRecord::new()
        .with_id(TEST_UID)
        .with_tag_type("ISO14443")
}

/// Assert that exclusive access is held exactly when an attempt is in flight.
///
/// Only meaningful at quiescent points, when no command is being processed.
pub fn assert_access_invariant(controller: &ScanController, radio: &MockNfcHandle) {
    let scanning = controller.phase() == ScanPhase::Scanning;
    let stats = radio.stats();

    if stats.held {
        assert!(scanning, "access held in phase {}", controller.phase());
    }
    assert_eq!(
        stats.outstanding_requests(),
        usize::from(scanning),
        "outstanding requests in phase {}: {stats:?}",
        controller.phase()
    );
}

/// Assert a `Failed` state with the given reason.
pub fn assert_failed_with(state: &ScanState, reason: &str) {
    assert_eq!(state.phase(), ScanPhase::Failed);
    assert_eq!(state.error(), Some(reason));
    assert!(state.result().is_none());
}
