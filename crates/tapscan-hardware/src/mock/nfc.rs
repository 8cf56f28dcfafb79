//! Mock contactless radio for testing and development.
//!
//! This module provides a simulated radio that can be controlled
//! programmatically for testing without requiring physical hardware.

use crate::{
    HardwareError, Result,
    traits::NfcHardware,
    types::RawTagRecord,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tapscan_core::TechnologyKind;
use tokio::sync::mpsc;

/// How the mock answers the capability probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MockSupport {
    /// Probe returns `true`.
    #[default]
    Supported,

    /// Probe returns `false`.
    NotSupported,

    /// Probe returns an error.
    ProbeFails,

    /// Capability query never completes.
    Hangs,
}

/// Mock contactless radio for testing and development.
///
/// Tags are presented through the paired [`MockNfcHandle`]. A pending
/// `request_exclusive_access` resolves when the handle presents a tag, an
/// empty read, or a failure. Dropping the pending request leaves queued
/// events untouched.
///
/// # Examples
///
/// ```
/// use tapscan_core::TechnologyKind;
/// use tapscan_hardware::mock::MockNfc;
/// use tapscan_hardware::traits::NfcHardware;
/// use tapscan_hardware::types::RawTagRecord;
///
/// #[tokio::main]
/// async fn main() -> tapscan_hardware::Result<()> {
///     let (mut radio, handle) = MockNfc::new();
///
///     handle.present_tag(RawTagRecord::new().with_id("04A1B2C3")).await?;
///
///     radio.request_exclusive_access(TechnologyKind::NfcA).await?;
///     let raw = radio.read_raw_tag().await?;
///     radio.release_exclusive_access().await?;
///
///     assert_eq!(raw.unwrap().id.as_deref(), Some("04A1B2C3"));
///     assert_eq!(handle.stats().releases, 1);
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockNfc {
    /// Channel receiver for tag events
    event_rx: mpsc::Receiver<TagEvent>,

    /// Device name
    name: String,

    /// Probe behaviour
    support: MockSupport,

    /// Make `initialize_session` fail
    fail_initialization: bool,

    /// Make `release_exclusive_access` fail
    fail_release: bool,

    /// Tag captured when access was granted (`None` for an empty read)
    pending: Option<RawTagRecord>,

    /// Counters shared with the handle
    counters: Arc<Counters>,
}

impl MockNfc {
    /// Create a supported mock radio with the default name.
    ///
    /// Returns a tuple of (MockNfc, MockNfcHandle) where the handle
    /// can be used to simulate tag presentations.
    pub fn new() -> (Self, MockNfcHandle) {
        Self::builder().build()
    }

    /// Create a builder for configuring failure behaviour.
    ///
    /// # Examples
    ///
    /// ```
    /// use tapscan_hardware::mock::{MockNfc, MockSupport};
    ///
    /// let (radio, handle) = MockNfc::builder()
    ///     .name("Phone NFC")
    ///     .support(MockSupport::NotSupported)
    ///     .build();
    /// assert_eq!(handle.name(), "Phone NFC");
    /// ```
    pub fn builder() -> MockNfcBuilder {
        MockNfcBuilder::default()
    }

    /// Get the device name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl NfcHardware for MockNfc {
    async fn is_supported(&mut self) -> Result<bool> {
        self.counters.support_probes.fetch_add(1, Ordering::SeqCst);

        match self.support {
            MockSupport::Supported => Ok(true),
            MockSupport::NotSupported => Ok(false),
            MockSupport::ProbeFails => Err(HardwareError::unsupported("NFC capability query")),
            MockSupport::Hangs => std::future::pending().await,
        }
    }

    async fn initialize_session(&mut self) -> Result<()> {
        self.counters.initializations.fetch_add(1, Ordering::SeqCst);

        if self.fail_initialization {
            return Err(HardwareError::initialization_failed(format!(
                "{} adapter is disabled",
                self.name
            )));
        }
        Ok(())
    }

    async fn request_exclusive_access(&mut self, _technology: TechnologyKind) -> Result<()> {
        self.counters.requests.fetch_add(1, Ordering::SeqCst);

        if self.counters.held.load(Ordering::SeqCst) {
            return Err(HardwareError::exclusive_access(
                "another technology request is active",
            ));
        }

        let event = self
            .event_rx
            .recv()
            .await
            .ok_or_else(|| HardwareError::disconnected("NFC event channel closed"))?;

        match event {
            TagEvent::Present(raw) => {
                self.pending = Some(raw);
                self.counters.held.store(true, Ordering::SeqCst);
                Ok(())
            }
            TagEvent::Empty => {
                self.pending = None;
                self.counters.held.store(true, Ordering::SeqCst);
                Ok(())
            }
            TagEvent::Fail(message) => Err(HardwareError::communication(message)),
        }
    }

    async fn read_raw_tag(&mut self) -> Result<Option<RawTagRecord>> {
        self.counters.reads.fetch_add(1, Ordering::SeqCst);

        if !self.counters.held.load(Ordering::SeqCst) {
            return Err(HardwareError::tag_read("exclusive access not held"));
        }
        Ok(self.pending.take())
    }

    async fn release_exclusive_access(&mut self) -> Result<()> {
        self.counters.releases.fetch_add(1, Ordering::SeqCst);
        self.counters.held.store(false, Ordering::SeqCst);
        self.pending = None;

        if self.fail_release {
            return Err(HardwareError::communication("technology release failed"));
        }
        Ok(())
    }
}

/// Builder for [`MockNfc`].
#[derive(Debug, Clone)]
pub struct MockNfcBuilder {
    name: String,
    support: MockSupport,
    fail_initialization: bool,
    fail_release: bool,
}

impl Default for MockNfcBuilder {
    fn default() -> Self {
        Self {
            name: "Mock NFC Radio".to_string(),
            support: MockSupport::Supported,
            fail_initialization: false,
            fail_release: false,
        }
    }
}

impl MockNfcBuilder {
    /// Set the device name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set how the capability probe answers.
    pub fn support(mut self, support: MockSupport) -> Self {
        self.support = support;
        self
    }

    /// Make session initialization fail.
    pub fn fail_initialization(mut self) -> Self {
        self.fail_initialization = true;
        self
    }

    /// Make every release report an error (access is still dropped).
    pub fn fail_release(mut self) -> Self {
        self.fail_release = true;
        self
    }

    /// Build the radio and its controlling handle.
    pub fn build(self) -> (MockNfc, MockNfcHandle) {
        let (event_tx, event_rx) = mpsc::channel(32);
        let counters = Arc::new(Counters::default());

        let radio = MockNfc {
            event_rx,
            name: self.name.clone(),
            support: self.support,
            fail_initialization: self.fail_initialization,
            fail_release: self.fail_release,
            pending: None,
            counters: Arc::clone(&counters),
        };

        let handle = MockNfcHandle {
            event_tx,
            name: self.name,
            counters,
        };

        (radio, handle)
    }
}

/// Internal event type for the mock radio.
#[derive(Debug, Clone)]
enum TagEvent {
    Present(RawTagRecord),
    Empty,
    Fail(String),
}

#[derive(Debug, Default)]
struct Counters {
    support_probes: AtomicUsize,
    initializations: AtomicUsize,
    requests: AtomicUsize,
    reads: AtomicUsize,
    releases: AtomicUsize,
    held: AtomicBool,
}

/// Snapshot of the calls a [`MockNfc`] has received.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MockNfcStats {
    /// Number of `is_supported` calls.
    pub support_probes: usize,

    /// Number of `initialize_session` calls.
    pub initializations: usize,

    /// Number of `request_exclusive_access` calls.
    pub requests: usize,

    /// Number of `read_raw_tag` calls.
    pub reads: usize,

    /// Number of `release_exclusive_access` calls.
    pub releases: usize,

    /// Whether exclusive access is currently granted.
    pub held: bool,
}

impl MockNfcStats {
    /// Requests not yet matched by a release.
    pub fn outstanding_requests(&self) -> usize {
        self.requests.saturating_sub(self.releases)
    }
}

/// Handle for controlling a [`MockNfc`].
///
/// Clones share the same event channel and counters.
#[derive(Debug, Clone)]
pub struct MockNfcHandle {
    /// Channel sender for tag events
    event_tx: mpsc::Sender<TagEvent>,

    /// Device name
    name: String,

    /// Counters shared with the radio
    counters: Arc<Counters>,
}

impl MockNfcHandle {
    /// Bring a tag into the field.
    ///
    /// # Errors
    ///
    /// Returns an error if the radio has been dropped.
    pub async fn present_tag(&self, raw: RawTagRecord) -> Result<()> {
        self.send(TagEvent::Present(raw)).await
    }

    /// Bring a tag into the field that yields no data when read.
    ///
    /// # Errors
    ///
    /// Returns an error if the radio has been dropped.
    pub async fn present_empty_tag(&self) -> Result<()> {
        self.send(TagEvent::Empty).await
    }

    /// Make the next pending access request fail with `message`.
    ///
    /// # Errors
    ///
    /// Returns an error if the radio has been dropped.
    pub async fn fail_next_request(&self, message: impl Into<String>) -> Result<()> {
        self.send(TagEvent::Fail(message.into())).await
    }

    /// Take a snapshot of the call counters.
    pub fn stats(&self) -> MockNfcStats {
        MockNfcStats {
            support_probes: self.counters.support_probes.load(Ordering::SeqCst),
            initializations: self.counters.initializations.load(Ordering::SeqCst),
            requests: self.counters.requests.load(Ordering::SeqCst),
            reads: self.counters.reads.load(Ordering::SeqCst),
            releases: self.counters.releases.load(Ordering::SeqCst),
            held: self.counters.held.load(Ordering::SeqCst),
        }
    }

    /// Whether exclusive access is currently granted.
    pub fn is_held(&self) -> bool {
        self.counters.held.load(Ordering::SeqCst)
    }

    /// Get the device name.
    pub fn name(&self) -> &str {
        &self.name
    }

    async fn send(&self, event: TagEvent) -> Result<()> {
        self.event_tx
            .send(event)
            .await
            .map_err(|_| HardwareError::disconnected("NFC event channel closed"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn sample_tag() -> RawTagRecord {
        RawTagRecord::new()
            .with_id("04A1B2C3")
            .with_technology(TechnologyKind::NfcA)
            .with_tag_type("ISO14443")
    }

    #[tokio::test]
    async fn test_mock_nfc_present_and_read() {
        let (mut radio, handle) = MockNfc::new();

        let presenter = handle.clone();
        tokio::spawn(async move {
            presenter.present_tag(sample_tag()).await.unwrap();
        });

        radio
            .request_exclusive_access(TechnologyKind::NfcA)
            .await
            .unwrap();
        assert!(handle.is_held());

        let raw = radio.read_raw_tag().await.unwrap().unwrap();
        assert_eq!(raw.id.as_deref(), Some("04A1B2C3"));

        radio.release_exclusive_access().await.unwrap();
        assert!(!handle.is_held());

        let stats = handle.stats();
        assert_eq!(stats.requests, 1);
        assert_eq!(stats.reads, 1);
        assert_eq!(stats.releases, 1);
        assert_eq!(stats.outstanding_requests(), 0);
    }

    #[tokio::test]
    async fn test_mock_nfc_empty_tag() {
        let (mut radio, handle) = MockNfc::new();
        handle.present_empty_tag().await.unwrap();

        radio
            .request_exclusive_access(TechnologyKind::IsoDep)
            .await
            .unwrap();
        assert_eq!(radio.read_raw_tag().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_mock_nfc_request_failure() {
        let (mut radio, handle) = MockNfc::new();
        handle.fail_next_request("Tag was lost").await.unwrap();

        let err = radio
            .request_exclusive_access(TechnologyKind::IsoDep)
            .await
            .unwrap_err();
        assert!(matches!(err, HardwareError::CommunicationError { .. }));
        assert!(!handle.is_held());
    }

    #[tokio::test]
    async fn test_mock_nfc_read_without_access() {
        let (mut radio, _handle) = MockNfc::new();
        let err = radio.read_raw_tag().await.unwrap_err();
        assert!(matches!(err, HardwareError::TagReadError { .. }));
    }

    #[tokio::test]
    async fn test_mock_nfc_second_request_while_held() {
        let (mut radio, handle) = MockNfc::new();
        handle.present_tag(sample_tag()).await.unwrap();

        radio
            .request_exclusive_access(TechnologyKind::NfcA)
            .await
            .unwrap();
        let err = radio
            .request_exclusive_access(TechnologyKind::NfcA)
            .await
            .unwrap_err();
        assert!(matches!(err, HardwareError::ExclusiveAccess { .. }));
    }

    #[tokio::test]
    async fn test_mock_nfc_dropped_request_keeps_event() {
        let (mut radio, handle) = MockNfc::new();

        let pending = tokio::time::timeout(
            Duration::from_millis(10),
            radio.request_exclusive_access(TechnologyKind::NfcA),
        )
        .await;
        assert!(pending.is_err());
        assert!(!handle.is_held());

        handle.present_tag(sample_tag()).await.unwrap();
        radio
            .request_exclusive_access(TechnologyKind::NfcA)
            .await
            .unwrap();
        assert!(handle.is_held());
    }

    #[tokio::test]
    async fn test_mock_nfc_release_is_always_safe() {
        let (mut radio, handle) = MockNfc::new();
        radio.release_exclusive_access().await.unwrap();
        radio.release_exclusive_access().await.unwrap();
        assert_eq!(handle.stats().releases, 2);
    }

    #[tokio::test]
    async fn test_mock_nfc_release_failure_still_drops_access() {
        let (mut radio, handle) = MockNfc::builder().fail_release().build();
        handle.present_tag(sample_tag()).await.unwrap();

        radio
            .request_exclusive_access(TechnologyKind::NfcA)
            .await
            .unwrap();
        assert!(radio.release_exclusive_access().await.is_err());
        assert!(!handle.is_held());
    }

    #[tokio::test]
    async fn test_mock_nfc_support_behaviours() {
        let (mut radio, _) = MockNfc::new();
        assert!(radio.is_supported().await.unwrap());

        let (mut radio, _) = MockNfc::builder()
            .support(MockSupport::NotSupported)
            .build();
        assert!(!radio.is_supported().await.unwrap());

        let (mut radio, handle) = MockNfc::builder()
            .support(MockSupport::ProbeFails)
            .build();
        assert!(radio.is_supported().await.is_err());
        assert_eq!(handle.stats().support_probes, 1);

        let (mut radio, handle) = MockNfc::builder().support(MockSupport::Hangs).build();
        let hung =
            tokio::time::timeout(Duration::from_millis(20), radio.is_supported()).await;
        assert!(hung.is_err());
        assert_eq!(handle.stats().support_probes, 1);
    }

    #[tokio::test]
    async fn test_mock_nfc_initialization_failure() {
        let (mut radio, handle) = MockNfc::builder()
            .name("Phone NFC")
            .fail_initialization()
            .build();

        let err = radio.initialize_session().await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Initialization failed: Phone NFC adapter is disabled"
        );
        assert_eq!(handle.stats().initializations, 1);
    }

    #[tokio::test]
    async fn test_mock_nfc_handle_after_radio_dropped() {
        let (radio, handle) = MockNfc::new();
        drop(radio);

        let err = handle.present_tag(sample_tag()).await.unwrap_err();
        assert!(matches!(err, HardwareError::Disconnected { .. }));
    }
}
