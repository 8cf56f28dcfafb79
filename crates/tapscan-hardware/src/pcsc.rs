//! PC/SC contactless reader driver.
//!
//! Exposes a desktop contactless reader (ACR122U and friends) through the
//! [`NfcHardware`] trait:
//!
//! | Operation | PC/SC mapping |
//! |---|---|
//! | `is_supported` | establish a context and find a reader |
//! | `request_exclusive_access` | wait for `PRESENT`, then connect with `ShareMode::Exclusive` |
//! | `read_raw_tag` | reader "get UID" pseudo-APDU `FF CA 00 00 00` plus ATR inspection |
//! | `release_exclusive_access` | disconnect leaving the card powered |
//!
//! Every PC/SC call runs on Tokio's blocking pool. If the request future is
//! dropped while waiting for a tag, the `SCardGetStatusChange` wait is
//! aborted through `SCardCancel` so the thread does not linger.

use std::ffi::CString;
use std::fmt;

use pcsc::{Card, Context, Disposition, Protocols, ReaderState, Scope, ShareMode, State};
use tapscan_core::TechnologyKind;
use tracing::{debug, info};

use crate::traits::NfcHardware;
use crate::types::{RawTagRecord, uid_hex};
use crate::{HardwareError, Result};

/// Reader pseudo-APDU returning the UID of the card in the field.
const GET_UID_APDU: [u8; 5] = [0xFF, 0xCA, 0x00, 0x00, 0x00];

/// Status word for a successful APDU.
const SW_OK: [u8; 2] = [0x90, 0x00];

impl From<pcsc::Error> for HardwareError {
    fn from(error: pcsc::Error) -> Self {
        match error {
            pcsc::Error::Cancelled => HardwareError::Cancelled,
            pcsc::Error::NoService | pcsc::Error::NoReadersAvailable => {
                HardwareError::unsupported(error.to_string())
            }
            pcsc::Error::RemovedCard | pcsc::Error::ReaderUnavailable => {
                HardwareError::disconnected(error.to_string())
            }
            other => HardwareError::communication(other.to_string()),
        }
    }
}

/// PC/SC contactless reader.
pub struct PcscNfc {
    preferred_reader: Option<String>,
    context: Option<Context>,
    reader: Option<CString>,
    card: Option<Card>,
    atr: Vec<u8>,
}

impl PcscNfc {
    /// Use the first reader reported by the PC/SC service.
    pub fn new() -> Self {
        Self {
            preferred_reader: None,
            context: None,
            reader: None,
            card: None,
            atr: Vec::new(),
        }
    }

    /// Use the first reader whose name contains `name`.
    pub fn with_reader(name: impl Into<String>) -> Self {
        Self {
            preferred_reader: Some(name.into()),
            ..Self::new()
        }
    }

    /// Name of the selected reader, once probed.
    pub fn reader_name(&self) -> Option<String> {
        self.reader
            .as_ref()
            .map(|reader| reader.to_string_lossy().into_owned())
    }

    fn session(&self) -> Result<(Context, CString)> {
        match (&self.context, &self.reader) {
            (Some(context), Some(reader)) => Ok((context.clone(), reader.clone())),
            _ => Err(HardwareError::initialization_failed(
                "PC/SC session not initialized",
            )),
        }
    }
}

impl Default for PcscNfc {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PcscNfc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PcscNfc")
            .field("reader", &self.reader_name())
            .field("connected", &self.card.is_some())
            .finish()
    }
}

impl NfcHardware for PcscNfc {
    async fn is_supported(&mut self) -> Result<bool> {
        let preferred = self.preferred_reader.clone();
        let Some((context, reader)) = blocking(move || find_reader(preferred.as_deref())).await?
        else {
            return Ok(false);
        };

        self.context = Some(context);
        self.reader = Some(reader);
        Ok(true)
    }

    async fn initialize_session(&mut self) -> Result<()> {
        let (context, reader) = self.session()?;
        context.is_valid()?;
        info!(reader = %reader.to_string_lossy(), "PC/SC reader ready");
        Ok(())
    }

    async fn request_exclusive_access(&mut self, technology: TechnologyKind) -> Result<()> {
        if self.card.is_some() {
            return Err(HardwareError::exclusive_access(
                "reader already connected to a card",
            ));
        }

        let (context, reader) = self.session()?;
        debug!(%technology, "Waiting for card");

        let mut guard = CancelOnDrop::new(context.clone());
        let (card, atr) = blocking(move || {
            let atr = wait_for_card(&context, reader.clone())?;
            let card = context.connect(&reader, ShareMode::Exclusive, Protocols::ANY)?;
            Ok((card, atr))
        })
        .await?;
        guard.disarm();

        self.card = Some(card);
        self.atr = atr;
        Ok(())
    }

    async fn read_raw_tag(&mut self) -> Result<Option<RawTagRecord>> {
        let card = self
            .card
            .take()
            .ok_or_else(|| HardwareError::tag_read("exclusive access not held"))?;

        // The card travels to the blocking thread and back. If this future
        // is dropped mid-transmit, the card is disconnected when the thread
        // finishes.
        let (card, uid) = blocking(move || {
            let mut buffer = [0u8; pcsc::MAX_BUFFER_SIZE];
            let uid = card
                .transmit(&GET_UID_APDU, &mut buffer)
                .map_err(HardwareError::from)
                .and_then(uid_from_response);
            Ok((card, uid))
        })
        .await?;
        self.card = Some(card);

        let (tag_type, technologies) = describe_atr(&self.atr);
        let mut raw = RawTagRecord::new().with_tech_types(technologies);
        if let Some(tag_type) = tag_type {
            raw = raw.with_tag_type(tag_type);
        }
        if let Some(uid) = uid? {
            raw = raw.with_id(uid);
        }
        Ok(Some(raw))
    }

    async fn release_exclusive_access(&mut self) -> Result<()> {
        self.atr.clear();
        let Some(card) = self.card.take() else {
            return Ok(());
        };

        blocking(move || {
            card.disconnect(Disposition::LeaveCard)
                .map_err(|(_, e)| HardwareError::from(e))
        })
        .await
    }
}

/// Run a PC/SC call on the blocking pool.
async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| HardwareError::other(format!("PC/SC task failed: {e}")))?
}

/// Establish a context and pick the reader to use.
///
/// `Ok(None)` means the service or a matching reader is missing.
fn find_reader(preferred: Option<&str>) -> Result<Option<(Context, CString)>> {
    let context = match Context::establish(Scope::User) {
        Ok(context) => context,
        Err(pcsc::Error::NoService) => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let readers = match context.list_readers_owned() {
        Ok(readers) => readers,
        Err(pcsc::Error::NoReadersAvailable) => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let reader = readers.into_iter().find(|reader| {
        preferred.is_none_or(|wanted| reader.to_string_lossy().contains(wanted))
    });
    Ok(reader.map(|reader| (context, reader)))
}

/// Aborts a blocking status-change wait unless disarmed.
struct CancelOnDrop {
    context: Context,
    armed: bool,
}

impl CancelOnDrop {
    fn new(context: Context) -> Self {
        Self {
            context,
            armed: true,
        }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        if self.armed {
            let _ = self.context.cancel();
        }
    }
}

/// Block until a responsive card is in the field and return its ATR.
fn wait_for_card(context: &Context, reader: CString) -> Result<Vec<u8>> {
    let mut states = [ReaderState::new(reader, State::UNAWARE)];

    loop {
        context.get_status_change(None, &mut states)?;

        let event = states[0].event_state();
        if event.contains(State::PRESENT) && !event.contains(State::MUTE) {
            return Ok(states[0].atr().to_vec());
        }
        states[0].sync_current_state();
    }
}

/// Extract the UID from a "get UID" response (`data || SW1 SW2`).
///
/// Returns `Ok(None)` when the reader refuses the command.
fn uid_from_response(response: &[u8]) -> Result<Option<String>> {
    let Some(split) = response.len().checked_sub(2) else {
        return Err(HardwareError::invalid_data(format!(
            "response too short: {} bytes",
            response.len()
        )));
    };

    let (data, status) = response.split_at(split);
    if status != SW_OK || data.is_empty() {
        debug!(sw = %uid_hex(status), "Reader did not return a UID");
        return Ok(None);
    }
    Ok(Some(uid_hex(data)))
}

/// Derive a type label and technology list from a contactless ATR.
///
/// Storage cards carry a PC/SC part 3 descriptor (`80 4F 0C A0 00 00 03 06`
/// followed by the standard byte and a two-byte card name); everything
/// else is an ISO 14443-4 smart card.
fn describe_atr(atr: &[u8]) -> (Option<&'static str>, Vec<&'static str>) {
    const PART3_RID: [u8; 8] = [0x80, 0x4F, 0x0C, 0xA0, 0x00, 0x00, 0x03, 0x06];

    if atr.is_empty() {
        return (None, Vec::new());
    }

    let Some(descriptor) = atr.get(4..15).filter(|d| d.starts_with(&PART3_RID)) else {
        return (Some("ISO14443-4"), vec!["IsoDep"]);
    };

    let standard = descriptor[8];
    let card_name = [descriptor[9], descriptor[10]];

    match (standard, card_name) {
        (0x03, [0x00, 0x01]) | (0x03, [0x00, 0x02]) => {
            (Some("ISO14443A"), vec!["NfcA", "MifareClassic"])
        }
        (0x03, [0x00, 0x03]) => (Some("ISO14443A"), vec!["NfcA", "MifareUltralight"]),
        (0x03, _) => (Some("ISO14443A"), vec!["NfcA"]),
        (0x11, _) => (Some("FeliCa"), vec!["NfcF"]),
        (0x0B, _) => (Some("ISO15693"), vec!["NfcV"]),
        _ => (None, Vec::new()),
    }
}
