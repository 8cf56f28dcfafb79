//! Scan controller actor.
//!
//! A [`ScanController`] is a cheap handle to a Tokio task that owns the
//! radio and the lifecycle state. Commands are applied one at a time in the
//! order they arrive; state is published through a `watch` channel and each
//! phase change is also broadcast as a [`PhaseTransition`].
//!
//! While an attempt is in flight the task waits on three things at once: the
//! attempt itself, the command channel and the optional attempt timeout.
//! Whichever finishes first ends the attempt, and every ending goes through
//! the same release step, so exclusive access is never left held.
//!
//! # Examples
//!
//! ```
//! use tapscan_controller::{ControllerConfig, ScanController, StartOutcome};
//! use tapscan_core::ScanPhase;
//! use tapscan_hardware::mock::MockNfc;
//! use tapscan_hardware::RawTagRecord;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let (radio, tags) = MockNfc::new();
//! let controller = ScanController::spawn(radio, ControllerConfig::default())?;
//!
//! controller.wait_for(|s| s.phase() == ScanPhase::Idle).await;
//! assert_eq!(controller.start().await, StartOutcome::Started);
//!
//! tags.present_tag(RawTagRecord::new().with_id("04A1B2C3")).await?;
//! let state = controller.wait_for(|s| s.phase() == ScanPhase::Success).await;
//! assert_eq!(state.result().unwrap().masked_number, "**** **** **** B2C3");
//!
//! controller.teardown().await;
//! # Ok(())
//! # }
//! ```

use std::collections::VecDeque;
use std::future;
use std::task::Poll;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tapscan_core::constants::TRANSITION_CHANNEL_CAPACITY;
use tapscan_core::{AttemptId, ScanPhase, ScanState, TechnologyKind};
use tapscan_hardware::{HardwareError, NfcHardware, RawTagRecord};
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::config::ControllerConfig;
use crate::detector::{self, SupportStatus};
use crate::error::ScanError;
use crate::parser::{self, ParseError};
use crate::state_machine::{PhaseTransition, StateMachine};

/// Reply to a `start` or `retry` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// A new attempt is waiting for a tag.
    Started,

    /// An attempt was already in flight; nothing changed.
    AlreadyScanning,

    /// The device cannot scan; nothing changed.
    Unsupported,

    /// The controller has been torn down.
    Disposed,
}

#[derive(Debug)]
enum Command {
    Start { reply: oneshot::Sender<StartOutcome> },
    Cancel { reply: oneshot::Sender<()> },
    History {
        count: Option<usize>,
        reply: oneshot::Sender<Vec<PhaseTransition>>,
    },
    Teardown { reply: oneshot::Sender<()> },
}

/// Handle to a running scan controller.
///
/// Clones share the same controller. Dropping the last handle tears the
/// controller down.
#[derive(Debug, Clone)]
pub struct ScanController {
    commands: mpsc::Sender<Command>,
    state: watch::Receiver<ScanState>,
    transitions: broadcast::Sender<PhaseTransition>,
}

impl ScanController {
    /// Spawn a controller task owning `hardware`.
    ///
    /// The controller is in `CheckingSupport` when this returns; detection
    /// runs on the spawned task.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if `config` does not validate.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn spawn<H>(hardware: H, config: ControllerConfig) -> tapscan_core::Result<Self>
    where
        H: NfcHardware + 'static,
    {
        config.validate()?;

        let (command_tx, command_rx) = mpsc::channel(config.command_buffer);
        let (state_tx, state_rx) = watch::channel(ScanState::uninitialized());
        let (transition_tx, _) = broadcast::channel(TRANSITION_CHANNEL_CAPACITY);

        let mut actor = ScanActor {
            hardware,
            machine: StateMachine::new(config.history_size),
            config,
            inbox: Inbox::new(command_rx),
            state: state_tx,
            transitions: transition_tx.clone(),
        };
        actor.publish(ScanState::checking_support());

        tokio::spawn(actor.run());

        Ok(Self {
            commands: command_tx,
            state: state_rx,
            transitions: transition_tx,
        })
    }

    /// Begin an attempt.
    ///
    /// When this returns [`StartOutcome::Started`], the technology request
    /// has already been issued to the radio. A start sent while support is
    /// still being checked is answered once detection finishes.
    pub async fn start(&self) -> StartOutcome {
        let (reply, outcome) = oneshot::channel();
        if self.commands.send(Command::Start { reply }).await.is_err() {
            return StartOutcome::Disposed;
        }
        outcome.await.unwrap_or(StartOutcome::Disposed)
    }

    /// Begin a new attempt after `Success` or `Failed`. Same as [`start`].
    ///
    /// [`start`]: ScanController::start
    pub async fn retry(&self) -> StartOutcome {
        self.start().await
    }

    /// Abort the in-flight attempt and return to `Idle`.
    ///
    /// No-op outside `Scanning`.
    pub async fn cancel(&self) {
        let (reply, done) = oneshot::channel();
        if self.commands.send(Command::Cancel { reply }).await.is_ok() {
            let _ = done.await;
        }
    }

    /// Stop the controller, releasing the radio if an attempt is in flight.
    ///
    /// Also interrupts support detection. Returns once the controller is
    /// back in `Uninitialized`. Later commands are ignored.
    pub async fn teardown(&self) {
        let (reply, done) = oneshot::channel();
        if self.commands.send(Command::Teardown { reply }).await.is_ok() {
            let _ = done.await;
        }
    }

    /// Recorded phase transitions, oldest first.
    ///
    /// Bounded by `ControllerConfig::history_size`. Empty once the
    /// controller has been torn down.
    pub async fn history(&self) -> Vec<PhaseTransition> {
        self.request_history(None).await
    }

    /// The last `count` recorded phase transitions, oldest first.
    pub async fn last_transitions(&self, count: usize) -> Vec<PhaseTransition> {
        self.request_history(Some(count)).await
    }

    async fn request_history(&self, count: Option<usize>) -> Vec<PhaseTransition> {
        let (reply, history) = oneshot::channel();
        if self.commands.send(Command::History { count, reply }).await.is_err() {
            return Vec::new();
        }
        history.await.unwrap_or_default()
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> ScanState {
        self.state.borrow().clone()
    }

    /// Current phase, without cloning the rest of the state.
    pub fn phase(&self) -> ScanPhase {
        self.state.borrow().phase()
    }

    /// Watch every state published from now on.
    pub fn subscribe(&self) -> watch::Receiver<ScanState> {
        self.state.clone()
    }

    /// Receive each phase transition from now on.
    pub fn subscribe_transitions(&self) -> broadcast::Receiver<PhaseTransition> {
        self.transitions.subscribe()
    }

    /// Wait until the published state satisfies `predicate`.
    ///
    /// Returns the last published state if the controller stops first.
    pub async fn wait_for<F>(&self, predicate: F) -> ScanState
    where
        F: FnMut(&ScanState) -> bool,
    {
        let mut state = self.state.clone();
        if let Ok(matched) = state.wait_for(predicate).await {
            return matched.clone();
        }
        state.borrow().clone()
    }

    /// Whether the controller task has stopped accepting commands.
    pub fn is_disposed(&self) -> bool {
        self.commands.is_closed()
    }
}

/// Command queue with room for commands held back during detection.
struct Inbox {
    deferred: VecDeque<Command>,
    commands: mpsc::Receiver<Command>,
}

impl Inbox {
    fn new(commands: mpsc::Receiver<Command>) -> Self {
        Self {
            deferred: VecDeque::new(),
            commands,
        }
    }

    /// Next command, deferred ones first. Cancel safe.
    async fn recv(&mut self) -> Option<Command> {
        match self.deferred.pop_front() {
            Some(command) => Some(command),
            None => self.commands.recv().await,
        }
    }
}

fn history_snapshot(machine: &StateMachine, count: Option<usize>) -> Vec<PhaseTransition> {
    match count {
        Some(count) => machine.last_transitions(count),
        None => machine.history().iter().cloned().collect(),
    }
}

/// How support detection ended.
enum Detection {
    Done(SupportStatus),
    Teardown(Option<oneshot::Sender<()>>),
}

/// How one attempt ended.
enum AttemptEnd {
    Read(Result<(Option<RawTagRecord>, DateTime<Utc>), HardwareError>),
    Cancelled(oneshot::Sender<()>),
    TimedOut,
    Teardown(Option<oneshot::Sender<()>>),
}

enum Flow {
    Continue,
    Stop(Option<oneshot::Sender<()>>),
}

struct ScanActor<H> {
    hardware: H,
    config: ControllerConfig,
    machine: StateMachine,
    inbox: Inbox,
    state: watch::Sender<ScanState>,
    transitions: broadcast::Sender<PhaseTransition>,
}

impl<H: NfcHardware> ScanActor<H> {
    async fn run(mut self) {
        match detect_until_teardown(&mut self.hardware, &mut self.inbox, &self.machine).await {
            Detection::Done(SupportStatus::Supported) => self.publish(ScanState::idle()),
            Detection::Done(SupportStatus::Unsupported(reason)) => {
                debug!(%reason, "Contactless scanning unavailable");
                self.publish(ScanState::unsupported());
            }
            Detection::Teardown(reply) => {
                info!("Support detection aborted by teardown");
                self.finish(reply);
                return;
            }
        }

        let reply = loop {
            let Some(command) = self.inbox.recv().await else {
                debug!("All controller handles dropped");
                break None;
            };

            match command {
                Command::Start { reply } => {
                    if let Flow::Stop(teardown) = self.handle_start(reply).await {
                        break teardown;
                    }
                }
                Command::Cancel { reply } => {
                    debug!(phase = %self.machine.current_phase(), "Cancel ignored, no attempt in flight");
                    let _ = reply.send(());
                }
                Command::History { count, reply } => {
                    let _ = reply.send(history_snapshot(&self.machine, count));
                }
                Command::Teardown { reply } => break Some(reply),
            }
        };

        self.finish(reply);
    }

    fn finish(&mut self, reply: Option<oneshot::Sender<()>>) {
        self.shut_down();
        if let Some(reply) = reply {
            let _ = reply.send(());
        }
    }

    async fn handle_start(&mut self, reply: oneshot::Sender<StartOutcome>) -> Flow {
        let phase = self.machine.current_phase();
        if !phase.accepts_start() {
            let outcome = if phase.is_terminal() {
                StartOutcome::Unsupported
            } else {
                StartOutcome::AlreadyScanning
            };
            debug!(%phase, ?outcome, "Start ignored");
            let _ = reply.send(outcome);
            return Flow::Continue;
        }

        let attempt = AttemptId::new();
        self.run_attempt(reply)
            .instrument(info_span!("scan_attempt", %attempt))
            .await
    }

    async fn run_attempt(&mut self, started: oneshot::Sender<StartOutcome>) -> Flow {
        self.publish(ScanState::scanning());
        info!(technology = %self.config.technology, "Scan attempt started");

        let end = wait_for_tag(
            &mut self.hardware,
            &mut self.inbox,
            &self.machine,
            self.config.technology,
            self.config.attempt_timeout,
            started,
        )
        .await;

        if let Err(e) = self.hardware.release_exclusive_access().await {
            warn!(error = %ScanError::Release(e), "Exclusive access release failed");
        }

        match end {
            AttemptEnd::Read(Ok((Some(raw), scanned_at))) => match parser::parse(&raw, scanned_at) {
                Ok(summary) => {
                    info!(tag = %summary.masked_number, "Scan attempt succeeded");
                    self.publish(ScanState::success(summary));
                }
                Err(e) => self.fail(e.into()),
            },
            AttemptEnd::Read(Ok((None, _))) => self.fail(ParseError::MissingRecord.into()),
            AttemptEnd::Read(Err(e)) => self.fail(ScanError::Acquisition(e)),
            AttemptEnd::Cancelled(reply) => {
                info!("Scan attempt cancelled");
                self.publish(ScanState::idle());
                let _ = reply.send(());
            }
            AttemptEnd::TimedOut => {
                info!("Scan attempt timed out");
                self.publish(ScanState::idle());
            }
            AttemptEnd::Teardown(reply) => {
                info!("Scan attempt aborted by teardown");
                return Flow::Stop(reply);
            }
        }
        Flow::Continue
    }

    fn fail(&mut self, error: ScanError) {
        warn!(%error, "Scan attempt failed");
        let reason = error.failure_reason().unwrap_or_else(|| error.to_string());
        self.publish(ScanState::failed(reason));
    }

    fn shut_down(&mut self) {
        let transition = self.machine.reset();
        info!(from = %transition.from, "Scan controller torn down");
        let _ = self.transitions.send(transition);
        self.state.send_replace(ScanState::uninitialized());
    }

    fn publish(&mut self, state: ScanState) {
        match self.machine.transition_to(state.phase()) {
            Ok(transition) => {
                debug!(from = %transition.from, to = %transition.to, "Phase transition");
                let _ = self.transitions.send(transition);
                self.state.send_replace(state);
            }
            Err(e) => error!(error = %e, "Phase transition rejected"),
        }
    }
}

/// Run support detection while watching for teardown.
///
/// Start and cancel commands are deferred until detection finishes; history
/// requests are answered immediately.
async fn detect_until_teardown<H: NfcHardware>(
    hardware: &mut H,
    inbox: &mut Inbox,
    machine: &StateMachine,
) -> Detection {
    let detection = detector::detect(hardware);
    tokio::pin!(detection);

    loop {
        tokio::select! {
            biased;

            command = inbox.commands.recv() => match command {
                Some(Command::Teardown { reply }) => return Detection::Teardown(Some(reply)),
                Some(Command::History { count, reply }) => {
                    let _ = reply.send(history_snapshot(machine, count));
                }
                Some(command) => {
                    debug!("Command deferred until support detection finishes");
                    inbox.deferred.push_back(command);
                }
                None => return Detection::Teardown(None),
            },
            status = &mut detection => return Detection::Done(status),
        }
    }
}

/// Drive one attempt until it ends.
///
/// `started` is acknowledged after the attempt has been polled once, so the
/// technology request is already pending at the radio.
async fn wait_for_tag<H: NfcHardware>(
    hardware: &mut H,
    inbox: &mut Inbox,
    machine: &StateMachine,
    technology: TechnologyKind,
    timeout: Option<Duration>,
    started: oneshot::Sender<StartOutcome>,
) -> AttemptEnd {
    let attempt = acquire_and_read(hardware, technology);
    tokio::pin!(attempt);

    let first_poll = futures::poll!(attempt.as_mut());
    let _ = started.send(StartOutcome::Started);
    if let Poll::Ready(outcome) = first_poll {
        return AttemptEnd::Read(outcome);
    }

    let deadline = async move {
        match timeout {
            Some(limit) => tokio::time::sleep(limit).await,
            None => future::pending::<()>().await,
        }
    };
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            biased;

            command = inbox.recv() => match command {
                Some(Command::Start { reply }) => {
                    debug!("Start ignored, attempt already in flight");
                    let _ = reply.send(StartOutcome::AlreadyScanning);
                }
                Some(Command::History { count, reply }) => {
                    let _ = reply.send(history_snapshot(machine, count));
                }
                Some(Command::Cancel { reply }) => return AttemptEnd::Cancelled(reply),
                Some(Command::Teardown { reply }) => return AttemptEnd::Teardown(Some(reply)),
                None => return AttemptEnd::Teardown(None),
            },
            outcome = &mut attempt => return AttemptEnd::Read(outcome),
            () = &mut deadline => return AttemptEnd::TimedOut,
        }
    }
}

async fn acquire_and_read<H: NfcHardware>(
    hardware: &mut H,
    technology: TechnologyKind,
) -> Result<(Option<RawTagRecord>, DateTime<Utc>), HardwareError> {
    hardware.request_exclusive_access(technology).await?;
    let raw = hardware.read_raw_tag().await?;
    Ok((raw, Utc::now()))
}
