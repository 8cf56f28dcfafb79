//! Scan lifecycle state machine.
//!
//! Enforces the legal phase graph and keeps a bounded history of
//! transitions for diagnostics.
//!
//! # Valid Transitions
//!
//! - Uninitialized → CheckingSupport → Idle | Unsupported
//! - Idle → Scanning → Success | Failed | Idle
//! - Success → Scanning, Failed → Scanning
//!
//! Teardown leaves the graph through [`StateMachine::reset`], which forces
//! the machine back to `Uninitialized` from any phase.
//!
//! # Examples
//!
//! ```
//! use tapscan_controller::StateMachine;
//! use tapscan_core::ScanPhase;
//!
//! let mut machine = StateMachine::new(16);
//! machine.transition_to(ScanPhase::CheckingSupport).unwrap();
//! machine.transition_to(ScanPhase::Idle).unwrap();
//!
//! assert!(machine.transition_to(ScanPhase::Success).is_err());
//! assert_eq!(machine.current_phase(), ScanPhase::Idle);
//! ```

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tapscan_core::constants::DEFAULT_HISTORY_SIZE;
use tapscan_core::{Error, Result, ScanPhase};

/// A single phase change with its wall-clock time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseTransition {
    /// Phase left.
    pub from: ScanPhase,

    /// Phase entered.
    pub to: ScanPhase,

    /// When the change happened.
    pub timestamp: DateTime<Utc>,
}

impl PhaseTransition {
    /// Create a transition record stamped with the current time.
    pub fn new(from: ScanPhase, to: ScanPhase) -> Self {
        Self {
            from,
            to,
            timestamp: Utc::now(),
        }
    }
}

/// Phase tracker for one scan controller.
///
/// Not synchronized; the controller task owns it exclusively.
#[derive(Debug)]
pub struct StateMachine {
    current_phase: ScanPhase,
    history: VecDeque<PhaseTransition>,
    max_history: usize,
}

impl StateMachine {
    /// Create a machine in `Uninitialized` keeping at most `max_history`
    /// transitions.
    pub fn new(max_history: usize) -> Self {
        let max_history = max_history.max(1);
        Self {
            current_phase: ScanPhase::Uninitialized,
            history: VecDeque::with_capacity(max_history),
            max_history,
        }
    }

    pub fn current_phase(&self) -> ScanPhase {
        self.current_phase
    }

    /// Recent transitions, oldest first.
    pub fn history(&self) -> &VecDeque<PhaseTransition> {
        &self.history
    }

    /// The last `count` transitions, oldest first.
    pub fn last_transitions(&self, count: usize) -> Vec<PhaseTransition> {
        let skip = self.history.len().saturating_sub(count);
        self.history.iter().skip(skip).cloned().collect()
    }

    /// Move to `target` if the phase graph allows it.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidStateTransition` and leaves the machine
    /// unchanged if the move is illegal.
    pub fn transition_to(&mut self, target: ScanPhase) -> Result<PhaseTransition> {
        if !self.current_phase.can_transition_to(&target) {
            return Err(Error::InvalidStateTransition {
                from: self.current_phase.to_string(),
                to: target.to_string(),
            });
        }

        let transition = PhaseTransition::new(self.current_phase, target);
        self.apply(transition.clone());
        Ok(transition)
    }

    /// Force the machine back to `Uninitialized`, bypassing the graph.
    pub fn reset(&mut self) -> PhaseTransition {
        let transition = PhaseTransition::new(self.current_phase, ScanPhase::Uninitialized);
        self.apply(transition.clone());
        transition
    }

    fn apply(&mut self, transition: PhaseTransition) {
        self.current_phase = transition.to;

        self.history.push_back(transition);
        while self.history.len() > self.max_history {
            self.history.pop_front();
        }
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_SIZE)
    }
}
