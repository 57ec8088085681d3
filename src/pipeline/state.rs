//! Pipeline State Machine
//!
//! A run walks `Idle → Decoding → EstimatingTempo → Stretching → Layering →
//! Encoding → Done` one step at a time. `Error` is terminal and reachable from
//! any non-terminal state.

use std::fmt;

use log::warn;
use serde::Serialize;
use thiserror::Error;

/// Stage of a single pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    /// Nothing has run yet (default state)
    #[default]
    Idle,
    Decoding,
    EstimatingTempo,
    Stretching,
    Layering,
    Encoding,
    /// The run produced output
    Done,
    /// The run failed; no further progress is reported
    Error,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineState::Idle => write!(f, "Idle"),
            PipelineState::Decoding => write!(f, "Decoding"),
            PipelineState::EstimatingTempo => write!(f, "EstimatingTempo"),
            PipelineState::Stretching => write!(f, "Stretching"),
            PipelineState::Layering => write!(f, "Layering"),
            PipelineState::Encoding => write!(f, "Encoding"),
            PipelineState::Done => write!(f, "Done"),
            PipelineState::Error => write!(f, "Error"),
        }
    }
}

impl PipelineState {
    /// The state that follows this one on a successful run
    pub fn next(&self) -> Option<PipelineState> {
        match self {
            PipelineState::Idle => Some(PipelineState::Decoding),
            PipelineState::Decoding => Some(PipelineState::EstimatingTempo),
            PipelineState::EstimatingTempo => Some(PipelineState::Stretching),
            PipelineState::Stretching => Some(PipelineState::Layering),
            PipelineState::Layering => Some(PipelineState::Encoding),
            PipelineState::Encoding => Some(PipelineState::Done),
            PipelineState::Done | PipelineState::Error => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Error)
    }

    /// Progress percentage reported once this processing state completes
    pub fn checkpoint(&self) -> Option<u8> {
        match self {
            PipelineState::Decoding => Some(20),
            PipelineState::EstimatingTempo => Some(40),
            PipelineState::Stretching => Some(60),
            PipelineState::Layering => Some(80),
            PipelineState::Encoding => Some(100),
            _ => None,
        }
    }

    pub fn can_transition_to(&self, to: PipelineState) -> bool {
        !self.is_terminal() && (to == PipelineState::Error || self.next() == Some(to))
    }
}

/// A transition the state machine refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Illegal pipeline transition: {from} -> {to}")]
pub struct IllegalTransition {
    pub from: PipelineState,
    pub to: PipelineState,
}

/// Tracks the state of one run and records every state it has visited
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateMachine {
    state: PipelineState,
    history: Vec<PipelineState>,
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl StateMachine {
    pub fn new() -> Self {
        Self {
            state: PipelineState::Idle,
            history: vec![PipelineState::Idle],
        }
    }

    #[inline]
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Every state visited so far, starting with `Idle`
    pub fn history(&self) -> &[PipelineState] {
        &self.history
    }

    /// Move to `to`, rejecting anything but the next step or `Error`
    pub fn transition(&mut self, to: PipelineState) -> Result<PipelineState, IllegalTransition> {
        if !self.state.can_transition_to(to) {
            warn!("Rejected pipeline transition {} -> {}", self.state, to);
            return Err(IllegalTransition {
                from: self.state,
                to,
            });
        }
        self.state = to;
        self.history.push(to);
        Ok(to)
    }

    /// Step to the next state of a successful run
    pub fn advance(&mut self) -> Result<PipelineState, IllegalTransition> {
        let to = self.state.next().unwrap_or(PipelineState::Done);
        self.transition(to)
    }

    /// Enter `Error`; a no-op once the machine is already terminal
    pub fn fail(&mut self) -> PipelineState {
        if !self.state.is_terminal() {
            self.state = PipelineState::Error;
            self.history.push(PipelineState::Error);
        }
        self.state
    }
}
