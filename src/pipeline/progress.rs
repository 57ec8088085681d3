//! Progress reporting
//!
//! The pipeline reports through a [`ProgressSink`]. Any `FnMut(ProgressUpdate)`
//! closure is a sink; the worker forwards updates over a channel.

use serde::Serialize;

use super::state::PipelineState;

/// A completed-stage checkpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProgressUpdate {
    /// 20, 40, 60, 80 or 100
    pub percent: u8,
    /// The stage that just finished
    pub stage: PipelineState,
}

/// Observer for pipeline progress
pub trait ProgressSink {
    fn on_progress(&mut self, update: ProgressUpdate);

    /// Called on every state change, including `Done` and `Error`
    fn on_state(&mut self, _state: PipelineState) {}
}

impl<F> ProgressSink for F
where
    F: FnMut(ProgressUpdate),
{
    fn on_progress(&mut self, update: ProgressUpdate) {
        self(update)
    }
}

/// Sink that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn on_progress(&mut self, _update: ProgressUpdate) {}
}

/// Sink that keeps every update and state change in memory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordingSink {
    pub updates: Vec<ProgressUpdate>,
    pub states: Vec<PipelineState>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn percentages(&self) -> Vec<u8> {
        self.updates.iter().map(|u| u.percent).collect()
    }
}

impl ProgressSink for RecordingSink {
    fn on_progress(&mut self, update: ProgressUpdate) {
        self.updates.push(update);
    }

    fn on_state(&mut self, state: PipelineState) {
        self.states.push(state);
    }
}
