//! Background worker
//!
//! Runs a pipeline on its own thread so the caller stays responsive. State
//! changes, progress and the final result arrive as [`PipelineEvent`]s over a
//! `std::sync::mpsc` channel.

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use log::debug;

use super::{
    CancelToken, Pipeline, PipelineOutput, PipelineRequest, PipelineState, ProgressSink,
    ProgressUpdate,
};
use crate::engine::AudioDecoder;
use crate::error::{BeatshiftError, Result};

/// Message sent from the worker thread
#[derive(Debug)]
pub enum PipelineEvent {
    State(PipelineState),
    Progress(ProgressUpdate),
    /// Terminal: the run succeeded
    Finished(Box<PipelineOutput>),
    /// Terminal: the run failed
    Failed(BeatshiftError),
}

impl PipelineEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineEvent::Finished(_) | PipelineEvent::Failed(_))
    }
}

/// Forwards sink calls to the event channel
struct ChannelSink(Sender<PipelineEvent>);

impl ProgressSink for ChannelSink {
    fn on_progress(&mut self, update: ProgressUpdate) {
        // The receiver may already be gone; the run still finishes.
        let _ = self.0.send(PipelineEvent::Progress(update));
    }

    fn on_state(&mut self, state: PipelineState) {
        let _ = self.0.send(PipelineEvent::State(state));
    }
}

/// Handle to a pipeline running on a background thread
#[derive(Debug)]
pub struct PipelineHandle {
    events: Receiver<PipelineEvent>,
    cancel: CancelToken,
    thread: JoinHandle<()>,
}

/// Start `pipeline` on a background thread with a fresh cancellation token
///
/// # Errors
/// `Io` if the thread cannot be spawned.
pub fn spawn_pipeline<D>(pipeline: Pipeline<D>, request: PipelineRequest) -> Result<PipelineHandle>
where
    D: AudioDecoder + 'static,
{
    spawn_pipeline_with_cancel(pipeline, request, CancelToken::new())
}

/// Start `pipeline` on a background thread, stoppable through `cancel`
///
/// The handle keeps a clone of `cancel`, so either side may trigger it.
pub fn spawn_pipeline_with_cancel<D>(
    pipeline: Pipeline<D>,
    request: PipelineRequest,
    cancel: CancelToken,
) -> Result<PipelineHandle>
where
    D: AudioDecoder + 'static,
{
    let (tx, events) = mpsc::channel();
    let run_cancel = cancel.clone();

    let thread = thread::Builder::new()
        .name("beatshift-pipeline".to_string())
        .spawn(move || {
            let mut sink = ChannelSink(tx.clone());
            let event = match pipeline.run_with_cancel(request, &mut sink, &run_cancel) {
                Ok(output) => PipelineEvent::Finished(Box::new(output)),
                Err(err) => PipelineEvent::Failed(err),
            };
            let _ = tx.send(event);
        })?;

    debug!("Spawned pipeline worker");

    Ok(PipelineHandle {
        events,
        cancel,
        thread,
    })
}

impl PipelineHandle {
    /// Raw event stream, for callers that want to poll
    pub fn events(&self) -> &Receiver<PipelineEvent> {
        &self.events
    }

    /// Ask the run to stop before its next stage
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Token of this run only
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Block until the run ends
    pub fn wait(self) -> Result<PipelineOutput> {
        self.wait_with(|_| {})
    }

    /// Block until the run ends, handing every checkpoint to `on_progress`
    pub fn wait_with(
        self,
        mut on_progress: impl FnMut(ProgressUpdate),
    ) -> Result<PipelineOutput> {
        let outcome = loop {
            match self.events.recv() {
                Ok(PipelineEvent::Progress(update)) => on_progress(update),
                Ok(PipelineEvent::State(_)) => {}
                Ok(PipelineEvent::Finished(output)) => break Ok(*output),
                Ok(PipelineEvent::Failed(err)) => break Err(err),
                // Every sender dropped without a terminal event
                Err(_) => {
                    break Err(BeatshiftError::WorkerFailed {
                        reason: "worker exited without a result".to_string(),
                    })
                }
            }
        };

        if self.thread.join().is_err() {
            return Err(BeatshiftError::WorkerFailed {
                reason: "worker thread panicked".to_string(),
            });
        }
        outcome
    }
}
