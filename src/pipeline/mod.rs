//! Pipeline Orchestrator
//!
//! Runs one request through decode → tempo estimate → stretch → kick layering →
//! WAV encode. Each stage takes ownership of the previous stage's buffer, so at
//! most two buffers are alive at any point.
//!
//! The pipeline itself is synchronous. [`spawn_pipeline`] moves it onto a
//! background thread and reports over a channel.

mod cancel;
mod progress;
mod state;
mod worker;

#[cfg(feature = "async-bridge")]
mod bridge;

pub use cancel::CancelToken;
pub use progress::{NoProgress, ProgressSink, ProgressUpdate, RecordingSink};
pub use state::{IllegalTransition, PipelineState, StateMachine};
pub use worker::{spawn_pipeline, spawn_pipeline_with_cancel, PipelineEvent, PipelineHandle};

#[cfg(feature = "async-bridge")]
pub use bridge::run_pipeline_async;

use std::time::Instant;

use log::{debug, error, info};
use serde::Serialize;
use uuid::Uuid;

use crate::config::PipelineConfig;
use crate::dsp::{Resampler, SampleLayerer, TempoEstimate, TempoEstimator};
use crate::engine::{check_input_size, AudioDecoder, EncodedAudio, SymphoniaDecoder, WaveEncoder};
use crate::error::{BeatshiftError, Result};
use crate::genre::{validate_profiles, Genre};

/// Encoded input bytes plus the genre to retime them to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineRequest {
    input: Vec<u8>,
    genre: Genre,
}

impl PipelineRequest {
    pub fn new(input: Vec<u8>, genre: Genre) -> Self {
        Self { input, genre }
    }

    /// Build a request from a genre selector such as `"Techno"` or `" lofi "`
    ///
    /// # Errors
    /// `UnknownGenre` if the selector names no known genre.
    pub fn parse(input: Vec<u8>, genre: &str) -> Result<Self> {
        Ok(Self::new(input, genre.parse()?))
    }

    pub fn genre(&self) -> Genre {
        self.genre
    }

    pub fn input(&self) -> &[u8] {
        &self.input
    }
}

/// Summary of a finished run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineReport {
    pub run_id: Uuid,
    pub genre: Genre,
    pub original_bpm: u32,
    /// True when the configured fallback tempo replaced detection
    pub tempo_fallback: bool,
    pub target_bpm: u32,
    pub stretch_factor: f64,
    pub sample_rate: u32,
    pub channel_count: usize,
    pub input_frames: usize,
    pub output_frames: usize,
    pub output_bytes: usize,
}

/// Result of a successful run
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub audio: EncodedAudio,
    pub report: PipelineReport,
}

/// The retiming pipeline
#[derive(Debug)]
pub struct Pipeline<D: AudioDecoder = SymphoniaDecoder> {
    config: PipelineConfig,
    decoder: D,
    estimator: TempoEstimator,
    resampler: Resampler,
    layerer: SampleLayerer,
    encoder: WaveEncoder,
}

impl Pipeline<SymphoniaDecoder> {
    /// Create a pipeline that decodes with symphonia
    pub fn new(config: PipelineConfig) -> Result<Self> {
        Self::with_decoder(config, SymphoniaDecoder::new())
    }
}

impl<D: AudioDecoder> Pipeline<D> {
    /// Create a pipeline with a custom decoder
    ///
    /// # Errors
    /// `InvalidConfig` if the configuration or the genre table is invalid.
    pub fn with_decoder(config: PipelineConfig, decoder: D) -> Result<Self> {
        validate_profiles()?;
        config.validate()?;

        Ok(Self {
            estimator: TempoEstimator::from_config(&config.tempo),
            resampler: Resampler::from_config(&config.resample),
            layerer: SampleLayerer::new(config.kick.clone()),
            encoder: WaveEncoder::new(),
            config,
            decoder,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Decode `input` and estimate its tempo without retiming it
    pub fn detect_tempo(&self, input: &[u8]) -> Result<TempoEstimate> {
        check_input_size(input.len(), self.config.max_input_bytes)?;
        let buffer = self.decoder.decode(input)?;
        self.estimator.estimate(&buffer)
    }

    /// Run a request to completion
    ///
    /// Checkpoints 20, 40, 60, 80 and 100 are reported as each stage finishes.
    /// An oversized input is rejected before the first stage and reports
    /// nothing. Any later failure moves the run to `Error`, after which the
    /// sink hears nothing more.
    pub fn run(
        &self,
        request: PipelineRequest,
        sink: &mut dyn ProgressSink,
    ) -> Result<PipelineOutput> {
        self.run_with_cancel(request, sink, &CancelToken::new())
    }

    /// Run a request that `cancel` can stop between stages
    ///
    /// The token belongs to this run only; other runs on the same pipeline
    /// never see it.
    pub fn run_with_cancel(
        &self,
        request: PipelineRequest,
        sink: &mut dyn ProgressSink,
        cancel: &CancelToken,
    ) -> Result<PipelineOutput> {
        let PipelineRequest { input, genre } = request;
        check_input_size(input.len(), self.config.max_input_bytes)?;

        let run_id = Uuid::new_v4();
        let target_bpm = genre.target_bpm();
        info!(
            "Run {}: {} input bytes -> {} ({} BPM)",
            run_id,
            input.len(),
            genre,
            target_bpm
        );

        let mut run = Run::new(sink, cancel);

        let decoded = run.stage(|| self.decoder.decode(&input))?;
        drop(input);

        let sample_rate = decoded.sample_rate();
        let channel_count = decoded.channel_count();
        let input_frames = decoded.frame_count();
        debug!(
            "Decoded {:.2}s, {} ch @ {} Hz, peak {:.1} dBFS",
            decoded.duration_secs(),
            channel_count,
            sample_rate,
            decoded.peak_db()
        );

        let estimate = run.stage(|| self.estimator.estimate(&decoded))?;
        let original_bpm = estimate.bpm();

        let stretched = run.stage(|| {
            self.resampler
                .stretch(decoded, f64::from(original_bpm), f64::from(target_bpm))
        })?;
        let output_frames = stretched.frame_count();

        let layered = run.stage(|| Ok(self.layerer.layer(stretched, genre)))?;
        let audio = run.stage(|| self.encoder.encode(&layered))?;
        run.finish()?;

        let report = PipelineReport {
            run_id,
            genre,
            original_bpm,
            tempo_fallback: estimate.is_fallback(),
            target_bpm,
            stretch_factor: f64::from(original_bpm) / f64::from(target_bpm),
            sample_rate,
            channel_count,
            input_frames,
            output_frames,
            output_bytes: audio.len(),
        };

        info!(
            "Run {} done: {} -> {} BPM, {} -> {} frames, {} bytes",
            run_id, original_bpm, target_bpm, input_frames, output_frames, report.output_bytes
        );

        Ok(PipelineOutput { audio, report })
    }
}

/// Per-run bookkeeping: state, progress delivery and cancellation
struct Run<'a, 's> {
    machine: StateMachine,
    sink: &'a mut (dyn ProgressSink + 's),
    cancel: &'a CancelToken,
}

impl<'a, 's> Run<'a, 's> {
    fn new(sink: &'a mut (dyn ProgressSink + 's), cancel: &'a CancelToken) -> Self {
        Self {
            machine: StateMachine::new(),
            sink,
            cancel,
        }
    }

    fn stage<T>(&mut self, work: impl FnOnce() -> Result<T>) -> Result<T> {
        if self.cancel.is_cancelled() {
            return Err(self.fail(BeatshiftError::Cancelled));
        }

        let stage = match self.machine.advance() {
            Ok(stage) => stage,
            Err(illegal) => return Err(self.fail(illegal.into())),
        };
        self.sink.on_state(stage);

        let started = Instant::now();
        match work() {
            Ok(value) => {
                debug!("{} finished in {:.2?}", stage, started.elapsed());
                if let Some(percent) = stage.checkpoint() {
                    self.sink.on_progress(ProgressUpdate { percent, stage });
                }
                Ok(value)
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    fn finish(&mut self) -> Result<()> {
        let state = self.machine.advance()?;
        self.sink.on_state(state);
        Ok(())
    }

    fn fail(&mut self, err: BeatshiftError) -> BeatshiftError {
        error!("{} failed: {}", self.machine.state(), err);
        let state = self.machine.fail();
        self.sink.on_state(state);
        err
    }
}
