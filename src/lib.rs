//! Beatshift - Offline Genre Retiming
//!
//! Beatshift takes an encoded audio file and a target genre and produces a
//! 16-bit PCM WAV retimed to the genre's tempo with a synthesized kick layered
//! in once per second.
//!
//! # Architecture
//!
//! A run is a strict sequence of stages, each taking ownership of the previous
//! stage's buffer:
//! - Decode: encoded bytes → [`engine::SampleBuffer`] (symphonia)
//! - Tempo: peak-picking BPM estimate ([`dsp::TempoEstimator`])
//! - Stretch: playback-rate resampling toward the genre tempo ([`dsp::Resampler`])
//! - Layer: kick synthesis and mixing ([`dsp::SampleLayerer`])
//! - Encode: canonical WAV bytes ([`engine::WaveEncoder`])
//!
//! [`pipeline::Pipeline`] drives the stages and reports progress;
//! [`pipeline::spawn_pipeline`] runs it on a background thread.

pub mod cli;
pub mod config;
pub mod dsp;
pub mod engine;
pub mod error;
pub mod genre;
pub mod pipeline;

pub use config::PipelineConfig;
pub use error::{BeatshiftError, Result};
pub use genre::Genre;
pub use pipeline::{Pipeline, PipelineOutput, PipelineReport, PipelineRequest};
