//! Tempo stretch by playback-rate resampling
//!
//! Reads the input at `factor = original_bpm / target_bpm` input frames per
//! output frame, at an unchanged sample rate. Duration and pitch change
//! together; this is not a pitch-preserving stretch.
//!
//! The output always has `round(input_frames * factor)` frames. Output frame
//! `i` reads input position `i * factor`; positions past the end of the input
//! are silent.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::ResampleConfig;
use crate::engine::{check_encodable, SampleBuffer};
use crate::error::{BeatshiftError, Result};

/// How to reconstruct samples between input frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interpolation {
    /// Linear interpolation between the two neighbouring frames
    #[default]
    Linear,
    /// Nearest earlier frame (plain decimation / duplication)
    Nearest,
}

/// Compute the stretch factor `original_bpm / target_bpm`
///
/// # Errors
/// `InvalidTempo` if either tempo is not a positive finite number.
pub fn stretch_factor(original_bpm: f64, target_bpm: f64) -> Result<f64> {
    let valid = |bpm: f64| bpm.is_finite() && bpm > 0.0;
    if !valid(original_bpm) || !valid(target_bpm) {
        return Err(BeatshiftError::InvalidTempo {
            original_bpm,
            target_bpm,
        });
    }
    Ok(original_bpm / target_bpm)
}

/// Output length for a stretch: `round(input_frames * factor)`
#[inline]
pub fn stretched_len(input_frames: usize, factor: f64) -> usize {
    (input_frames as f64 * factor).round() as usize
}

/// Playback-rate tempo stretcher
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Resampler {
    interpolation: Interpolation,
}

impl Resampler {
    pub fn new(interpolation: Interpolation) -> Self {
        Self { interpolation }
    }

    pub fn from_config(config: &ResampleConfig) -> Self {
        Self::new(config.interpolation)
    }

    pub fn interpolation(&self) -> Interpolation {
        self.interpolation
    }

    /// Retime a buffer from `original_bpm` toward `target_bpm`
    ///
    /// Takes ownership of the input and returns a new buffer with the same
    /// sample rate and channel count.
    ///
    /// # Errors
    /// `InvalidTempo` for a non-positive or non-finite tempo, and
    /// `EncodingOverflow` when the output could never be written as WAV. The
    /// size is checked before anything is allocated.
    pub fn stretch(
        &self,
        buffer: SampleBuffer,
        original_bpm: f64,
        target_bpm: f64,
    ) -> Result<SampleBuffer> {
        let factor = stretch_factor(original_bpm, target_bpm)?;
        let output_len = stretched_len(buffer.frame_count(), factor);
        check_encodable(output_len, buffer.channel_count())?;
        let sample_rate = buffer.sample_rate();

        debug!(
            "Stretch {} -> {} BPM: factor {:.4}, {} -> {} frames ({:?})",
            original_bpm,
            target_bpm,
            factor,
            buffer.frame_count(),
            output_len,
            self.interpolation
        );

        let channels = buffer
            .into_channels()
            .iter()
            .map(|channel| self.resample_channel(channel, factor, output_len))
            .collect();

        SampleBuffer::from_channels(channels, sample_rate)
    }

    fn resample_channel(&self, samples: &[f32], factor: f64, output_len: usize) -> Vec<f32> {
        let source_len = samples.len();

        (0..output_len)
            .map(|i| {
                // Map output index to source position
                let src_pos = i as f64 * factor;
                let src_idx = src_pos.floor() as usize;
                if src_idx >= source_len {
                    return 0.0;
                }

                match self.interpolation {
                    Interpolation::Nearest => samples[src_idx],
                    Interpolation::Linear => {
                        let frac = (src_pos - src_idx as f64) as f32;
                        match samples.get(src_idx + 1) {
                            Some(&next) => samples[src_idx] * (1.0 - frac) + next * frac,
                            None => samples[src_idx],
                        }
                    }
                }
            })
            .collect()
    }
}
