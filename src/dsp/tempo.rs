//! Tempo Estimation
//!
//! Peak-picking BPM detection. Local maxima of channel 0 above a noise floor are
//! treated as beats; the tempo follows from the mean distance between them.

use log::{debug, warn};

use crate::config::{TempoConfig, DEFAULT_PEAK_THRESHOLD};
use crate::engine::SampleBuffer;
use crate::error::{BeatshiftError, Result};

/// Estimated tempo of a track
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TempoEstimate {
    bpm: u32,
    peak_count: usize,
    mean_interval: Option<f64>,
    fallback: bool,
}

impl TempoEstimate {
    /// Tempo in beats per minute, always positive
    #[inline]
    pub fn bpm(&self) -> u32 {
        self.bpm
    }

    /// Number of peaks detected in channel 0
    #[inline]
    pub fn peak_count(&self) -> usize {
        self.peak_count
    }

    /// Mean inter-peak interval in frames (None for a fallback estimate)
    #[inline]
    pub fn mean_interval(&self) -> Option<f64> {
        self.mean_interval
    }

    /// True when the configured fallback tempo was used
    #[inline]
    pub fn is_fallback(&self) -> bool {
        self.fallback
    }
}

/// Peak-based tempo estimator
#[derive(Debug, Clone, PartialEq)]
pub struct TempoEstimator {
    peak_threshold: f32,
    fallback_bpm: Option<u32>,
}

impl Default for TempoEstimator {
    fn default() -> Self {
        Self::new(DEFAULT_PEAK_THRESHOLD)
    }
}

impl TempoEstimator {
    /// Create an estimator with the given peak threshold and no fallback
    pub fn new(peak_threshold: f32) -> Self {
        Self {
            peak_threshold,
            fallback_bpm: None,
        }
    }

    pub fn from_config(config: &TempoConfig) -> Self {
        Self {
            peak_threshold: config.peak_threshold,
            fallback_bpm: config.fallback_bpm.filter(|&bpm| bpm > 0),
        }
    }

    /// Use `bpm` instead of failing when no tempo can be derived
    pub fn with_fallback(mut self, bpm: u32) -> Self {
        self.fallback_bpm = Some(bpm).filter(|&bpm| bpm > 0);
        self
    }

    /// Indices of local maxima strictly above the threshold
    ///
    /// The first and last samples are never peaks.
    pub fn detect_peaks(&self, samples: &[f32]) -> Vec<usize> {
        samples
            .windows(3)
            .enumerate()
            .filter(|(_, w)| w[1] > w[0] && w[1] > w[2] && w[1] > self.peak_threshold)
            .map(|(i, _)| i + 1)
            .collect()
    }

    /// Estimate the tempo of a buffer from channel 0
    ///
    /// BPM = round(sample_rate / mean_interval * 60).
    ///
    /// # Errors
    /// `InsufficientPeaks` when fewer than two peaks are found, or the peaks are
    /// so far apart that the tempo rounds to zero, and no fallback is configured.
    pub fn estimate(&self, buffer: &SampleBuffer) -> Result<TempoEstimate> {
        let peaks = self.detect_peaks(buffer.channel(0));

        let intervals: Vec<f64> = peaks
            .windows(2)
            .map(|pair| (pair[1] - pair[0]) as f64)
            .collect();

        if intervals.is_empty() {
            return self.fall_back(peaks.len());
        }

        let mean_interval = intervals.iter().sum::<f64>() / intervals.len() as f64;
        let bpm = (buffer.sample_rate() as f64 / mean_interval * 60.0).round();

        debug!(
            "Tempo: {} peaks, mean interval {:.1} frames -> {} BPM",
            peaks.len(),
            mean_interval,
            bpm
        );

        if !(bpm.is_finite() && bpm >= 1.0 && bpm <= u32::MAX as f64) {
            return self.fall_back(peaks.len());
        }

        Ok(TempoEstimate {
            bpm: bpm as u32,
            peak_count: peaks.len(),
            mean_interval: Some(mean_interval),
            fallback: false,
        })
    }

    fn fall_back(&self, peaks_found: usize) -> Result<TempoEstimate> {
        match self.fallback_bpm {
            Some(bpm) => {
                warn!(
                    "Could not derive a tempo from {} peaks, using fallback {} BPM",
                    peaks_found, bpm
                );
                Ok(TempoEstimate {
                    bpm,
                    peak_count: peaks_found,
                    mean_interval: None,
                    fallback: true,
                })
            }
            None => Err(BeatshiftError::InsufficientPeaks { peaks_found }),
        }
    }
}
