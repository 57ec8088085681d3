//! Sample Buffer
//!
//! The in-memory audio representation passed between pipeline stages.
//! Samples are stored non-interleaved as 32-bit floats, one `Vec<f32>` per channel.

use crate::error::{BeatshiftError, Result};

// ============================================================================
// Helper Functions
// ============================================================================

/// Convert linear amplitude to decibels
///
/// Returns -f32::INFINITY for zero input.
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    if linear <= 0.0 {
        f32::NEG_INFINITY
    } else {
        20.0 * linear.log10()
    }
}

// ============================================================================
// Sample Buffer
// ============================================================================

/// Multi-channel PCM buffer
///
/// # Invariants
/// - at least one channel
/// - every channel has the same number of frames
/// - the sample rate is positive and never changes after construction
///
/// Values are nominally in [-1.0, 1.0] but are not clamped until encoding.
///
/// # Example
/// ```
/// use beatshift::engine::SampleBuffer;
///
/// // One second of stereo silence at 44.1kHz
/// let buffer = SampleBuffer::silent(2, 44100, 44100).unwrap();
/// assert_eq!(buffer.channel_count(), 2);
/// assert_eq!(buffer.frame_count(), 44100);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    channels: Vec<Vec<f32>>,
    sample_rate: u32,
}

impl SampleBuffer {
    /// Create a buffer of silence
    pub fn silent(channel_count: usize, frame_count: usize, sample_rate: u32) -> Result<Self> {
        Self::from_channels(vec![vec![0.0_f32; frame_count]; channel_count], sample_rate)
    }

    /// Create a buffer from per-channel sample data
    ///
    /// # Errors
    /// `InvalidBuffer` if there are no channels, the channel lengths differ,
    /// or the sample rate is zero.
    pub fn from_channels(channels: Vec<Vec<f32>>, sample_rate: u32) -> Result<Self> {
        if sample_rate == 0 {
            return Err(BeatshiftError::InvalidBuffer {
                reason: "sample rate must be positive".to_string(),
            });
        }

        let frame_count = match channels.first() {
            Some(first) => first.len(),
            None => {
                return Err(BeatshiftError::InvalidBuffer {
                    reason: "buffer must have at least one channel".to_string(),
                })
            }
        };

        if let Some((index, channel)) = channels
            .iter()
            .enumerate()
            .find(|(_, ch)| ch.len() != frame_count)
        {
            return Err(BeatshiftError::InvalidBuffer {
                reason: format!(
                    "channel {} has {} frames, channel 0 has {}",
                    index,
                    channel.len(),
                    frame_count
                ),
            });
        }

        Ok(Self {
            channels,
            sample_rate,
        })
    }

    /// Create a buffer from interleaved sample data
    ///
    /// # Arguments
    /// * `interleaved` - Interleaved sample data (L, R, L, R, ... for stereo)
    /// * `channel_count` - Number of interleaved channels
    /// * `sample_rate` - Sample rate in Hz
    pub fn from_interleaved(
        interleaved: &[f32],
        channel_count: usize,
        sample_rate: u32,
    ) -> Result<Self> {
        if channel_count == 0 {
            return Err(BeatshiftError::InvalidBuffer {
                reason: "buffer must have at least one channel".to_string(),
            });
        }

        if interleaved.len() % channel_count != 0 {
            return Err(BeatshiftError::InvalidBuffer {
                reason: format!(
                    "Interleaved data length {} is not divisible by channel count {}",
                    interleaved.len(),
                    channel_count
                ),
            });
        }

        let frame_count = interleaved.len() / channel_count;
        let mut channels = vec![Vec::with_capacity(frame_count); channel_count];

        for frame in interleaved.chunks_exact(channel_count) {
            for (ch, &sample) in frame.iter().enumerate() {
                channels[ch].push(sample);
            }
        }

        Self::from_channels(channels, sample_rate)
    }

    /// Convert the buffer to interleaved format
    pub fn to_interleaved(&self) -> Vec<f32> {
        let mut interleaved = Vec::with_capacity(self.channel_count() * self.frame_count());

        for frame in 0..self.frame_count() {
            for channel in &self.channels {
                interleaved.push(channel[frame]);
            }
        }

        interleaved
    }

    /// Sample rate in Hz
    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of channels
    #[inline]
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Number of frames (samples per channel)
    #[inline]
    pub fn frame_count(&self) -> usize {
        self.channels[0].len()
    }

    /// Check if the buffer holds no frames
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frame_count() == 0
    }

    /// Get the duration in seconds
    #[inline]
    pub fn duration_secs(&self) -> f64 {
        self.frame_count() as f64 / self.sample_rate as f64
    }

    /// Get immutable access to a channel's samples
    ///
    /// # Panics
    /// Panics if the channel index is out of bounds
    #[inline]
    pub fn channel(&self, index: usize) -> &[f32] {
        &self.channels[index]
    }

    /// Get mutable access to a channel's samples
    ///
    /// The slice cannot change length, so the frame-count invariant holds.
    ///
    /// # Panics
    /// Panics if the channel index is out of bounds
    #[inline]
    pub fn channel_mut(&mut self, index: usize) -> &mut [f32] {
        &mut self.channels[index]
    }

    /// All channels, in order
    #[inline]
    pub fn channels(&self) -> &[Vec<f32>] {
        &self.channels
    }

    /// Consume the buffer, returning its channel data
    pub fn into_channels(self) -> Vec<Vec<f32>> {
        self.channels
    }

    /// Peak absolute sample value across all channels, in dB
    ///
    /// Returns -f32::INFINITY for silent or empty buffers.
    pub fn peak_db(&self) -> f32 {
        let peak = self
            .channels
            .iter()
            .flat_map(|channel| channel.iter())
            .map(|&s| s.abs())
            .fold(0.0_f32, f32::max);

        linear_to_db(peak)
    }
}

// ============================================================================
// Tests
// ============================================================================
