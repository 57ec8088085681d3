//! Kick layering
//!
//! Synthesizes a short decaying sine burst and mixes it into channel 0 once per
//! second of audio.

use log::debug;

use crate::config::KickConfig;
use crate::engine::SampleBuffer;
use crate::genre::Genre;

/// Synthesize a kick: a sine burst with a linear decay from 1.0 toward 0.0
///
/// `kick[i] = sin(2π·f·i / sample_rate) · (1 − i / len)` where
/// `len = floor(sample_rate · duration)`.
pub fn synthesize_kick(sample_rate: u32, kick: &KickConfig) -> Vec<f32> {
    let len = (sample_rate as f64 * kick.duration_secs as f64).floor() as usize;
    let angular_freq = 2.0 * std::f64::consts::PI * kick.frequency_hz as f64 / sample_rate as f64;

    (0..len)
        .map(|i| {
            let envelope = 1.0 - i as f64 / len as f64;
            ((angular_freq * i as f64).sin() * envelope) as f32
        })
        .collect()
}

/// Mixes a synthesized kick into a buffer at one-second intervals
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SampleLayerer {
    kick: KickConfig,
}

impl SampleLayerer {
    pub fn new(kick: KickConfig) -> Self {
        Self { kick }
    }

    pub fn kick(&self) -> &KickConfig {
        &self.kick
    }

    /// Layer the kick onto channel 0 at frames 0, sr, 2·sr, …
    ///
    /// Each kick is scaled by the configured gain and added to the existing
    /// samples; the last kick is cut off at the end of the buffer. Other
    /// channels and the buffer shape are untouched. The genre does not change
    /// the kick sound.
    pub fn layer(&self, mut buffer: SampleBuffer, genre: Genre) -> SampleBuffer {
        let sample_rate = buffer.sample_rate();
        let kick = synthesize_kick(sample_rate, &self.kick);
        let gain = self.kick.gain;

        let target = buffer.channel_mut(0);
        let frame_count = target.len();
        let mut placed = 0usize;

        for start in (0..frame_count).step_by(sample_rate as usize) {
            for (sample, k) in target[start..].iter_mut().zip(&kick) {
                *sample += k * gain;
            }
            placed += 1;
        }

        debug!(
            "Layered {} kicks ({} frames each) for {}",
            placed,
            kick.len(),
            genre
        );

        buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_kick_shape() {
        let kick = synthesize_kick(44100, &KickConfig::default());
        assert_eq!(kick.len(), 4410);
        assert_eq!(kick[0], 0.0);

        // Quarter period of 50 Hz at 44.1kHz is 220.5 frames
        let expected = (2.0 * std::f64::consts::PI * 50.0 * 220.0 / 44100.0).sin()
            * (1.0 - 220.0 / 4410.0);
        assert_relative_eq!(kick[220], expected as f32, epsilon = 1e-6);

        // The envelope decays, so the tail is far quieter than the head
        let head = kick[..441].iter().fold(0.0_f32, |m, s| m.max(s.abs()));
        let tail = kick[4000..].iter().fold(0.0_f32, |m, s| m.max(s.abs()));
        assert!(tail < head * 0.2);
    }

    #[test]
    fn test_kick_length_truncates_partial_samples() {
        // 11025 * 0.1 = 1102.5 frames
        assert_eq!(synthesize_kick(11025, &KickConfig::default()).len(), 1102);
        assert_eq!(synthesize_kick(22050, &KickConfig::default()).len(), 2205);
    }

    #[test]
    fn test_kicks_land_once_per_second() {
        let buffer = SampleBuffer::silent(1, 2500, 1000).unwrap();
        let layered = SampleLayerer::default().layer(buffer, Genre::Techno);
        let kick = synthesize_kick(1000, &KickConfig::default());
        let out = layered.channel(0);

        assert_eq!(kick.len(), 100);
        for start in [0usize, 1000, 2000] {
            for j in 0..kick.len() {
                assert_relative_eq!(out[start + j], kick[j] * 0.5);
            }
        }
        // Between kicks the buffer stays silent
        assert!(out[100..1000].iter().all(|&s| s == 0.0));
        assert!(out[2100..].iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_mix_is_additive() {
        let buffer = SampleBuffer::from_channels(vec![vec![0.25; 300]], 1000).unwrap();
        let layered = SampleLayerer::default().layer(buffer, Genre::Lofi);
        let kick = synthesize_kick(1000, &KickConfig::default());

        assert_relative_eq!(layered.channel(0)[10], 0.25 + kick[10] * 0.5);
        assert_eq!(layered.channel(0)[150], 0.25);
    }

    #[test]
    fn test_last_kick_is_truncated() {
        let buffer = SampleBuffer::silent(1, 1050, 1000).unwrap();
        let layered = SampleLayerer::default().layer(buffer, Genre::Trance);
        let kick = synthesize_kick(1000, &KickConfig::default());

        assert_eq!(layered.frame_count(), 1050);
        assert_relative_eq!(layered.channel(0)[1049], kick[49] * 0.5);
    }

    #[test]
    fn test_shape_and_other_channels_preserved() {
        let right: Vec<f32> = (0..3000).map(|i| (i as f32 * 0.37).sin()).collect();
        let buffer =
            SampleBuffer::from_channels(vec![vec![0.0; 3000], right.clone()], 1000).unwrap();
        let layered = SampleLayerer::default().layer(buffer, Genre::Hardstyle);

        assert_eq!(layered.sample_rate(), 1000);
        assert_eq!(layered.channel_count(), 2);
        assert_eq!(layered.frame_count(), 3000);
        assert_eq!(layered.channel(1), right.as_slice());
    }

    #[test]
    fn test_empty_buffer() {
        let buffer = SampleBuffer::silent(1, 0, 44100).unwrap();
        assert!(SampleLayerer::default().layer(buffer, Genre::Hardbass).is_empty());
    }

    #[test]
    fn test_custom_kick() {
        let layerer = SampleLayerer::new(KickConfig {
            frequency_hz: 60.0,
            duration_secs: 0.05,
            gain: 1.0,
        });
        let layered = layerer.layer(SampleBuffer::silent(1, 1000, 1000).unwrap(), Genre::Techno);
        let kick = synthesize_kick(1000, layerer.kick());

        assert_eq!(kick.len(), 50);
        assert_relative_eq!(layered.channel(0)[7], kick[7]);
        assert_eq!(layered.channel(0)[50], 0.0);
    }
}
