//! Audio file I/O for Beatshift
//!
//! Reads source files into memory (with the input-size guard) and provides
//! signal generators for building synthetic inputs.

use std::path::Path;

use crate::engine::buffer::SampleBuffer;
use crate::error::{BeatshiftError, Result};

/// Check an input length against an optional limit
pub fn check_input_size(size: usize, limit: Option<usize>) -> Result<()> {
    match limit {
        Some(limit) if size > limit => Err(BeatshiftError::InputTooLarge { size, limit }),
        _ => Ok(()),
    }
}

/// Read an encoded audio file into memory
///
/// # Errors
/// * `FileNotFound` - If the file does not exist
/// * `InputTooLarge` - If the file is larger than `max_bytes`
pub fn read_input_file(path: &Path, max_bytes: Option<usize>) -> Result<Vec<u8>> {
    let metadata = std::fs::metadata(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            BeatshiftError::FileNotFound {
                path: path.display().to_string(),
                source: Some(e),
            }
        } else {
            BeatshiftError::Io(e)
        }
    })?;

    // Reject before reading so an oversized file is never loaded.
    check_input_size(usize::try_from(metadata.len()).unwrap_or(usize::MAX), max_bytes)?;

    Ok(std::fs::read(path)?)
}

/// Generate a mono sine test tone
///
/// # Arguments
/// * `frequency` - Frequency of the sine wave in Hz
/// * `duration_secs` - Duration of the tone in seconds
/// * `sample_rate` - Sample rate in Hz
pub fn generate_test_tone(
    frequency: f32,
    duration_secs: f32,
    sample_rate: u32,
) -> Result<SampleBuffer> {
    let num_samples = (duration_secs * sample_rate as f32) as usize;
    let angular_freq = 2.0 * std::f32::consts::PI * frequency / sample_rate.max(1) as f32;

    let samples = (0..num_samples)
        .map(|i| (angular_freq * i as f32).sin())
        .collect();

    SampleBuffer::from_channels(vec![samples], sample_rate)
}

/// Generate a mono click train: single-sample impulses at a fixed tempo
///
/// Clicks have amplitude 1.0 and start at `offset` frames; all other samples
/// are silent. A train at `bpm` has clicks `sample_rate * 60 / bpm` frames apart.
pub fn generate_click_train(
    bpm: f64,
    duration_secs: f64,
    sample_rate: u32,
    offset: usize,
) -> Result<SampleBuffer> {
    if !(bpm.is_finite() && bpm > 0.0) {
        return Err(BeatshiftError::InvalidConfig {
            reason: format!("click train tempo must be a positive finite BPM, got {}", bpm),
        });
    }

    let num_samples = (duration_secs * sample_rate as f64).round() as usize;
    let spacing = sample_rate as f64 * 60.0 / bpm;
    let mut samples = vec![0.0_f32; num_samples];

    let mut beat = 0usize;
    loop {
        let index = offset + (beat as f64 * spacing).round() as usize;
        match samples.get_mut(index) {
            Some(sample) => *sample = 1.0,
            None => break,
        }
        beat += 1;
    }

    SampleBuffer::from_channels(vec![samples], sample_rate)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_generate_test_tone() {
        let buffer = generate_test_tone(440.0, 1.0, 48000).unwrap();

        assert_eq!(buffer.frame_count(), 48000);
        assert_eq!(buffer.channel_count(), 1);

        // The sample near half-cycle should be close to zero
        let zero_crossing_1 = (48000.0 / 440.0 / 2.0) as usize;
        assert!(buffer.channel(0)[zero_crossing_1].abs() < 0.1);
    }

    #[test]
    fn test_click_train_spacing() {
        let buffer = generate_click_train(120.0, 2.0, 44100, 100).unwrap();
        let clicks: Vec<usize> = buffer
            .channel(0)
            .iter()
            .enumerate()
            .filter(|&(_, &s)| s == 1.0)
            .map(|(i, _)| i)
            .collect();

        assert_eq!(clicks, vec![100, 22150, 44200, 66250]);
    }

    #[test]
    fn test_click_train_rejects_zero_bpm() {
        for bpm in [0.0, -120.0, f64::NAN, f64::INFINITY] {
            match generate_click_train(bpm, 1.0, 44100, 0) {
                Err(BeatshiftError::InvalidConfig { reason }) => assert!(reason.contains("BPM")),
                other => panic!("Expected InvalidConfig, got: {:?}", other),
            }
        }
    }

    #[test]
    fn test_read_input_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("input.bin");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(&[1, 2, 3, 4])
            .unwrap();

        assert_eq!(read_input_file(&path, Some(4)).unwrap(), vec![1, 2, 3, 4]);

        match read_input_file(&path, Some(3)) {
            Err(BeatshiftError::InputTooLarge { size, limit }) => {
                assert_eq!(size, 4);
                assert_eq!(limit, 3);
            }
            other => panic!("Expected InputTooLarge error, got: {:?}", other),
        }
    }

    #[test]
    fn test_import_nonexistent_file() {
        match read_input_file(Path::new("/nonexistent/path/audio.mp3"), None) {
            Err(BeatshiftError::FileNotFound { path, .. }) => {
                assert!(path.contains("nonexistent"));
            }
            other => panic!("Expected FileNotFound error, got: {:?}", other),
        }
    }
}
