//! WAV encoding
//!
//! Serializes a [`SampleBuffer`] as canonical 16-bit PCM WAV: a 44-byte
//! RIFF/fmt/data header followed by interleaved little-endian samples.

use std::path::Path;

use sha2::{Digest, Sha256};

use crate::engine::buffer::SampleBuffer;
use crate::error::{BeatshiftError, Result};

/// Size of the RIFF + fmt + data chunk headers
pub const WAV_HEADER_LEN: usize = 44;

const BITS_PER_SAMPLE: u16 = 16;
const BYTES_PER_SAMPLE: u16 = BITS_PER_SAMPLE / 8;
const PCM_FORMAT_TAG: u16 = 1;
const PCM_FMT_CHUNK_LEN: u32 = 16;

/// Largest data chunk whose RIFF chunk size (`36 + data`) still fits in 32 bits
pub const MAX_DATA_BYTES: u64 = (u32::MAX - 36) as u64;

/// Check that a buffer of this shape can be described by a WAV header
///
/// Callers that are about to allocate an output buffer use this to fail before
/// the allocation instead of at encode time.
///
/// # Errors
/// `EncodingOverflow` if the block alignment does not fit in 16 bits or the
/// data chunk does not fit the 32-bit RIFF size fields.
pub fn check_encodable(frame_count: usize, channel_count: usize) -> Result<()> {
    let data_bytes = (frame_count as u64)
        .saturating_mul(channel_count as u64)
        .saturating_mul(BYTES_PER_SAMPLE as u64);
    let block_align = (channel_count as u64).saturating_mul(BYTES_PER_SAMPLE as u64);

    if block_align > u16::MAX as u64 || data_bytes > MAX_DATA_BYTES {
        return Err(BeatshiftError::EncodingOverflow {
            data_bytes,
            channels: channel_count,
        });
    }
    Ok(())
}

/// Convert a float sample to 16-bit PCM
///
/// Clamps to [-1.0, 1.0], scales negatives by 32768 and the rest by 32767,
/// then truncates toward zero. NaN maps to 0.
#[inline]
pub fn sample_to_i16(sample: f32) -> i16 {
    let s = sample.clamp(-1.0, 1.0);
    let scaled = if s < 0.0 { s * 32768.0 } else { s * 32767.0 };
    scaled as i16
}

/// Encoded WAV bytes, owned by the caller once produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedAudio(Vec<u8>);

impl EncodedAudio {
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[inline]
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Hex SHA-256 of the encoded bytes
    pub fn sha256_hex(&self) -> String {
        format!("{:x}", Sha256::digest(&self.0))
    }

    /// Write the bytes to a file, replacing any existing file
    pub fn write_to(&self, path: &Path) -> Result<()> {
        std::fs::write(path, &self.0)?;
        Ok(())
    }
}

impl AsRef<[u8]> for EncodedAudio {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// 16-bit PCM WAV encoder
#[derive(Debug, Clone, Copy, Default)]
pub struct WaveEncoder;

impl WaveEncoder {
    pub fn new() -> Self {
        WaveEncoder
    }

    /// Encode a buffer as 16-bit PCM WAV
    ///
    /// The output is exactly `44 + frames * channels * 2` bytes.
    ///
    /// # Errors
    /// `EncodingOverflow` if the channel count does not fit in 16 bits or the
    /// sizes do not fit the 32-bit RIFF fields.
    pub fn encode(&self, buffer: &SampleBuffer) -> Result<EncodedAudio> {
        let channel_count = buffer.channel_count();
        let frame_count = buffer.frame_count();
        check_encodable(frame_count, channel_count)?;
        let data_bytes = frame_count as u64 * channel_count as u64 * BYTES_PER_SAMPLE as u64;

        let overflow = || BeatshiftError::EncodingOverflow {
            data_bytes,
            channels: channel_count,
        };

        let num_channels = u16::try_from(channel_count).map_err(|_| overflow())?;
        let block_align = num_channels.checked_mul(BYTES_PER_SAMPLE).ok_or_else(overflow)?;
        let byte_rate = buffer
            .sample_rate()
            .checked_mul(block_align as u32)
            .ok_or_else(overflow)?;
        let data_len = u32::try_from(data_bytes).map_err(|_| overflow())?;
        let riff_len = data_len.checked_add(36).ok_or_else(overflow)?;

        let mut wav = Vec::with_capacity(WAV_HEADER_LEN + data_len as usize);

        // RIFF header
        wav.extend_from_slice(b"RIFF");
        wav.extend_from_slice(&riff_len.to_le_bytes());
        wav.extend_from_slice(b"WAVE");

        // fmt chunk
        wav.extend_from_slice(b"fmt ");
        wav.extend_from_slice(&PCM_FMT_CHUNK_LEN.to_le_bytes());
        wav.extend_from_slice(&PCM_FORMAT_TAG.to_le_bytes());
        wav.extend_from_slice(&num_channels.to_le_bytes());
        wav.extend_from_slice(&buffer.sample_rate().to_le_bytes());
        wav.extend_from_slice(&byte_rate.to_le_bytes());
        wav.extend_from_slice(&block_align.to_le_bytes());
        wav.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());

        // data chunk
        wav.extend_from_slice(b"data");
        wav.extend_from_slice(&data_len.to_le_bytes());

        let channels = buffer.channels();
        for frame in 0..frame_count {
            for channel in channels {
                wav.extend_from_slice(&sample_to_i16(channel[frame]).to_le_bytes());
            }
        }

        Ok(EncodedAudio(wav))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn read_u16(bytes: &[u8], offset: usize) -> u16 {
        u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
    }

    fn read_u32(bytes: &[u8], offset: usize) -> u32 {
        u32::from_le_bytes([
            bytes[offset],
            bytes[offset + 1],
            bytes[offset + 2],
            bytes[offset + 3],
        ])
    }

    #[test]
    fn test_two_frame_mono_reference() {
        let buffer = SampleBuffer::from_channels(vec![vec![1.0, -1.0]], 8000).unwrap();
        let wav = WaveEncoder::new().encode(&buffer).unwrap();

        assert_eq!(wav.len(), 48);
        assert_eq!(&wav.as_bytes()[44..], &[0xFF, 0x7F, 0x00, 0x80]);
    }

    #[test_case(1, 10, 8000 ; "mono")]
    #[test_case(2, 441, 44100 ; "stereo")]
    #[test_case(6, 3, 48000 ; "surround")]
    #[test_case(1, 0, 22050 ; "empty")]
    fn test_header_fields(channels: usize, frames: usize, rate: u32) {
        let buffer = SampleBuffer::silent(channels, frames, rate).unwrap();
        let wav = WaveEncoder::new().encode(&buffer).unwrap();
        let bytes = wav.as_bytes();
        let data_bytes = (frames * channels * 2) as u32;

        assert_eq!(bytes.len(), 44 + frames * channels * 2);
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(read_u32(bytes, 4), 36 + data_bytes);
        assert_eq!(&bytes[8..12], b"WAVE");
        assert_eq!(&bytes[12..16], b"fmt ");
        assert_eq!(read_u32(bytes, 16), 16);
        assert_eq!(read_u16(bytes, 20), 1);
        assert_eq!(read_u16(bytes, 22), channels as u16);
        assert_eq!(read_u32(bytes, 24), rate);
        assert_eq!(read_u32(bytes, 28), rate * channels as u32 * 2);
        assert_eq!(read_u16(bytes, 32), channels as u16 * 2);
        assert_eq!(read_u16(bytes, 34), 16);
        assert_eq!(&bytes[36..40], b"data");
        assert_eq!(read_u32(bytes, 40), data_bytes);
    }

    #[test]
    fn test_samples_are_interleaved_per_frame() {
        let buffer =
            SampleBuffer::from_channels(vec![vec![0.5, 0.0], vec![-0.5, 1.0]], 8000).unwrap();
        let wav = WaveEncoder::new().encode(&buffer).unwrap();
        let samples: Vec<i16> = wav.as_bytes()[44..]
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]))
            .collect();

        assert_eq!(samples, vec![16383, -16384, 0, 32767]);
    }

    #[test]
    fn test_sample_conversion_clamps_and_truncates() {
        assert_eq!(sample_to_i16(2.0), 32767);
        assert_eq!(sample_to_i16(-3.5), -32768);
        assert_eq!(sample_to_i16(0.0), 0);
        assert_eq!(sample_to_i16(-0.0), 0);
        // 0.00002 * 32767 = 0.655 truncates to 0
        assert_eq!(sample_to_i16(0.00002), 0);
        assert_eq!(sample_to_i16(-0.00004), -1);
        assert_eq!(sample_to_i16(f32::NAN), 0);
    }

    #[test]
    fn test_encodable_shape_limits() {
        check_encodable(0, 1).unwrap();
        // Largest mono data chunk: (u32::MAX - 36) / 2 frames
        check_encodable(((u32::MAX - 36) / 2) as usize, 1).unwrap();

        match check_encodable(((u32::MAX - 36) / 2) as usize + 1, 1) {
            Err(BeatshiftError::EncodingOverflow { data_bytes, channels }) => {
                assert!(data_bytes > MAX_DATA_BYTES);
                assert_eq!(channels, 1);
            }
            other => panic!("Expected EncodingOverflow, got: {:?}", other),
        }
        assert!(check_encodable(1, 40_000).is_err());
        assert!(check_encodable(usize::MAX, 2).is_err());
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let buffer = SampleBuffer::from_channels(
            vec![(0..1000).map(|i| ((i as f32) * 0.01).sin()).collect()],
            44100,
        )
        .unwrap();
        let encoder = WaveEncoder::new();
        let first = encoder.encode(&buffer).unwrap();
        let second = encoder.encode(&buffer).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.sha256_hex(), second.sha256_hex());
        assert_eq!(first.sha256_hex().len(), 64);
    }

    #[test]
    fn test_readable_by_hound() {
        let buffer =
            SampleBuffer::from_channels(vec![vec![0.25; 100], vec![-0.25; 100]], 32000).unwrap();
        let wav = WaveEncoder::new().encode(&buffer).unwrap();

        let mut reader = hound::WavReader::new(std::io::Cursor::new(wav.into_bytes())).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 2);
        assert_eq!(spec.sample_rate, 32000);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(spec.sample_format, hound::SampleFormat::Int);

        let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(samples.len(), 200);
        assert_eq!(samples[0], 8191);
        assert_eq!(samples[1], -8192);
    }

    #[test]
    fn test_write_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.wav");
        let buffer = SampleBuffer::silent(1, 16, 8000).unwrap();
        let wav = WaveEncoder::new().encode(&buffer).unwrap();

        wav.write_to(&path).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), wav.as_bytes());
    }
}
