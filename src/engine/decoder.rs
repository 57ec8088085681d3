//! Audio decoding
//!
//! Turns an encoded byte stream into a [`SampleBuffer`]. The orchestrator only
//! depends on the [`AudioDecoder`] trait; [`SymphoniaDecoder`] is the stock
//! implementation backed by `symphonia`.

use std::io::Cursor;

use log::{debug, warn};
use symphonia::core::audio::SampleBuffer as PacketBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::engine::buffer::SampleBuffer;
use crate::error::{BeatshiftError, Result};

/// A service that decodes encoded audio bytes into PCM
pub trait AudioDecoder: Send {
    /// Decode `bytes` into a sample buffer
    ///
    /// # Errors
    /// `UnsupportedFormat` when the container or codec is not recognised,
    /// `CorruptData` when the stream cannot be parsed into PCM.
    fn decode(&self, bytes: &[u8]) -> Result<SampleBuffer>;
}

/// Decoder backed by symphonia's default format and codec registries
#[derive(Debug, Clone, Default)]
pub struct SymphoniaDecoder {
    /// Optional file extension hint for the format probe (e.g. "mp3")
    extension_hint: Option<String>,
}

impl SymphoniaDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Help the format probe with the source file extension
    pub fn with_extension_hint(mut self, extension: impl Into<String>) -> Self {
        self.extension_hint = Some(extension.into());
        self
    }
}

impl AudioDecoder for SymphoniaDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<SampleBuffer> {
        let cursor = Cursor::new(bytes.to_vec());
        let mss = MediaSourceStream::new(Box::new(cursor), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = &self.extension_hint {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| map_symphonia_error("Failed to probe format", e))?;
        let mut format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| BeatshiftError::UnsupportedFormat {
                reason: "no decodable audio track".to_string(),
                source: None,
            })?;
        let track_id = track.id;
        let codec_params = track.codec_params.clone();

        let mut decoder = symphonia::default::get_codecs()
            .make(&codec_params, &DecoderOptions::default())
            .map_err(|e| map_symphonia_error("Failed to create decoder", e))?;

        // Layout declared by the container; packets must agree with it.
        let mut sample_rate = codec_params.sample_rate;
        let mut channel_count = codec_params.channels.map(|c| c.count());
        let mut channels: Vec<Vec<f32>> = Vec::new();
        let mut packet_buf: Option<PacketBuffer<f32>> = None;
        let mut skipped_packets = 0usize;

        loop {
            let packet = match format.next_packet() {
                Ok(p) => p,
                Err(SymphoniaError::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break;
                }
                Err(SymphoniaError::ResetRequired) => break,
                Err(e) => return Err(map_symphonia_error("Error reading packet", e)),
            };

            if packet.track_id() != track_id {
                continue;
            }

            let decoded = match decoder.decode(&packet) {
                Ok(d) => d,
                Err(SymphoniaError::DecodeError(reason)) => {
                    warn!("Skipping undecodable packet: {}", reason);
                    skipped_packets += 1;
                    continue;
                }
                Err(e) => return Err(map_symphonia_error("Decode error", e)),
            };

            let spec = *decoded.spec();
            let packet_channels = spec.channels.count();
            let frames = decoded.frames();

            if *channel_count.get_or_insert(packet_channels) != packet_channels {
                return Err(BeatshiftError::CorruptData {
                    reason: format!(
                        "channel count changed mid-stream ({} -> {})",
                        channel_count.unwrap_or(0),
                        packet_channels
                    ),
                    source: None,
                });
            }
            if *sample_rate.get_or_insert(spec.rate) != spec.rate {
                return Err(BeatshiftError::CorruptData {
                    reason: format!(
                        "sample rate changed mid-stream ({} -> {})",
                        sample_rate.unwrap_or(0),
                        spec.rate
                    ),
                    source: None,
                });
            }

            if frames == 0 {
                continue;
            }

            if channels.is_empty() {
                channels = vec![Vec::new(); packet_channels];
            }

            if packet_buf
                .as_ref()
                .map_or(true, |buf| buf.capacity() < decoded.capacity() * packet_channels)
            {
                packet_buf = Some(PacketBuffer::<f32>::new(decoded.capacity() as u64, spec));
            }
            if let Some(buf) = packet_buf.as_mut() {
                buf.copy_planar_ref(decoded);
                for (channel, plane) in channels.iter_mut().zip(buf.samples().chunks_exact(frames))
                {
                    channel.extend_from_slice(plane);
                }
            }
        }

        let (sample_rate, channel_count) = match (sample_rate, channel_count) {
            (Some(rate), Some(count)) if rate > 0 && count > 0 => (rate, count),
            _ => {
                return Err(BeatshiftError::CorruptData {
                    reason: "stream has no decodable audio and no declared layout".to_string(),
                    source: None,
                })
            }
        };

        if channels.is_empty() {
            channels = vec![Vec::new(); channel_count];
        }

        debug!(
            "Decoded {} frames, {} ch @ {} Hz ({} packets skipped)",
            channels[0].len(),
            channel_count,
            sample_rate,
            skipped_packets
        );

        SampleBuffer::from_channels(channels, sample_rate)
    }
}

/// Sort a symphonia failure into the decode error kinds
fn map_symphonia_error(context: &str, err: SymphoniaError) -> BeatshiftError {
    match err {
        SymphoniaError::Unsupported(what) => BeatshiftError::UnsupportedFormat {
            reason: format!("{}: unsupported {}", context, what),
            source: None,
        },
        other => BeatshiftError::CorruptData {
            reason: format!("{}: {}", context, other),
            source: Some(Box::new(other)),
        },
    }
}
