//! Audio Engine Module
//!
//! Audio representation and the byte-level edges of the pipeline:
//! - Sample buffer
//! - Decoding encoded bytes into PCM
//! - 16-bit PCM WAV encoding
//! - File I/O and signal generators

pub mod buffer;
pub mod decoder;
pub mod io;
pub mod wav;

pub use buffer::SampleBuffer;
pub use decoder::{AudioDecoder, SymphoniaDecoder};
pub use io::{check_input_size, generate_click_train, generate_test_tone, read_input_file};
pub use wav::{
    check_encodable, sample_to_i16, EncodedAudio, WaveEncoder, MAX_DATA_BYTES, WAV_HEADER_LEN,
};
