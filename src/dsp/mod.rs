//! DSP stages
//!
//! The three signal-processing steps of the pipeline, in run order:
//! tempo estimation → tempo stretch → kick layering.

mod layer;
mod resample;
mod tempo;

pub use layer::{synthesize_kick, SampleLayerer};
pub use resample::{stretch_factor, stretched_len, Interpolation, Resampler};
pub use tempo::{TempoEstimate, TempoEstimator};
