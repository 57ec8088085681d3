//! Pipeline configuration
//!
//! The magic numbers of the pipeline (peak threshold, kick shape, input limit)
//! live here as defaults. Configuration files are JSON; every field is optional.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::dsp::Interpolation;
use crate::error::{BeatshiftError, Result};

/// Default amplitude a local maximum must exceed to count as a peak
pub const DEFAULT_PEAK_THRESHOLD: f32 = 0.1;

/// Default kick frequency (50 Hz)
pub const DEFAULT_KICK_FREQUENCY_HZ: f32 = 50.0;

/// Default kick length (100ms)
pub const DEFAULT_KICK_DURATION_SECS: f32 = 0.1;

/// Default kick mix gain
pub const DEFAULT_KICK_GAIN: f32 = 0.5;

/// Default input size limit (20 MiB)
pub const DEFAULT_MAX_INPUT_BYTES: usize = 20 * 1024 * 1024;

/// Tempo estimation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TempoConfig {
    /// Minimum amplitude for a local maximum to count as a peak
    pub peak_threshold: f32,
    /// Tempo to use when too few peaks are found (None = fail the run)
    pub fallback_bpm: Option<u32>,
}

impl Default for TempoConfig {
    fn default() -> Self {
        Self {
            peak_threshold: DEFAULT_PEAK_THRESHOLD,
            fallback_bpm: None,
        }
    }
}

/// Tempo stretch settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResampleConfig {
    pub interpolation: Interpolation,
}

/// Synthesized kick settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KickConfig {
    pub frequency_hz: f32,
    pub duration_secs: f32,
    pub gain: f32,
}

impl Default for KickConfig {
    fn default() -> Self {
        Self {
            frequency_hz: DEFAULT_KICK_FREQUENCY_HZ,
            duration_secs: DEFAULT_KICK_DURATION_SECS,
            gain: DEFAULT_KICK_GAIN,
        }
    }
}

/// Complete pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub tempo: TempoConfig,
    pub resample: ResampleConfig,
    pub kick: KickConfig,
    /// Largest accepted input in bytes (None = unlimited)
    pub max_input_bytes: Option<usize>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            tempo: TempoConfig::default(),
            resample: ResampleConfig::default(),
            kick: KickConfig::default(),
            max_input_bytes: Some(DEFAULT_MAX_INPUT_BYTES),
        }
    }
}

impl PipelineConfig {
    /// Parse a configuration from a JSON string and validate it
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a JSON file and validate it
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                BeatshiftError::FileNotFound {
                    path: path.display().to_string(),
                    source: Some(e),
                }
            } else {
                BeatshiftError::Io(e)
            }
        })?;
        Self::from_json_str(&json)
    }

    /// Serialize to pretty JSON
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values the pipeline cannot work with
    pub fn validate(&self) -> Result<()> {
        let threshold = self.tempo.peak_threshold;
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(invalid(format!(
                "tempo.peak_threshold must be a finite non-negative number, got {}",
                threshold
            )));
        }
        if self.tempo.fallback_bpm == Some(0) {
            return Err(invalid("tempo.fallback_bpm must be positive".to_string()));
        }

        let kick = &self.kick;
        if !kick.frequency_hz.is_finite() || kick.frequency_hz <= 0.0 {
            return Err(invalid(format!(
                "kick.frequency_hz must be positive, got {}",
                kick.frequency_hz
            )));
        }
        if !kick.duration_secs.is_finite() || kick.duration_secs <= 0.0 {
            return Err(invalid(format!(
                "kick.duration_secs must be positive, got {}",
                kick.duration_secs
            )));
        }
        if !kick.gain.is_finite() || kick.gain < 0.0 {
            return Err(invalid(format!(
                "kick.gain must be a finite non-negative number, got {}",
                kick.gain
            )));
        }

        if self.max_input_bytes == Some(0) {
            return Err(invalid("max_input_bytes must be positive".to_string()));
        }

        Ok(())
    }
}

fn invalid(reason: String) -> BeatshiftError {
    BeatshiftError::InvalidConfig { reason }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.tempo.peak_threshold, 0.1);
        assert_eq!(config.tempo.fallback_bpm, None);
        assert_eq!(config.kick.frequency_hz, 50.0);
        assert_eq!(config.kick.duration_secs, 0.1);
        assert_eq!(config.kick.gain, 0.5);
        assert_eq!(config.resample.interpolation, Interpolation::Linear);
        assert_eq!(config.max_input_bytes, Some(20 * 1024 * 1024));
        config.validate().unwrap();
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config =
            PipelineConfig::from_json_str(r#"{ "tempo": { "fallback_bpm": 128 } }"#).unwrap();
        assert_eq!(config.tempo.fallback_bpm, Some(128));
        assert_eq!(config.tempo.peak_threshold, DEFAULT_PEAK_THRESHOLD);
        assert_eq!(config.kick, KickConfig::default());
    }

    #[test]
    fn test_json_round_trip() {
        let mut config = PipelineConfig::default();
        config.resample.interpolation = Interpolation::Nearest;
        config.max_input_bytes = None;

        let json = config.to_json_pretty().unwrap();
        assert!(json.contains("\"nearest\""));
        assert_eq!(PipelineConfig::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = PipelineConfig::default();
        config.kick.duration_secs = 0.0;
        assert!(matches!(
            config.validate(),
            Err(BeatshiftError::InvalidConfig { .. })
        ));

        let mut config = PipelineConfig::default();
        config.tempo.peak_threshold = f32::NAN;
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.tempo.fallback_bpm = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_json_is_serialization_error() {
        let result = PipelineConfig::from_json_str("{ not json");
        assert!(matches!(result, Err(BeatshiftError::Serialization(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = PipelineConfig::from_json_file(Path::new("/nonexistent/beatshift.json"));
        match result {
            Err(BeatshiftError::FileNotFound { path, .. }) => {
                assert!(path.contains("nonexistent"))
            }
            other => panic!("Expected FileNotFound error, got: {:?}", other),
        }
    }
}
