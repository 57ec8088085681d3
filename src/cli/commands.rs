//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command.

use std::path::Path;

use anyhow::{Context, Result};
use log::{info, warn};

use crate::config::PipelineConfig;
use crate::engine::{read_input_file, SymphoniaDecoder};
use crate::genre::{Genre, GENRE_PROFILES};
use crate::pipeline::{spawn_pipeline, Pipeline, PipelineRequest};

/// Load a configuration file, or the defaults when none is given.
pub fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    match path {
        Some(path) => {
            info!("Loading configuration: {}", path.display());
            PipelineConfig::from_json_file(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))
        }
        None => Ok(PipelineConfig::default()),
    }
}

fn decoder_for(input: &Path) -> SymphoniaDecoder {
    match input.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => SymphoniaDecoder::new().with_extension_hint(ext),
        None => SymphoniaDecoder::new(),
    }
}

/// Retime a file to a genre tempo, layer kicks and write the result as WAV.
pub fn process(
    input: &Path,
    genre: &str,
    output: &Path,
    config_path: Option<&Path>,
    fallback_bpm: Option<u32>,
) -> Result<()> {
    // Reject a bad selector before touching the input file
    let genre: Genre = genre.parse()?;

    let mut config = load_config(config_path)?;
    if let Some(bpm) = fallback_bpm {
        config.tempo.fallback_bpm = Some(bpm);
    }

    let bytes = read_input_file(input, config.max_input_bytes)
        .with_context(|| format!("Failed to read {}", input.display()))?;

    println!("=== Beatshift ===");
    println!("Input: {} ({} bytes)", input.display(), bytes.len());
    println!("Genre: {} ({} BPM)", genre, genre.target_bpm());
    println!("Output: {}", output.display());
    println!();

    let pipeline = Pipeline::with_decoder(config, decoder_for(input))?;
    let handle = spawn_pipeline(pipeline, PipelineRequest::new(bytes, genre))?;
    let result = handle.wait_with(|update| {
        println!("  [{:>3}%] {}", update.percent, update.stage);
    })?;

    result
        .audio
        .write_to(output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    let report = &result.report;
    println!();
    println!("=== Conversion Complete ===");
    println!("Run: {}", report.run_id);
    if report.tempo_fallback {
        warn!("No tempo detected, used fallback {} BPM", report.original_bpm);
        println!("Original tempo: {} BPM (fallback)", report.original_bpm);
    } else {
        println!("Original tempo: {} BPM", report.original_bpm);
    }
    println!("Target tempo: {} BPM", report.target_bpm);
    println!("Stretch factor: {:.4}", report.stretch_factor);
    println!(
        "Frames: {} -> {} ({} ch @ {} Hz)",
        report.input_frames, report.output_frames, report.channel_count, report.sample_rate
    );
    println!("Output saved to: {} ({} bytes)", output.display(), report.output_bytes);
    println!("SHA-256: {}", result.audio.sha256_hex());

    Ok(())
}

/// Estimate the tempo of a file.
pub fn detect_bpm(input: &Path, config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let bytes = read_input_file(input, config.max_input_bytes)
        .with_context(|| format!("Failed to read {}", input.display()))?;

    let pipeline = Pipeline::with_decoder(config, decoder_for(input))?;
    let estimate = pipeline.detect_tempo(&bytes)?;

    println!("File: {}", input.display());
    println!("Tempo: {} BPM", estimate.bpm());
    println!("Peaks: {}", estimate.peak_count());
    if let Some(interval) = estimate.mean_interval() {
        println!("Mean peak interval: {:.1} frames", interval);
    }
    if estimate.is_fallback() {
        println!("(fallback tempo, no beat grid detected)");
    }

    Ok(())
}

/// List the genre table.
pub fn list_genres() -> Result<()> {
    println!("=== Genres ===");
    for profile in &GENRE_PROFILES {
        println!("  {:<10} {:>3} BPM", profile.genre.as_str(), profile.target_bpm);
    }
    Ok(())
}

/// Print the default configuration.
pub fn print_config() -> Result<()> {
    println!("{}", PipelineConfig::default().to_json_pretty()?);
    Ok(())
}
