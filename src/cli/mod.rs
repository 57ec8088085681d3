//! CLI Module
//!
//! Command-line interface for Beatshift.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Beatshift - retime a track to a genre tempo and layer a kick on top
#[derive(Parser, Debug)]
#[command(name = "beatshift-cli")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Detect the tempo, retime to the genre tempo, add kicks and write a WAV
    #[command(name = "process")]
    Process {
        /// Input audio file (WAV, FLAC, MP3 or OGG)
        input: PathBuf,

        /// Target genre: hardstyle, techno, trance, hardbass or lofi
        #[arg(short, long)]
        genre: String,

        /// Output WAV file
        #[arg(short, long, default_value = "converted_audio.wav")]
        output: PathBuf,

        /// Pipeline configuration (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Tempo to assume when none can be detected
        #[arg(long)]
        fallback_bpm: Option<u32>,
    },

    /// Estimate the tempo of a file without converting it
    #[command(name = "detect-bpm")]
    DetectBpm {
        /// Input audio file
        input: PathBuf,

        /// Pipeline configuration (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// List the supported genres and their tempos
    #[command(name = "genres")]
    Genres,

    /// Print the default pipeline configuration as JSON
    #[command(name = "print-config")]
    PrintConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_defaults() {
        let cli = Cli::try_parse_from(["beatshift-cli", "process", "in.mp3", "--genre", "techno"])
            .unwrap();
        match cli.command {
            Some(Commands::Process {
                input,
                genre,
                output,
                config,
                fallback_bpm,
            }) => {
                assert_eq!(input, PathBuf::from("in.mp3"));
                assert_eq!(genre, "techno");
                assert_eq!(output, PathBuf::from("converted_audio.wav"));
                assert!(config.is_none());
                assert!(fallback_bpm.is_none());
            }
            other => panic!("Expected process command, got: {:?}", other),
        }
        assert!(!cli.verbose);
    }

    #[test]
    fn test_global_verbose_and_fallback() {
        let cli = Cli::try_parse_from([
            "beatshift-cli",
            "process",
            "in.wav",
            "-g",
            "lofi",
            "--fallback-bpm",
            "95",
            "--verbose",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert!(matches!(
            cli.command,
            Some(Commands::Process {
                fallback_bpm: Some(95),
                ..
            })
        ));
    }

    #[test]
    fn test_genre_is_required() {
        assert!(Cli::try_parse_from(["beatshift-cli", "process", "in.wav"]).is_err());
    }

    #[test]
    fn test_command_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
