//! Beatshift CLI
//!
//! Command-line interface for the Beatshift retiming pipeline.

use clap::Parser;
use env_logger::Env;
use log::info;

use beatshift::cli::{commands, Cli, Commands};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    info!("Beatshift v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Some(cmd) => handle_command(cmd),
        None => {
            println!("Beatshift v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for available commands");
            Ok(())
        }
    }
}

fn handle_command(cmd: Commands) -> anyhow::Result<()> {
    match cmd {
        Commands::Process {
            input,
            genre,
            output,
            config,
            fallback_bpm,
        } => commands::process(&input, &genre, &output, config.as_deref(), fallback_bpm),
        Commands::DetectBpm { input, config } => commands::detect_bpm(&input, config.as_deref()),
        Commands::Genres => commands::list_genres(),
        Commands::PrintConfig => commands::print_config(),
    }
}
