//! WaveTile CLI - Command-line interface
//!
//! Fetches animated WMS forecast layers through the tile throttler and
//! manages the configuration file.

mod commands;
mod error;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::config::ConfigCommands;
use commands::fetch::FetchArgs;

#[derive(Parser)]
#[command(name = "wavetile")]
#[command(version)]
#[command(about = "Fetch marine forecast WMS tiles without flooding the tile server", long_about = None)]
struct Cli {
    /// Use this configuration file instead of ~/.wavetile/config.ini
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the tiles of a viewport for one or more forecast time steps
    Fetch(FetchArgs),

    /// Manage the configuration file
    #[command(subcommand)]
    Config(ConfigCommands),
}

fn main() {
    let cli = Cli::parse();
    let config_path = cli
        .config
        .unwrap_or_else(wavetile::config::config_file_path);

    let result = match cli.command {
        Commands::Fetch(args) => commands::fetch::run(args, &config_path),
        Commands::Config(command) => commands::config::run(command, &config_path),
    };

    if let Err(e) = result {
        e.exit();
    }
}
