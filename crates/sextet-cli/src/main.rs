//! Sextet CLI - offline rendering and configuration for the sextet engine.

mod commands;
mod params;
mod wav;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sextet")]
#[command(author, version, about = "Sextet six-voice synthesizer CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render notes to a WAV file
    Render(commands::render::RenderArgs),

    /// Show or create the engine configuration file
    Config(commands::config::ConfigArgs),

    /// List synthesis parameters accepted by `--set`
    Params,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Render(args) => commands::render::run(args),
        Commands::Config(args) => commands::config::run(args),
        Commands::Params => {
            params::print_params();
            Ok(())
        }
    }
}
