//! Engine configuration commands.

use clap::{Args, Subcommand};
use sextet_config::EngineConfig;
use std::path::PathBuf;

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the effective engine configuration as TOML
    Show {
        /// Config file to read (defaults to the user config)
        #[arg(long, value_name = "FILE")]
        path: Option<PathBuf>,
    },

    /// Write a default configuration file
    Init {
        /// Destination (defaults to the user config location)
        #[arg(long, value_name = "FILE")]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

pub fn run(args: ConfigArgs) -> anyhow::Result<()> {
    match args.command {
        ConfigCommand::Show { path } => {
            let (config, source) = match path {
                Some(path) => (EngineConfig::load(&path)?, path.display().to_string()),
                None => {
                    let source = EngineConfig::default_path()
                        .ok()
                        .filter(|p| p.is_file())
                        .map_or_else(|| "built-in defaults".to_string(), |p| p.display().to_string());
                    (EngineConfig::load_or_default()?, source)
                }
            };
            println!("# source: {}", source);
            print!("{}", config.to_toml_string()?);
        }

        ConfigCommand::Init { path, force } => {
            let path = match path {
                Some(path) => path,
                None => EngineConfig::default_path()?,
            };
            if path.exists() && !force {
                anyhow::bail!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                );
            }
            EngineConfig::default().save(&path)?;
            tracing::info!(path = %path.display(), "wrote default engine config");
            println!("Wrote default config to {}", path.display());
        }
    }

    Ok(())
}
