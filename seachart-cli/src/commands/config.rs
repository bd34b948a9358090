//! Configuration management CLI commands.
//!
//! Provides `config show`, `config path` and `config init`.

use clap::Subcommand;
use seachart::config::ConfigFile;

use super::common::GlobalArgs;
use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration, including command-line overrides
    Show,

    /// Show the configuration file path
    Path,

    /// Write a configuration file with default settings
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Run a config subcommand.
pub fn run(global: &GlobalArgs, command: ConfigCommands) -> Result<(), CliError> {
    match command {
        ConfigCommands::Show => {
            let config = global.load_config()?;
            print!("{}", config.to_ini_string());
            Ok(())
        }
        ConfigCommands::Path => {
            println!("{}", global.config_path().display());
            Ok(())
        }
        ConfigCommands::Init { force } => run_init(global, force),
    }
}

fn run_init(global: &GlobalArgs, force: bool) -> Result<(), CliError> {
    let path = global.config_path();
    if path.exists() && !force {
        println!("Configuration already exists: {}", path.display());
        println!("Use --force to overwrite it with defaults.");
        return Ok(());
    }

    ConfigFile::default().save_to(&path)?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}
