use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "notary")]
#[command(about = "Notary CLI - remote online notarization sessions and co-signing", long_about = None)]
struct Cli {
    /// Path to config.toml (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a complete session end to end and print the result as JSON
    Demo {
        /// Persist sessions and tokens as TOML under this directory
        #[arg(long)]
        data_dir: Option<PathBuf>,
        /// Include the audit records collected from the run
        #[arg(long)]
        audit: bool,
    },
    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Demo { data_dir, audit } => {
            commands::demo::run(cli.config, data_dir, audit).await?
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config::show(cli.config)?,
        },
    }

    Ok(())
}
