//! Gram CLI
//!
//! Compiles recipe document trees into resolved JSON models.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

/// Gram - recipe language compiler
#[derive(Parser)]
#[command(name = "gram")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file or project directory (defaults to ./gram.yaml when present)
    #[arg(short, long, global = true, env = "GRAM_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a recipe document to JSON
    Compile {
        /// Document tree (.json, .yaml or .yml)
        file: PathBuf,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Single-line JSON
        #[arg(long)]
        compact: bool,
    },

    /// Compile and report warnings
    Check {
        /// Document tree (.json, .yaml or .yml)
        file: PathBuf,

        /// Fail when any warning is raised
        #[arg(long)]
        strict: bool,
    },

    /// Print the consolidated shopping list
    Shopping {
        /// Document tree (.json, .yaml or .yml)
        file: PathBuf,
    },

    /// Compile every document under a directory
    Batch {
        /// Directory to walk
        dir: PathBuf,

        /// Output directory (defaults to <DIR>/compiled)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; stdout is reserved for command output
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = cli.config.as_deref();
    match cli.command {
        Commands::Compile {
            file,
            output,
            compact,
        } => {
            commands::compile::run(config, &file, output.as_deref(), compact)?;
        }
        Commands::Check { file, strict } => {
            commands::check::run(config, &file, strict)?;
        }
        Commands::Shopping { file } => {
            commands::shopping::run(config, &file)?;
        }
        Commands::Batch { dir, output } => {
            commands::batch::run(config, &dir, output.as_deref())?;
        }
    }

    Ok(())
}
