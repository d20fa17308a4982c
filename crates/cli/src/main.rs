//! Marker Index CLI
//!
//! ## Commands
//!
//! - `scan`  - Index a template tree and print one view as JSON
//! - `check` - Print diagnostics; exit 1 when any translation is in error
//! - `watch` - Keep the index live and log diagnostics on every change
//!
//! Logs go to stderr (`RUST_LOG` overrides the default `info` filter); stdout
//! carries command output only.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod command;

use command::domain::ViewKind;
use command::CommandHandler;

#[derive(Parser, Debug)]
#[command(name = "marker-index", version, about = "Live index of i18n markers in templates")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Index a template tree and print one view as JSON
    Scan {
        /// Corpus root
        root: PathBuf,
        /// Config file (defaults to <ROOT>/.marker-index.toml when present)
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = ViewKind::Validated)]
        view: ViewKind,
    },
    /// Print diagnostics and exit with status 1 if any translation is in error
    Check {
        root: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
        /// Emit diagnostics as JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Keep the index live and report diagnostics on every change
    Watch {
        root: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let cli = Cli::parse();
    let handler = CommandHandler::new();

    let exit_code = match cli.command {
        Commands::Scan { root, config, view } => handler.scan(&root, config.as_deref(), view).await?,
        Commands::Check { root, config, json } => {
            handler.check(&root, config.as_deref(), json).await?
        }
        Commands::Watch { root, config } => handler.watch(&root, config.as_deref()).await?,
    };

    if exit_code != 0 {
        std::process::exit(exit_code);
    }
    Ok(())
}
