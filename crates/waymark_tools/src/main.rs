// SPDX-License-Identifier: MIT OR Apache-2.0
//! `waymark` command-line tool.
//!
//! - `check` runs completeness analysis over graph assets before they ship
//! - `run` plays a graph in the sandbox world next to a stock character
//! - `init` writes a default `waymark.ron`
//!
//! Logs go to stderr so `check --json` output stays machine-readable.

mod check;
mod error;
mod run;
mod settings;

use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Waymark graph and state machine tools
#[derive(Parser)]
#[command(name = "waymark")]
#[command(about = "Analyze and play Waymark graphs", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Check graph assets for missing starts, unconnected ports and dead nodes
    Check(check::Check),

    /// Play a graph against the sandbox world
    Run(run::Run),

    /// Write a settings file with default values
    Init(settings::Init),
}

fn main() -> ExitCode {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("waymark=info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Check(cmd) => cmd.execute(),
        Command::Run(cmd) => cmd.execute(),
        Command::Init(cmd) => cmd.execute(),
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::from(2)
        }
    }
}
