// SPDX-FileCopyrightText: 2026 Handover Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Handover - a real-time relay between a messaging webhook and
//! human-agent dashboards.
//!
//! This is the binary entry point.

use clap::{Parser, Subcommand};

mod serve;

/// Handover - agent-presence and chat-handoff relay.
#[derive(Parser, Debug)]
#[command(name = "handover", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the relay server (default).
    Serve,
    /// Load and validate configuration, then exit.
    CheckConfig,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match handover_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            handover_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Commands::CheckConfig) => {
            println!(
                "configuration OK (server {}:{}, database {})",
                config.server.host, config.server.port, config.storage.database_path
            );
        }
        Some(Commands::Serve) | None => {
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        }
    }
}
