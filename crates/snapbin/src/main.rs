// SPDX-FileCopyrightText: 2026 Snapbin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! snapbin - an expiring image host with an asynchronous delete pipeline.
//!
//! This is the binary entry point.

mod serve;
mod shutdown;

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use clap::{Parser, Subcommand};

/// snapbin - an expiring image host with an asynchronous delete pipeline.
#[derive(Parser, Debug)]
#[command(name = "snapbin", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the snapbin API server and task workers.
    Serve,
    /// Print the resolved configuration.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load and validate configuration at startup.
    let config = match snapbin_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            snapbin_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Commands::Serve) => {
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        }
        Some(Commands::Config) => {
            let mut printable = config;
            if printable.auth.jwt_secret.is_some() {
                printable.auth.jwt_secret = Some("[redacted]".to_string());
            }
            match toml::to_string_pretty(&printable) {
                Ok(rendered) => print!("{rendered}"),
                Err(e) => {
                    eprintln!("error: failed to render config: {e}");
                    std::process::exit(1);
                }
            }
        }
        None => {
            println!("snapbin: use --help for available commands");
        }
    }
}
