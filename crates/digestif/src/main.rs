// SPDX-FileCopyrightText: 2026 Digestif Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! digestif - once-daily group chat digests, delivered on schedule.
//!
//! This is the binary entry point for the digestif service.

mod ingest;
mod serve;

use clap::{Parser, Subcommand};

/// digestif - once-daily group chat digests, delivered on schedule.
#[derive(Parser, Debug)]
#[command(name = "digestif", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the digest service.
    Serve,
    /// Print the resolved configuration.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load and validate configuration at startup.
    let config = match digestif_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            digestif_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Commands::Serve) => {
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("digestif: {e}");
                std::process::exit(1);
            }
        }
        Some(Commands::Config) => match toml::to_string_pretty(&config) {
            Ok(rendered) => println!("{rendered}"),
            Err(e) => {
                eprintln!("digestif: could not render config: {e}");
                std::process::exit(1);
            }
        },
        None => {
            println!("digestif: use --help for available commands");
        }
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn binary_loads_config_defaults() {
        // Verify config loads with defaults (no config file needed).
        let config = digestif_config::load_and_validate()
            .expect("default config should be valid");
        assert_eq!(config.agent.name, "digestif");
        assert_eq!(config.digest.default_report_time, "21:00");
    }
}
