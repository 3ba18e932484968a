#!/usr/bin/env rust
//! Callsift CLI - Static-Call Idiom Mining Driver
//!
//! Ranks repositories by static-call usage via the code search API, attributes
//! local occurrences to their enclosing methods and classes, and drives the
//! stub-generation and verification pipeline.

use clap::Parser;
use tracing;

mod cli;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing/logging
    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    // Execute command
    match cli.command {
        Commands::Run(args) => {
            cli::run_command(args).await?;
        }
        Commands::Rank(args) => {
            cli::rank_command(args).await?;
        }
        Commands::Locate(args) => {
            cli::locate_command(args).await?;
        }
        Commands::PrintDefaultConfig => {
            cli::print_default_config().await?;
        }
        Commands::InitConfig(args) => {
            cli::init_config(args).await?;
        }
        Commands::ValidateConfig(args) => {
            cli::validate_config(args).await?;
        }
    }

    Ok(())
}
