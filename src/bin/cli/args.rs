//! CLI Argument Structures
//!
//! This module contains all CLI argument definitions and command structures
//! used by the callsift binary.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Static-Call Idiom Mining Driver
#[derive(Parser)]
#[command(name = "callsift")]
#[command(version = VERSION)]
#[command(about = "🔎 Callsift - rank repositories by static-call usage and mine call sites")]
#[command(long_about = "
Rank popular repositories by how heavily they use hard-to-test static calls
(DateTime.Now, File.Exists, Guid.NewGuid, ...), clone the winner, attribute
every occurrence to its enclosing method and class, and generate test stubs.

Common Usage:

  # Full pipeline: rank, clone, locate, generate stubs, build, test, record metrics
  callsift run

  # Ranking only, printed as a table
  callsift rank

  # Scan an already-checked-out tree without touching the network
  callsift locate ./cloned_repos/abp

  # Configuration management
  callsift print-default-config
  callsift init-config --output callsift.yml
  callsift validate-config --config callsift.yml
")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full mining pipeline end to end
    Run(RunArgs),

    /// Fetch candidates and rank them by static-call usage
    Rank(RunArgs),

    /// Scan a local directory for static-call occurrences
    Locate(LocateArgs),

    /// Print default configuration in YAML format
    #[command(name = "print-default-config")]
    PrintDefaultConfig,

    /// Initialize a configuration file with defaults
    #[command(name = "init-config")]
    InitConfig(InitConfigArgs),

    /// Validate a callsift configuration file
    #[command(name = "validate-config")]
    ValidateConfig(ValidateConfigArgs),
}

/// Arguments shared by the network-facing commands
#[derive(Args)]
pub struct RunArgs {
    /// Path to a YAML configuration file (defaults are used when omitted)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// Arguments for the offline locate command
#[derive(Args)]
pub struct LocateArgs {
    /// Directory to scan
    pub path: PathBuf,

    /// Path to a YAML configuration file (defaults are used when omitted)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// Arguments for config file initialization
#[derive(Args)]
pub struct InitConfigArgs {
    /// Output path for the configuration file
    #[arg(short, long, default_value = "callsift.yml")]
    pub output: PathBuf,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

/// Arguments for config file validation
#[derive(Args)]
pub struct ValidateConfigArgs {
    /// Configuration file to validate
    #[arg(short, long)]
    pub config: PathBuf,
}
