//! Command Execution Logic
//!
//! This module contains the command implementations for the callsift CLI:
//! pipeline runs, ranking, offline location, and configuration management.

use std::path::Path;

use owo_colors::OwoColorize;

use callsift::core::config::CallsiftConfig;
use callsift::core::pipeline::{MiningPipeline, PipelineOutcome};
use callsift::locator::{OccurrenceLocator, ScanReport};

use crate::cli::args::{InitConfigArgs, LocateArgs, RunArgs, ValidateConfigArgs};

/// Load configuration from an optional YAML file, falling back to defaults.
pub fn load_configuration(path: Option<&Path>) -> anyhow::Result<CallsiftConfig> {
    let config = match path {
        Some(path) => CallsiftConfig::from_yaml_file(path)?,
        None => CallsiftConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

/// Run the full mining pipeline end to end.
pub async fn run_command(args: RunArgs) -> anyhow::Result<()> {
    let config = load_configuration(args.config.as_deref())?;
    let pipeline = MiningPipeline::new(config)?;

    println!("{}", "🔎 Running mining pipeline...".bright_blue().bold());
    let outcome = pipeline.run().await?;
    display_outcome(&outcome);

    Ok(())
}

/// Fetch candidates and rank them, without cloning anything.
pub async fn rank_command(args: RunArgs) -> anyhow::Result<()> {
    let config = load_configuration(args.config.as_deref())?;
    let pipeline = MiningPipeline::new(config)?;

    println!("{}", "🔎 Ranking candidate repositories...".bright_blue().bold());
    let ranked = pipeline.rank_candidates().await?;
    display_ranking(&ranked);

    Ok(())
}

/// Scan a local directory for static-call occurrences.
///
/// Builds the locator directly so no API token is needed for offline scans.
pub async fn locate_command(args: LocateArgs) -> anyhow::Result<()> {
    let config = load_configuration(args.config.as_deref())?;
    let locator = OccurrenceLocator::new(&config.locator)?;

    let report = locator.scan_directory(&args.path);
    display_scan_report(&args.path, &report);

    Ok(())
}

/// Print default configuration in YAML format.
pub async fn print_default_config() -> anyhow::Result<()> {
    println!("{}", "# Default callsift configuration".dimmed());
    println!(
        "{}",
        "# Save this to a file and customize as needed".dimmed()
    );
    println!("{}", "# Usage: callsift run --config your-config.yml".dimmed());
    println!();

    let config = CallsiftConfig::default();
    let yaml_output = serde_yaml::to_string(&config)?;
    println!("{}", yaml_output);

    Ok(())
}

/// Initialize a configuration file with defaults.
pub async fn init_config(args: InitConfigArgs) -> anyhow::Result<()> {
    // Check if file exists and force not specified
    if args.output.exists() && !args.force {
        return Err(anyhow::anyhow!(
            "Configuration file already exists: {}. Use --force to overwrite or choose a different name with --output",
            args.output.display()
        ));
    }

    let config = CallsiftConfig::default();
    config.to_yaml_file(&args.output)?;

    println!(
        "{} {}",
        "✅ Configuration saved to:".bright_green().bold(),
        args.output.display().to_string().cyan()
    );
    println!();
    println!("{}", "📝 Next steps:".bright_blue().bold());
    println!("   1. Edit the configuration file to customize queries and windows");
    println!(
        "   2. Export {} so the search client can authenticate",
        callsift::core::config::TOKEN_ENV_VAR.cyan()
    );
    println!(
        "   3. Run the pipeline with: {}",
        format!("callsift run --config {}", args.output.display()).cyan()
    );

    Ok(())
}

/// Validate a callsift configuration file.
pub async fn validate_config(args: ValidateConfigArgs) -> anyhow::Result<()> {
    println!(
        "{} {}",
        "🔍 Validating configuration:".bright_blue().bold(),
        args.config.display().to_string().cyan()
    );
    println!();

    let config = match load_configuration(Some(&args.config)) {
        Ok(config) => {
            println!(
                "{}",
                "✅ Configuration file is valid!".bright_green().bold()
            );
            println!();
            config
        }
        Err(e) => {
            eprintln!("{} {}", "❌ Configuration validation failed:".red(), e);
            println!();
            println!("{}", "🔧 Common issues:".bright_blue().bold());
            println!("   • Check YAML syntax (indentation, colons, quotes)");
            println!("   • Verify all required fields are present");
            println!("   • Ensure windows, retries, and timeouts are nonzero");
            println!();
            println!(
                "{}",
                "💡 Tip: Use 'callsift print-default-config' to see valid format".dimmed()
            );
            return Err(anyhow::anyhow!("Configuration validation failed: {}", e));
        }
    };

    println!("{}", "📋 Summary".bright_blue().bold());
    println!("   Candidates fetched: {}", config.search.candidate_count);
    println!("   Query groups:       {}", config.search.query_groups.len());
    println!("   Retries per repo:   {}", config.search.max_retries);
    println!("   Top-k selection:    {}", config.search.top_k);
    println!(
        "   Locator windows:    {} / {} lines",
        config.locator.method_window, config.locator.class_window
    );

    Ok(())
}

fn display_ranking(ranked: &[(String, u64)]) {
    println!();
    println!("{}", "📊 Repositories by static-call usage".bright_blue().bold());
    for (rank, (repo, total)) in ranked.iter().enumerate() {
        let line = format!("{:>4}. {:<50} {:>8}", rank + 1, repo, total);
        if *total > 0 {
            println!("{}", line);
        } else {
            println!("{}", line.dimmed());
        }
    }
}

fn display_scan_report(root: &Path, report: &ScanReport) {
    println!();
    println!(
        "{} {}",
        "📁 Scanned".bright_blue().bold(),
        root.display().to_string().cyan()
    );
    println!(
        "   Files with occurrences: {}",
        report.files_with_occurrences().to_string().bright_green()
    );
    for (pattern, count) in &report.pattern_file_counts {
        println!("   {:<20} {} files", pattern, count);
    }
    for file in &report.files {
        println!();
        println!("   {}", file.path.display().to_string().cyan());
        for attribution in &file.attributions {
            let kind = if attribution.is_static { "static" } else { "instance" };
            println!(
                "     {}.{}({}) [{}]",
                attribution.class_name, attribution.method_name, attribution.parameter_list, kind
            );
        }
    }
}

fn display_outcome(outcome: &PipelineOutcome) {
    println!();
    println!("{}", "🏁 Pipeline complete".bright_green().bold());

    match &outcome.top_repository {
        Some(repo) => println!("   Top repository:     {}", repo.cyan()),
        None => {
            println!(
                "{}",
                "   No repository had positive static-call usage.".yellow()
            );
            return;
        }
    }

    println!("   Files with calls:   {}", outcome.files_with_occurrences);
    println!("   Stubs generated:    {}", outcome.stubs_generated);
    println!(
        "   Build:              {}",
        status_colored(outcome.build_status.as_str())
    );
    println!(
        "   Test:               {}",
        status_colored(outcome.test_status.as_str())
    );
    println!("   Failing tests:      {}", outcome.failing_tests);
    println!(
        "   Coverage:           {} -> {}",
        coverage_display(outcome.initial_coverage),
        coverage_display(outcome.final_coverage)
    );
}

fn status_colored(status: &str) -> String {
    match status {
        "PASS" => status.bright_green().to_string(),
        "FAIL" => status.red().to_string(),
        _ => status.dimmed().to_string(),
    }
}

fn coverage_display(value: Option<f64>) -> String {
    match value {
        Some(pct) => format!("{pct:.1}%"),
        None => "N/A".to_string(),
    }
}
