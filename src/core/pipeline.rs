//! End-to-end mining pipeline.
//!
//! Composes the ranking crawler with the occurrence locator and the external
//! collaborators: candidate fetch, score and rank, select the top repository,
//! clone it, attribute every static-call occurrence, generate test stubs,
//! run the build and test scripts, extract coverage, and append a metrics
//! row. Per-unit failures downstream of ranking are logged and dropped; only
//! a failed candidate fetch aborts the run.

use std::path::Path;

use chrono::Utc;
use tracing::{info, warn};

use crate::core::backoff::SharedBackoff;
use crate::core::config::CallsiftConfig;
use crate::core::errors::Result;
use crate::io::coverage::{count_failing_tests, extract_coverage_from_file};
use crate::io::metrics::{MetricsLog, MetricsRow, RunStatus};
use crate::io::runner::{write_transcript, CommandRunner};
use crate::io::stubgen::StubGenerator;
use crate::locator::{OccurrenceLocator, ScanReport};
use crate::search::client::SearchClient;
use crate::search::ranker::{select_top, RepositoryRanker};

/// Final state of one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    /// Every scored candidate, descending by total
    pub ranked: Vec<(String, u64)>,

    /// Selected repositories with positive totals, at most `top_k`
    pub selected: Vec<String>,

    /// The repository that was cloned and analyzed, when any qualified
    pub top_repository: Option<String>,

    /// Files in the top repository containing at least one occurrence
    pub files_with_occurrences: usize,

    /// Test stubs generated
    pub stubs_generated: usize,

    /// Build step status
    pub build_status: RunStatus,

    /// Test step status
    pub test_status: RunStatus,

    /// Failing tests reported by the test runner
    pub failing_tests: u64,

    /// Coverage before and after the generated stubs ran
    pub initial_coverage: Option<f64>,
    /// Coverage extracted after the test step
    pub final_coverage: Option<f64>,
}

/// Driver composing ranking, location, stub generation, and metrics.
pub struct MiningPipeline {
    config: CallsiftConfig,
    client: SearchClient,
    locator: OccurrenceLocator,
    runner: CommandRunner,
}

impl MiningPipeline {
    /// Build a pipeline from a validated configuration.
    pub fn new(config: CallsiftConfig) -> Result<Self> {
        config.validate()?;
        let client = SearchClient::new(&config.api)?;
        let locator = OccurrenceLocator::new(&config.locator)?;
        let runner = CommandRunner::new(config.runner.command_timeout_secs);

        Ok(Self {
            config,
            client,
            locator,
            runner,
        })
    }

    /// Fetch candidates and rank them by static-call usage.
    pub async fn rank_candidates(&self) -> Result<Vec<(String, u64)>> {
        let candidates = self
            .client
            .search_repositories(
                &self.config.search.repository_query,
                self.config.search.candidate_count,
            )
            .await?;
        info!(count = candidates.len(), "fetched candidate repositories");

        let backoff = SharedBackoff::new(self.config.search.backoff.build());
        let ranker = RepositoryRanker::new(&self.client, backoff, self.config.search.max_retries);
        Ok(ranker.rank(&candidates, &self.config.search.query_groups).await)
    }

    /// Run the complete mining pipeline.
    pub async fn run(&self) -> Result<PipelineOutcome> {
        let ranked = self.rank_candidates().await?;
        let selected = select_top(&ranked, self.config.search.top_k);

        let mut outcome = PipelineOutcome {
            ranked,
            selected: selected.clone(),
            top_repository: None,
            files_with_occurrences: 0,
            stubs_generated: 0,
            build_status: RunStatus::Skipped,
            test_status: RunStatus::Skipped,
            failing_tests: 0,
            initial_coverage: None,
            final_coverage: None,
        };

        let Some(top) = selected.first() else {
            warn!("no repository with positive static-call usage; nothing to analyze");
            return Ok(outcome);
        };
        outcome.top_repository = Some(top.clone());

        let repo_path = self
            .runner
            .clone_repository(&self.config.runner.clones_dir, top)
            .await?;

        let scan = self.locator.scan_directory(&repo_path);
        outcome.files_with_occurrences = scan.files_with_occurrences();
        if scan.files.is_empty() {
            warn!(repo = %top, "no local occurrences found; skipping stub generation and build");
            self.record_metrics(&scan, &outcome)?;
            return Ok(outcome);
        }

        outcome.initial_coverage =
            extract_coverage_from_file(&repo_path.join(&self.config.output.coverage_report));

        outcome.stubs_generated = self.generate_stubs(&repo_path, &scan);
        info!(stubs = outcome.stubs_generated, "generated test stubs");

        let build = self.run_script(&repo_path, &self.config.runner.build_script, "build").await;
        outcome.build_status = RunStatus::from_success(build.success());

        let test = self.run_script(&repo_path, &self.config.runner.test_script, "test").await;
        outcome.test_status = RunStatus::from_success(test.success());
        // Failure summaries ride on stdout even when the runner exits nonzero
        outcome.failing_tests = count_failing_tests(&test.stdout);

        outcome.final_coverage =
            extract_coverage_from_file(&repo_path.join(&self.config.output.coverage_report));

        self.record_metrics(&scan, &outcome)?;
        Ok(outcome)
    }

    fn generate_stubs(&self, repo_path: &Path, scan: &ScanReport) -> usize {
        let generator =
            StubGenerator::new(repo_path.join(&self.config.output.generated_tests_dir));

        let mut generated = 0;
        for file in &scan.files {
            for attribution in &file.attributions {
                match generator.write_stub(&file.path, attribution) {
                    Ok(_) => generated += 1,
                    Err(err) => {
                        warn!(
                            file = %file.path.display(),
                            "failed to write stub: {err}"
                        );
                    }
                }
            }
        }
        generated
    }

    async fn run_script(
        &self,
        repo_path: &Path,
        script: &Path,
        step: &str,
    ) -> crate::io::runner::CommandOutput {
        let script_path = repo_path.join(script);
        info!(step, script = %script_path.display(), "running collaborator script");

        let output = self
            .runner
            .run("pwsh", &["-File", &script_path.to_string_lossy()], repo_path)
            .await;

        if let Err(err) = write_transcript(&self.config.runner.logs_dir, step, &output) {
            warn!(step, "failed to write transcript: {err}");
        }

        if output.success() {
            info!(step, "collaborator step succeeded");
        } else {
            warn!(step, exit_code = output.exit_code, "collaborator step failed");
        }
        output
    }

    fn record_metrics(&self, scan: &ScanReport, outcome: &PipelineOutcome) -> Result<()> {
        let row = MetricsRow {
            timestamp: Utc::now(),
            files_with_static_calls: outcome.files_with_occurrences,
            stubs_generated: outcome.stubs_generated,
            build_status: outcome.build_status,
            test_status: outcome.test_status,
            failing_tests: outcome.failing_tests,
            initial_coverage: outcome.initial_coverage,
            final_coverage: outcome.final_coverage,
            pattern_file_counts: scan.pattern_file_counts.clone(),
        };

        MetricsLog::new(&self.config.output.metrics_path).append(&row)
    }
}
