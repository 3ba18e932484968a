//! Persisted run metrics: one append-only CSV row per pipeline run.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use tracing::info;

use crate::core::errors::{CallsiftError, Result};

/// Pass/fail status for a collaborator step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// The step completed with exit code zero
    Pass,
    /// The step failed or never completed
    Fail,
    /// The step was never reached
    Skipped,
}

impl RunStatus {
    /// CSV and display label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Fail => "FAIL",
            Self::Skipped => "SKIPPED",
        }
    }

    /// Status from a process success flag.
    pub fn from_success(success: bool) -> Self {
        if success {
            Self::Pass
        } else {
            Self::Fail
        }
    }
}

/// One run's metrics.
#[derive(Debug, Clone)]
pub struct MetricsRow {
    /// Run timestamp
    pub timestamp: DateTime<Utc>,

    /// Files containing at least one static-call occurrence
    pub files_with_static_calls: usize,

    /// Test stubs generated this run
    pub stubs_generated: usize,

    /// Build step status
    pub build_status: RunStatus,

    /// Test step status
    pub test_status: RunStatus,

    /// Failing tests reported by the test runner
    pub failing_tests: u64,

    /// Coverage before the generated stubs ran
    pub initial_coverage: Option<f64>,

    /// Coverage after the generated stubs ran
    pub final_coverage: Option<f64>,

    /// Files containing each pattern, in pattern order
    pub pattern_file_counts: IndexMap<String, usize>,
}

/// Append-only CSV metrics log.
#[derive(Debug, Clone)]
pub struct MetricsLog {
    path: PathBuf,
}

impl MetricsLog {
    /// Create a log writer targeting `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Destination path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one row, writing the header only when the destination is empty.
    pub fn append(&self, row: &MetricsRow) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| {
                CallsiftError::io(
                    format!("Failed to open metrics log {}", self.path.display()),
                    e,
                )
            })?;

        let is_empty = file
            .metadata()
            .map(|meta| meta.len() == 0)
            .unwrap_or(true);

        if is_empty {
            writeln!(file, "{}", header(row)).map_err(|e| {
                CallsiftError::io("Failed to write metrics header", e)
            })?;
        }

        writeln!(file, "{}", render(row)).map_err(|e| {
            CallsiftError::io("Failed to write metrics row", e)
        })?;

        info!("metrics saved to {}", self.path.display());
        Ok(())
    }
}

fn header(row: &MetricsRow) -> String {
    let mut fields = vec![
        "timestamp".to_string(),
        "files_with_static_calls".to_string(),
        "stubs_generated".to_string(),
        "build_status".to_string(),
        "test_status".to_string(),
        "failing_tests".to_string(),
        "initial_coverage".to_string(),
        "final_coverage".to_string(),
    ];
    for pattern in row.pattern_file_counts.keys() {
        fields.push(format!("files_with_{}", pattern.replace('.', "_")));
    }
    fields.join(",")
}

fn render(row: &MetricsRow) -> String {
    let mut fields = vec![
        row.timestamp.to_rfc3339(),
        row.files_with_static_calls.to_string(),
        row.stubs_generated.to_string(),
        row.build_status.as_str().to_string(),
        row.test_status.as_str().to_string(),
        row.failing_tests.to_string(),
        coverage_field(row.initial_coverage),
        coverage_field(row.final_coverage),
    ];
    for count in row.pattern_file_counts.values() {
        fields.push(count.to_string());
    }
    fields.join(",")
}

fn coverage_field(coverage: Option<f64>) -> String {
    coverage.map_or_else(|| "N/A".to_string(), |c| format!("{c:.1}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row() -> MetricsRow {
        let mut pattern_file_counts = IndexMap::new();
        pattern_file_counts.insert("DateTime.Now".to_string(), 12);
        pattern_file_counts.insert("Guid.NewGuid".to_string(), 3);

        MetricsRow {
            timestamp: Utc::now(),
            files_with_static_calls: 15,
            stubs_generated: 20,
            build_status: RunStatus::Pass,
            test_status: RunStatus::Fail,
            failing_tests: 4,
            initial_coverage: Some(41.7),
            final_coverage: None,
            pattern_file_counts,
        }
    }

    #[test]
    fn header_written_only_when_empty() {
        let dir = tempfile::tempdir().unwrap();
        let log = MetricsLog::new(dir.path().join("metrics.csv"));

        log.append(&sample_row()).unwrap();
        log.append(&sample_row()).unwrap();

        let content = std::fs::read_to_string(log.path()).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("timestamp,files_with_static_calls"));
        assert_eq!(
            content.matches("timestamp,files_with_static_calls").count(),
            1
        );
    }

    #[test]
    fn pattern_columns_use_underscored_names() {
        let row = sample_row();
        let header = header(&row);
        assert!(header.ends_with("files_with_DateTime_Now,files_with_Guid_NewGuid"));
    }

    #[test]
    fn row_renders_statuses_and_sentinel_coverage() {
        let row = sample_row();
        let rendered = render(&row);
        assert!(rendered.contains("PASS,FAIL,4,41.7,N/A"));
        assert!(rendered.ends_with("12,3"));
    }
}
