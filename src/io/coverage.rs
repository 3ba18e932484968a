//! Best-effort extraction from collaborator report documents.
//!
//! The coverage report is a fixed-shape HTML document produced by an external
//! tool; the overall percentage is the first percentage-shaped token in it.
//! This is explicitly a token scan, not a schema-validated parse, and the
//! same goes for the failing-test count pulled from test-runner output.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use tracing::{info, warn};

fn decimal_percent() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+\.\d+)%").expect("decimal percent regex is valid"))
}

fn integer_percent() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+)%").expect("integer percent regex is valid"))
}

fn failed_summary() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"Failed!\s*-\s*Failed:\s*(\d+)").expect("failed summary regex is valid")
    })
}

/// Extract the first percentage-shaped token from report text.
///
/// Decimal percentages ("43.2%") are preferred; a bare integer percentage is
/// the fallback. `None` when the document contains neither.
pub fn extract_coverage(text: &str) -> Option<f64> {
    if let Some(caps) = decimal_percent().captures(text) {
        return caps[1].parse().ok();
    }
    if let Some(caps) = integer_percent().captures(text) {
        return caps[1].parse().ok();
    }
    None
}

/// Extract coverage from a report file, tolerating absence and bad bytes.
pub fn extract_coverage_from_file(path: &Path) -> Option<f64> {
    if !path.exists() {
        warn!("coverage report not found: {}", path.display());
        return None;
    }

    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!("failed to read coverage report {}: {err}", path.display());
            return None;
        }
    };

    let text = String::from_utf8_lossy(&bytes);
    match extract_coverage(&text) {
        Some(coverage) => {
            info!(coverage, "extracted coverage from {}", path.display());
            Some(coverage)
        }
        None => {
            warn!("no percentage token in coverage report {}", path.display());
            None
        }
    }
}

/// Sum the failing-test counts reported in test-runner output.
///
/// The runner prints one `Failed!  - Failed:     N, Passed: ...` summary per
/// test assembly; totals are summed across all of them.
pub fn count_failing_tests(output: &str) -> u64 {
    failed_summary()
        .captures_iter(output)
        .filter_map(|caps| caps[1].parse::<u64>().ok())
        .sum()
}
