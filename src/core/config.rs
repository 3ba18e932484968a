//! Configuration types and management for callsift.
//!
//! Every section carries a `Default` that reproduces the canonical mining
//! setup (the C# static-call idioms, the conservative 5s pacing floor) and a
//! `validate()` that rejects values the crawler cannot operate with.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::backoff::{AdaptiveBackoff, INCREMENT_STEP_SECS, INITIAL_DELAY_SECS, MAX_INCREMENTS};
use crate::core::errors::{CallsiftError, Result};

/// Environment variable consulted when no API token is configured.
pub const TOKEN_ENV_VAR: &str = "GITHUB_TOKEN";

/// Main configuration for the callsift mining engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallsiftConfig {
    /// Remote search API settings
    pub api: ApiConfig,

    /// Repository ranking crawler settings
    pub search: SearchConfig,

    /// Occurrence locator settings
    pub locator: LocatorConfig,

    /// External build/test runner settings
    pub runner: RunnerConfig,

    /// Stub generation and metrics output settings
    pub output: OutputConfig,
}

impl Default for CallsiftConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            search: SearchConfig::default(),
            locator: LocatorConfig::default(),
            runner: RunnerConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl CallsiftConfig {
    /// Validate the complete configuration.
    pub fn validate(&self) -> Result<()> {
        self.api.validate()?;
        self.search.validate()?;
        self.locator.validate()?;
        self.runner.validate()?;
        Ok(())
    }

    /// Load configuration from a YAML file.
    pub fn from_yaml_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| {
            CallsiftError::io(format!("Failed to read config file: {}", path.display()), e)
        })?;

        serde_yaml::from_str(&content).map_err(Into::into)
    }

    /// Save configuration to a YAML file.
    pub fn to_yaml_file(&self, path: impl Into<PathBuf>) -> Result<()> {
        let path = path.into();
        let content = serde_yaml::to_string(self)?;
        std::fs::write(&path, content).map_err(|e| {
            CallsiftError::io(
                format!("Failed to write config file: {}", path.display()),
                e,
            )
        })
    }
}

/// Remote search API access settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the search API
    pub base_url: String,

    /// Access token; falls back to the `GITHUB_TOKEN` environment variable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.github.com".to_string(),
            token: None,
        }
    }
}

impl ApiConfig {
    /// Validate API settings.
    pub fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(CallsiftError::config_field(
                "base_url must not be empty",
                "api.base_url",
            ));
        }
        Ok(())
    }

    /// Resolve the access token from the config or the environment.
    ///
    /// The documented placeholder value is rejected the same as an absent
    /// token, so a copied sample config fails loudly instead of producing
    /// 401 responses mid-crawl.
    pub fn resolved_token(&self) -> Result<String> {
        let token = match &self.token {
            Some(token) => token.clone(),
            None => std::env::var(TOKEN_ENV_VAR).unwrap_or_default(),
        };

        if token.is_empty() || token == "your_github_token_here" {
            return Err(CallsiftError::config_field(
                format!("No API token configured; set {TOKEN_ENV_VAR} or api.token"),
                "api.token",
            ));
        }

        Ok(token)
    }
}

/// One named search pattern queried as a single composite API call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryGroup {
    /// Display name for breakdowns and metrics ("Time patterns")
    pub name: String,

    /// Query pattern text ("DateTime.Now OR DateTime.UtcNow")
    pub pattern: String,
}

impl QueryGroup {
    /// Create a query group.
    pub fn new(name: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pattern: pattern.into(),
        }
    }
}

/// Repository ranking crawler settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Repository-search query used to fetch the candidate set
    pub repository_query: String,

    /// Number of candidate repositories to fetch (API page size)
    pub candidate_count: u32,

    /// Query groups scored per repository
    pub query_groups: Vec<QueryGroup>,

    /// Full-pass retries per repository when rate limited
    pub max_retries: u32,

    /// Number of top repositories selected after ranking
    pub top_k: usize,

    /// Adaptive backoff parameters
    #[serde(default)]
    pub backoff: BackoffConfig,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            repository_query: "language:C# -is:archived stars:>10000 size:>10000".to_string(),
            candidate_count: 100,
            query_groups: vec![
                QueryGroup::new("Time patterns", "DateTime.Now OR DateTime.UtcNow"),
                QueryGroup::new("Existence checks", "File.Exists OR Directory.Exists"),
                QueryGroup::new("GUID generation", "Guid.NewGuid"),
            ],
            max_retries: 3,
            top_k: 10,
            backoff: BackoffConfig::default(),
        }
    }
}

impl SearchConfig {
    /// Validate crawler settings.
    pub fn validate(&self) -> Result<()> {
        if self.query_groups.is_empty() {
            return Err(CallsiftError::config_field(
                "at least one query group is required",
                "search.query_groups",
            ));
        }
        if self.max_retries == 0 {
            return Err(CallsiftError::config_field(
                "max_retries must be at least 1",
                "search.max_retries",
            ));
        }
        if self.candidate_count == 0 || self.candidate_count > 100 {
            return Err(CallsiftError::config_field(
                "candidate_count must be between 1 and 100",
                "search.candidate_count",
            ));
        }
        self.backoff.validate()
    }
}

/// Adaptive backoff ramp parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackoffConfig {
    /// Starting inter-request delay in seconds
    pub initial_delay_secs: f64,

    /// Delay added per escalation, in seconds
    pub increment_step_secs: f64,

    /// Maximum number of escalations per run
    pub max_increments: u32,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_delay_secs: INITIAL_DELAY_SECS,
            increment_step_secs: INCREMENT_STEP_SECS,
            max_increments: MAX_INCREMENTS,
        }
    }
}

impl BackoffConfig {
    /// Validate backoff parameters.
    pub fn validate(&self) -> Result<()> {
        if self.initial_delay_secs < 0.0 {
            return Err(CallsiftError::config_field(
                "initial_delay_secs must be non-negative",
                "search.backoff.initial_delay_secs",
            ));
        }
        if self.increment_step_secs < 0.0 {
            return Err(CallsiftError::config_field(
                "increment_step_secs must be non-negative",
                "search.backoff.increment_step_secs",
            ));
        }
        Ok(())
    }

    /// Build a backoff controller from these parameters.
    pub fn build(&self) -> AdaptiveBackoff {
        AdaptiveBackoff::new(
            self.initial_delay_secs,
            self.increment_step_secs,
            self.max_increments,
        )
    }
}

/// Occurrence locator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocatorConfig {
    /// Maximum lines scanned upward for an enclosing method signature
    pub method_window: usize,

    /// Maximum lines scanned upward for an enclosing class declaration
    pub class_window: usize,

    /// Source file extension to scan
    pub file_extension: String,

    /// Directory names skipped during the walk
    pub skip_dirs: Vec<String>,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            method_window: 80,
            class_window: 200,
            file_extension: "cs".to_string(),
            skip_dirs: vec![
                "bin".to_string(),
                "obj".to_string(),
                ".git".to_string(),
                ".github".to_string(),
                "packages".to_string(),
                "GeneratedTests".to_string(),
            ],
        }
    }
}

impl LocatorConfig {
    /// Validate locator settings.
    pub fn validate(&self) -> Result<()> {
        if self.method_window == 0 {
            return Err(CallsiftError::config_field(
                "method_window must be at least 1",
                "locator.method_window",
            ));
        }
        if self.class_window == 0 {
            return Err(CallsiftError::config_field(
                "class_window must be at least 1",
                "locator.class_window",
            ));
        }
        Ok(())
    }
}

/// External build/test runner settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Directory repositories are cloned into
    pub clones_dir: PathBuf,

    /// Build script path, relative to the cloned repository
    pub build_script: PathBuf,

    /// Test script path, relative to the cloned repository
    pub test_script: PathBuf,

    /// Per-command timeout in seconds
    pub command_timeout_secs: u64,

    /// Directory build/test transcripts are written to
    pub logs_dir: PathBuf,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            clones_dir: PathBuf::from("cloned_repos"),
            build_script: PathBuf::from("build/build-all.ps1"),
            test_script: PathBuf::from("build/test-all.ps1"),
            command_timeout_secs: 1200,
            logs_dir: PathBuf::from("test_logs"),
        }
    }
}

impl RunnerConfig {
    /// Validate runner settings.
    pub fn validate(&self) -> Result<()> {
        if self.command_timeout_secs == 0 {
            return Err(CallsiftError::config_field(
                "command_timeout_secs must be at least 1",
                "runner.command_timeout_secs",
            ));
        }
        Ok(())
    }
}

/// Stub generation and metrics output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory generated test stubs are written into, relative to the clone
    pub generated_tests_dir: PathBuf,

    /// Coverage report location, relative to the clone
    pub coverage_report: PathBuf,

    /// Metrics CSV destination
    pub metrics_path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            generated_tests_dir: PathBuf::from("GeneratedTests"),
            coverage_report: PathBuf::from("framework/CoverageReport/index.html"),
            metrics_path: PathBuf::from("test_metrics.csv"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = CallsiftConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn default_query_groups_cover_canonical_idioms() {
        let config = SearchConfig::default();
        let names: Vec<_> = config.query_groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Time patterns", "Existence checks", "GUID generation"]
        );
    }

    #[test]
    fn empty_query_groups_rejected() {
        let mut config = SearchConfig::default();
        config.query_groups.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_retries_rejected() {
        let mut config = SearchConfig::default();
        config.max_retries = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_windows_rejected() {
        let mut config = LocatorConfig::default();
        config.method_window = 0;
        assert!(config.validate().is_err());

        let mut config = LocatorConfig::default();
        config.class_window = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn placeholder_token_rejected() {
        let config = ApiConfig {
            token: Some("your_github_token_here".to_string()),
            ..ApiConfig::default()
        };
        assert!(config.resolved_token().is_err());
    }

    #[test]
    fn explicit_token_resolves() {
        let config = ApiConfig {
            token: Some("ghp_example".to_string()),
            ..ApiConfig::default()
        };
        assert_eq!(config.resolved_token().unwrap(), "ghp_example");
    }

    #[test]
    fn yaml_round_trip() {
        let config = CallsiftConfig::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: CallsiftConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.search.query_groups, config.search.query_groups);
        assert_eq!(parsed.locator.method_window, 80);
        assert_eq!(parsed.locator.class_window, 200);
    }

    #[test]
    fn backoff_config_builds_controller() {
        let backoff = BackoffConfig::default().build();
        assert_eq!(
            backoff.current_delay(),
            std::time::Duration::from_secs_f64(5.0)
        );
    }
}
