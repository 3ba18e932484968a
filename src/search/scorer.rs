//! Per-repository scoring over the configured query groups.
//!
//! One *pass* queries every group for a repository. A rate limit aborts the
//! pass immediately and burns one retry after escalating the shared backoff;
//! client and transient errors zero their group and the pass continues. A
//! repository whose retries are exhausted scores zero with `success = true`:
//! in the aggregate ranking, "could not verify" is indistinguishable from
//! "no usage", an accepted approximation inherited from the crawler's design.

use indexmap::IndexMap;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::core::backoff::SharedBackoff;
use crate::core::config::QueryGroup;
use crate::search::client::{QueryOutcome, SearchBackend};

/// Aggregate scoring result for one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoScore {
    /// Repository full name (`owner/name`)
    pub repo: String,

    /// Per-group match counts from the winning pass, in group order
    pub group_counts: IndexMap<String, u64>,

    /// Sum of the per-group counts
    pub total: u64,

    /// Whether scoring completed (also true for exhausted retries)
    pub success: bool,
}

impl RepoScore {
    fn from_counts(repo: &str, group_counts: IndexMap<String, u64>) -> Self {
        let total = group_counts.values().sum();
        Self {
            repo: repo.to_string(),
            group_counts,
            total,
            success: true,
        }
    }

    fn zeroed(repo: &str) -> Self {
        Self {
            repo: repo.to_string(),
            group_counts: IndexMap::new(),
            total: 0,
            success: true,
        }
    }
}

/// One attempt to query every group for a repository.
enum Pass {
    Completed(IndexMap<String, u64>),
    RateLimited,
}

/// Scoring state machine: `Attempting -> (Succeeded | RateLimited ->
/// Attempting | RetriesExhausted)`.
enum ScoreState {
    Attempting { remaining: u32 },
    Succeeded(IndexMap<String, u64>),
    RetriesExhausted,
}

/// Scores repositories against the query groups through a shared backoff.
pub struct RepositoryScorer<'a, B: SearchBackend + ?Sized> {
    backend: &'a B,
    backoff: SharedBackoff,
    max_retries: u32,
}

impl<'a, B: SearchBackend + ?Sized> RepositoryScorer<'a, B> {
    /// Create a scorer over a backend and a shared backoff ramp.
    pub fn new(backend: &'a B, backoff: SharedBackoff, max_retries: u32) -> Self {
        Self {
            backend,
            backoff,
            max_retries,
        }
    }

    /// Score one repository across all query groups.
    ///
    /// Always returns a completed score; rate limiting is absorbed into
    /// retries and, past the retry budget, into a zero total. The final
    /// pacing sleep runs on every path so repositories never hammer the API
    /// back to back.
    pub async fn score(&self, repo: &str, groups: &[QueryGroup]) -> RepoScore {
        let mut state = ScoreState::Attempting {
            remaining: self.max_retries,
        };

        let score = loop {
            match state {
                ScoreState::Attempting { remaining } => {
                    match self.attempt_pass(repo, groups).await {
                        Pass::Completed(counts) => state = ScoreState::Succeeded(counts),
                        Pass::RateLimited => {
                            // Escalate once per rate-limited pass, even the
                            // final one, so the ramp reflects every signal.
                            let delay = self.backoff.register_rate_limited();
                            let remaining = remaining - 1;
                            if remaining == 0 {
                                state = ScoreState::RetriesExhausted;
                            } else {
                                warn!(
                                    repo,
                                    delay_secs = delay.as_secs_f64(),
                                    remaining,
                                    "rate limited; backing off before retry pass"
                                );
                                sleep(delay).await;
                                state = ScoreState::Attempting { remaining };
                            }
                        }
                    }
                }
                ScoreState::Succeeded(counts) => {
                    let score = RepoScore::from_counts(repo, counts);
                    info!(repo, total = score.total, "scored repository");
                    break score;
                }
                ScoreState::RetriesExhausted => {
                    warn!(repo, "retries exhausted while rate limited; scoring as zero usage");
                    break RepoScore::zeroed(repo);
                }
            }
        };

        // Pace between repositories regardless of how this one ended
        sleep(self.backoff.current_delay()).await;
        score
    }

    async fn attempt_pass(&self, repo: &str, groups: &[QueryGroup]) -> Pass {
        let mut counts = IndexMap::with_capacity(groups.len());

        for group in groups {
            let query = format!("{} repo:{}", group.pattern, repo);
            match self.backend.execute(&query).await {
                QueryOutcome::Ok { count } => {
                    debug!(repo, group = %group.name, count, "group scored");
                    counts.insert(group.name.clone(), count);
                    // Inter-query pacing after every successful query
                    sleep(self.backoff.current_delay()).await;
                }
                QueryOutcome::ClientError { status } => {
                    debug!(repo, group = %group.name, status, "query rejected; zeroing group");
                    counts.insert(group.name.clone(), 0);
                }
                QueryOutcome::TransientError { status } => {
                    warn!(repo, group = %group.name, status, "transient error; zeroing group");
                    counts.insert(group.name.clone(), 0);
                }
                QueryOutcome::RateLimited => return Pass::RateLimited,
            }
        }

        Pass::Completed(counts)
    }
}
