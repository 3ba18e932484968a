//! Candidate ranking over per-repository aggregate scores.

use tracing::info;

use crate::core::backoff::SharedBackoff;
use crate::core::config::QueryGroup;
use crate::search::client::SearchBackend;
use crate::search::scorer::{RepoScore, RepositoryScorer};

/// Orchestrates scoring over the candidate set and selects the top-K.
///
/// Repositories are scored one at a time against a single shared backoff
/// ramp; the ramp's correctness depends on all callers observing the same
/// delay serially, so this stage is deliberately not parallel.
pub struct RepositoryRanker<'a, B: SearchBackend + ?Sized> {
    backend: &'a B,
    backoff: SharedBackoff,
    max_retries: u32,
}

impl<'a, B: SearchBackend + ?Sized> RepositoryRanker<'a, B> {
    /// Create a ranker over a backend and a shared backoff ramp.
    pub fn new(backend: &'a B, backoff: SharedBackoff, max_retries: u32) -> Self {
        Self {
            backend,
            backoff,
            max_retries,
        }
    }

    /// Score every candidate and return `(repo, total)` pairs in descending
    /// total order. Ties keep the candidates' input order (popularity order
    /// from the repository search), which a stable sort preserves.
    pub async fn rank(&self, repos: &[String], groups: &[QueryGroup]) -> Vec<(String, u64)> {
        let scorer = RepositoryScorer::new(self.backend, self.backoff.clone(), self.max_retries);

        let mut scored: Vec<(String, u64)> = Vec::with_capacity(repos.len());
        for (index, repo) in repos.iter().enumerate() {
            info!(
                repo,
                position = index + 1,
                candidates = repos.len(),
                delay_secs = self.backoff.current_delay().as_secs_f64(),
                "scoring repository"
            );
            let RepoScore { total, .. } = scorer.score(repo, groups).await;
            scored.push((repo.clone(), total));
        }

        scored.sort_by(|a, b| b.1.cmp(&a.1));
        scored
    }
}

/// Select the top `k` repositories with a positive total.
///
/// Zero-total repositories are filtered before taking `k`; when fewer than
/// `k` qualify the result is simply shorter. Any fallback candidate source is
/// an external collaborator decision, not part of the ranking.
pub fn select_top(ranked: &[(String, u64)], k: usize) -> Vec<String> {
    ranked
        .iter()
        .filter(|(_, total)| *total > 0)
        .take(k)
        .map(|(repo, _)| repo.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use async_trait::async_trait;
    use parking_lot::Mutex;

    use super::*;
    use crate::search::client::QueryOutcome;

    struct ScriptedBackend {
        outcomes: Mutex<VecDeque<QueryOutcome>>,
    }

    impl ScriptedBackend {
        fn new(outcomes: Vec<QueryOutcome>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes.into()),
            }
        }
    }

    #[async_trait]
    impl SearchBackend for ScriptedBackend {
        async fn execute(&self, _query: &str) -> QueryOutcome {
            self.outcomes
                .lock()
                .pop_front()
                .unwrap_or(QueryOutcome::TransientError { status: 0 })
        }
    }

    fn ranked(pairs: &[(&str, u64)]) -> Vec<(String, u64)> {
        pairs.iter().map(|(r, t)| (r.to_string(), *t)).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn rank_orders_by_total_descending() {
        // One group per repo keeps the script compact
        let backend = ScriptedBackend::new(vec![
            QueryOutcome::Ok { count: 2 },
            QueryOutcome::Ok { count: 9 },
            QueryOutcome::Ok { count: 4 },
        ]);
        let ranker = RepositoryRanker::new(&backend, SharedBackoff::default(), 3);
        let repos = vec![
            "owner/low".to_string(),
            "owner/high".to_string(),
            "owner/mid".to_string(),
        ];
        let groups = vec![crate::core::config::QueryGroup::new("A", "DateTime.Now")];

        let result = ranker.rank(&repos, &groups).await;

        assert_eq!(
            result,
            ranked(&[("owner/high", 9), ("owner/mid", 4), ("owner/low", 2)])
        );
    }

    #[tokio::test(start_paused = true)]
    async fn rank_is_stable_for_equal_totals() {
        let backend = ScriptedBackend::new(vec![
            QueryOutcome::Ok { count: 3 },
            QueryOutcome::Ok { count: 3 },
            QueryOutcome::Ok { count: 7 },
        ]);
        let ranker = RepositoryRanker::new(&backend, SharedBackoff::default(), 3);
        let repos = vec![
            "owner/first".to_string(),
            "owner/second".to_string(),
            "owner/third".to_string(),
        ];
        let groups = vec![crate::core::config::QueryGroup::new("A", "DateTime.Now")];

        let result = ranker.rank(&repos, &groups).await;

        // first and second tie; input order preserved between them
        assert_eq!(
            result,
            ranked(&[("owner/third", 7), ("owner/first", 3), ("owner/second", 3)])
        );
    }

    #[test]
    fn select_top_filters_zero_totals() {
        let input = ranked(&[("a/a", 5), ("b/b", 0), ("c/c", 3), ("d/d", 0)]);
        assert_eq!(select_top(&input, 10), vec!["a/a", "c/c"]);
    }

    #[test]
    fn select_top_truncates_to_k() {
        let input = ranked(&[("a/a", 5), ("b/b", 4), ("c/c", 3)]);
        assert_eq!(select_top(&input, 2), vec!["a/a", "b/b"]);
    }

    #[test]
    fn select_top_never_returns_zero_total() {
        let input = ranked(&[("a/a", 0), ("b/b", 0)]);
        assert!(select_top(&input, 5).is_empty());
    }
}
