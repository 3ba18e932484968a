//! Adaptive inter-request delay shared across a whole ranking pass.
//!
//! The remote search API throttles aggressively, and a crawler that resets its
//! pacing after every repository keeps re-triggering the same limits. The ramp
//! here is process-wide and monotone: every rate-limit signal escalates the
//! delay by a fixed step until the escalation budget is spent, and no
//! operation ever lowers it again within a run.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

/// Initial inter-request delay in seconds.
pub const INITIAL_DELAY_SECS: f64 = 5.0;

/// Delay added per escalation, in seconds.
pub const INCREMENT_STEP_SECS: f64 = 1.0;

/// Maximum number of escalations per run.
pub const MAX_INCREMENTS: u32 = 6;

/// Monotone adaptive delay controller.
///
/// State is intentionally minimal: the current delay and how much of the
/// escalation budget has been spent. All mutation goes through
/// [`AdaptiveBackoff::register_rate_limited`], which is the single place the
/// ramp can move.
#[derive(Debug, Clone)]
pub struct AdaptiveBackoff {
    current_delay_secs: f64,
    increments_used: u32,
    increment_step_secs: f64,
    max_increments: u32,
}

impl Default for AdaptiveBackoff {
    fn default() -> Self {
        Self::new(INITIAL_DELAY_SECS, INCREMENT_STEP_SECS, MAX_INCREMENTS)
    }
}

impl AdaptiveBackoff {
    /// Create a backoff controller with explicit parameters.
    pub fn new(initial_delay_secs: f64, increment_step_secs: f64, max_increments: u32) -> Self {
        Self {
            current_delay_secs: initial_delay_secs,
            increments_used: 0,
            increment_step_secs,
            max_increments,
        }
    }

    /// The delay to sleep between paced requests.
    pub fn current_delay(&self) -> Duration {
        Duration::from_secs_f64(self.current_delay_secs)
    }

    /// Number of escalations consumed so far.
    pub fn increments_used(&self) -> u32 {
        self.increments_used
    }

    /// Whether the escalation budget is spent.
    pub fn at_max(&self) -> bool {
        self.increments_used >= self.max_increments
    }

    /// Record a rate-limit signal and return the delay to sleep before
    /// retrying.
    ///
    /// Escalates by one step while budget remains; once the budget is spent
    /// the delay is returned unchanged. The returned value is always the
    /// post-escalation delay, so callers sleep the new (never the stale)
    /// amount.
    pub fn register_rate_limited(&mut self) -> Duration {
        if self.increments_used < self.max_increments {
            self.current_delay_secs += self.increment_step_secs;
            self.increments_used += 1;
        }
        self.current_delay()
    }
}

/// Shared handle to one [`AdaptiveBackoff`] ramp.
///
/// Every scorer in a ranking pass observes and updates the same delay value.
/// The mutex makes "read delay, possibly escalate, return new delay" one
/// critical section, so an escalation is counted exactly once per rate-limit
/// event even if scoring is ever parallelized.
#[derive(Debug, Clone, Default)]
pub struct SharedBackoff {
    inner: Arc<Mutex<AdaptiveBackoff>>,
}

impl SharedBackoff {
    /// Wrap a backoff controller in a shared handle.
    pub fn new(backoff: AdaptiveBackoff) -> Self {
        Self {
            inner: Arc::new(Mutex::new(backoff)),
        }
    }

    /// Current pacing delay.
    pub fn current_delay(&self) -> Duration {
        self.inner.lock().current_delay()
    }

    /// Register a rate-limit event; returns the delay to sleep before retry.
    pub fn register_rate_limited(&self) -> Duration {
        self.inner.lock().register_rate_limited()
    }

    /// Escalations consumed so far.
    pub fn increments_used(&self) -> u32 {
        self.inner.lock().increments_used()
    }
}
