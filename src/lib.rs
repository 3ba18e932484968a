//! # Callsift: Static-Call Idiom Mining Engine
//!
//! Callsift mines a code-hosting search API to rank repositories by how
//! heavily they use specific static-call idioms (time lookups, filesystem
//! existence checks, GUID generation), then attributes each occurrence in the
//! winning repository to its enclosing method and class so that downstream
//! tooling can generate mock-based test stubs for exactly those methods.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        CLI Layer                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Core Engine   │   Search        │   Locator  │  I/O        │
//! │                │                 │            │             │
//! │ • Backoff      │ • Client        │ • Patterns │ • Runner    │
//! │ • Pipeline     │ • Scorer        │ • Scanning │ • Coverage  │
//! │ • Config       │ • Ranker        │            │ • Metrics   │
//! │ • Errors       │                 │            │ • Stubgen   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Scoring is deliberately serial: every repository shares one adaptive
//! backoff ramp, so the crawler never forgets that the remote API is under
//! pressure. File scanning is stateless and may be parallelized freely.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use callsift::{CallsiftConfig, MiningPipeline};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = CallsiftConfig::default();
//!     let pipeline = MiningPipeline::new(config)?;
//!     let outcome = pipeline.run().await?;
//!     println!("top repository: {:?}", outcome.top_repository);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(unsafe_code)]

// Core engine modules
pub mod core {
    //! Core engine state and orchestration.

    pub mod backoff;
    pub mod config;
    pub mod errors;
    pub mod pipeline;
}

// Remote search API crawling and ranking
pub mod search {
    //! Rate-limited multi-query repository ranking crawler.

    pub mod client;
    pub mod ranker;
    pub mod scorer;
}

// Heuristic source-location resolution
pub mod locator;

// I/O, external collaborators, and persisted metrics
pub mod io {
    //! External process invocation, report extraction, and metrics output.

    pub mod coverage;
    pub mod metrics;
    pub mod runner;
    pub mod stubgen;
}

// Re-export primary types for convenience
pub use core::backoff::{AdaptiveBackoff, SharedBackoff};
pub use core::config::CallsiftConfig;
pub use core::errors::{CallsiftError, Result, ResultExt};
pub use core::pipeline::{MiningPipeline, PipelineOutcome};
pub use locator::{MethodAttribution, OccurrenceLocator, PatternMatch};
pub use search::client::{QueryOutcome, SearchBackend, SearchClient};
pub use search::ranker::RepositoryRanker;
pub use search::scorer::{RepoScore, RepositoryScorer};

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
