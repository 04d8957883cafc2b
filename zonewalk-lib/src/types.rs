//! Core data types for zone walking.
//!
//! This module defines the data structures shared by the walker, the
//! dispatcher and the CLI: tasks, configuration and run summaries.

use serde::Serialize;
use std::net::SocketAddr;
use std::time::Duration;

/// Address of a DNS server usable as a query destination.
pub type Endpoint = SocketAddr;

/// Default number of concurrent chains.
pub const DEFAULT_CONCURRENCY: usize = 20;

/// Upper bound for the number of concurrent chains.
pub const MAX_CONCURRENCY: usize = 1000;

/// Default number of retries per name.
pub const DEFAULT_RETRIES: u32 = 3;

/// Default per-query timeout.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(2);

/// Public resolver reliability list used with `--online`.
pub const DEFAULT_FEED_URL: &str = "https://public-dns.info/nameservers.csv";

/// A seed waiting to be walked.
///
/// `resolver` is pinned for the very first query of the chain; every later
/// query draws from the pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    /// Seed domain name (canonicalized by the walker)
    pub domain: String,
    /// Resolver for the first attempt
    pub resolver: Endpoint,
}

impl Task {
    pub fn new<D: Into<String>>(domain: D, resolver: Endpoint) -> Self {
        Self {
            domain: domain.into(),
            resolver,
        }
    }
}

/// Configuration options for a walk.
///
/// Config files and the environment are layered onto this through
/// `FileConfig::apply_to` and `EnvConfig::apply_to`.
#[derive(Debug, Clone, PartialEq)]
pub struct WalkConfig {
    /// Number of worker tasks, which is also the queue capacity
    /// Default: 20, Range: 1-1000
    pub concurrency: usize,

    /// Retries per name after the first failed attempt
    /// Default: 3
    pub max_retries: u32,

    /// Timeout for a single NSEC query
    /// Default: 2 seconds
    pub query_timeout: Duration,

    /// Fetch the online resolver feed instead of the static list
    /// Default: false
    pub use_online_resolvers: bool,

    /// Where to fetch the resolver feed from
    pub feed_url: String,

    /// Resolvers configured by the user, replacing the built-in list
    pub static_resolvers: Option<Vec<Endpoint>>,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            max_retries: DEFAULT_RETRIES,
            query_timeout: DEFAULT_QUERY_TIMEOUT,
            use_online_resolvers: false,
            feed_url: DEFAULT_FEED_URL.to_string(),
            static_resolvers: None,
        }
    }
}

impl WalkConfig {
    /// Set the number of workers, capped to 1-1000.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.clamp(1, MAX_CONCURRENCY);
        self
    }

    /// Set the retry budget per name.
    pub fn with_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the per-query timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }

    /// Use the online resolver feed.
    pub fn with_online_resolvers(mut self, enabled: bool) -> Self {
        self.use_online_resolvers = enabled;
        self
    }

    /// Override the resolver feed URL.
    pub fn with_feed_url<U: Into<String>>(mut self, url: U) -> Self {
        self.feed_url = url.into();
        self
    }

    /// Replace the built-in static resolver list.
    pub fn with_static_resolvers(mut self, resolvers: Vec<Endpoint>) -> Self {
        self.static_resolvers = Some(resolvers);
        self
    }
}

/// Result of walking one seed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainSummary {
    /// Canonical seed name
    pub seed: String,
    /// The seed was already claimed by another chain, nothing was queried
    pub converged: bool,
    /// Names emitted by this chain
    pub discovered: usize,
    /// Names dropped after the retry budget ran out
    pub abandoned: usize,
}

/// Point-in-time copy of the walk counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WalkStatsSnapshot {
    /// NSEC queries sent, retries included
    pub queries: u64,
    /// Queries that ended in an error
    pub failures: u64,
    /// Names emitted
    pub discovered: u64,
    /// Names skipped because they were already visited
    pub loops_detected: u64,
    /// Names dropped after exhausting the retry budget
    pub abandoned: u64,
}

/// Outcome of a dispatcher run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchSummary {
    /// Number of workers that ran
    pub workers: usize,
    /// Tasks taken off the queue
    pub chains: usize,
}

/// Outcome of reading seeds from an input stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestSummary {
    /// Lines read from the input
    pub lines: usize,
    /// Seeds handed to the dispatcher
    pub submitted: usize,
    /// Seeds seen before
    pub duplicates: usize,
    /// Lines that were not usable domain names
    pub invalid: usize,
}
